use glass_grid::SceneConfig;

fn main() -> anyhow::Result<()> {
    glass_grid::run(SceneConfig::default())
}
