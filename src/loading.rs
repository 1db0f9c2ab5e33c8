//! The loading pipeline: environment, then normal maps, then the grid.

use crate::{
    config::SceneConfig,
    data_structures::scene::Scene,
    resources::{AssetSource, batch::load_batch, environment::load_environment},
};

/// Populate `scene` from `config` and return the number of panels created.
///
/// The environment is loaded and published before any normal map is
/// requested, so every material sees it. If anything fails the error is
/// logged and returned; whatever was published so far stays in the scene and
/// no panels are created.
pub async fn build_scene<A: AssetSource>(
    source: &A,
    config: &SceneConfig,
    scene: &mut Scene,
) -> anyhow::Result<usize> {
    let report = |fraction: f32| {
        log::debug!("{}: {:.0}%", config.environment, fraction * 100.0);
    };
    let environment = load_environment(source, &config.environment, config.prefilter, Some(&report))
        .await
        .inspect_err(|e| log::error!("Environment load failed: {e:#}"))?;
    scene.set_environment(environment);

    let assets = load_batch(source, &config.textures)
        .await
        .inspect_err(|e| log::error!("Texture batch failed: {e:#}"))?;

    let created = scene
        .assemble(assets, &config.grid, config.panel, &config.glass)
        .inspect_err(|e| log::error!("Scene assembly failed: {e}"))?;
    log::info!("Scene ready with {created} glass panels");
    Ok(created)
}
