use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Mirrors `assets/` (HDR panorama + normal maps) into OUT_DIR so a binary
// started outside the crate root still finds them. See `FileSource::new`.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");

    if assets_src.exists() {
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[assets_src], &out_dir, &copy_options)?;
    }
    println!(
        "cargo:rustc-env=GLASS_GRID_BUNDLED_ASSETS={}",
        out_dir.join("assets").display()
    );

    Ok(())
}
