use crate::{
    data_structures::asset::{TextureAsset, WrapMode},
    resources::{AssetSource, LoadError},
};

/// Load every normal map in `paths` concurrently.
///
/// All loads are polled together on the calling task. The result is in the
/// order of `paths`, whatever order the loads finish in. The batch is
/// all-or-nothing: the first failure drops the outstanding loads and is
/// returned, naming the path that failed.
pub async fn load_batch<A: AssetSource>(
    source: &A,
    paths: &[String],
) -> Result<Vec<TextureAsset>, LoadError> {
    let loads = paths.iter().map(|path| load_texture_asset(source, path));
    let assets = futures::future::try_join_all(loads).await?;
    log::info!("Loaded {} normal maps", assets.len());
    Ok(assets)
}

/// Load a single normal map and configure it for tiling.
pub async fn load_texture_asset<A: AssetSource>(
    source: &A,
    path: &str,
) -> Result<TextureAsset, LoadError> {
    let bytes = source
        .fetch(path, None)
        .await
        .map_err(|source| LoadError::Fetch {
            path: path.to_string(),
            source,
        })?;
    let image = image::load_from_memory(&bytes)
        .map_err(|source| LoadError::Decode {
            path: path.to_string(),
            source,
        })?
        .into_rgba8();

    let mut asset = TextureAsset::new(path, image);
    asset.set_wrap(WrapMode::Repeat, WrapMode::Repeat);
    asset.set_repeat(1.0, 1.0);
    log::info!(
        "Normal map {} loaded as '{}' ({}x{})",
        path,
        asset.name(),
        asset.dimensions().0,
        asset.dimensions().1
    );
    Ok(asset)
}
