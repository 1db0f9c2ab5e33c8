use image::{ImageFormat, Rgb32FImage};

use crate::{
    data_structures::environment::{EnvironmentMap, PrefilterGenerator, PrefilterSettings},
    resources::{AssetSource, LoadError},
};

/// Fetch an equirectangular Radiance HDR panorama and prefilter it.
///
/// The decoded floating point buffer and the generator only live for the
/// duration of this call. There is no retry and no fallback environment: the
/// first error is returned as-is.
pub async fn load_environment<A: AssetSource>(
    source: &A,
    path: &str,
    settings: PrefilterSettings,
    progress: Option<&dyn Fn(f32)>,
) -> Result<EnvironmentMap, LoadError> {
    let bytes = source
        .fetch(path, progress)
        .await
        .map_err(|source| LoadError::Fetch {
            path: path.to_string(),
            source,
        })?;
    let panorama = decode_hdr(path, &bytes)?;
    drop(bytes);

    let (width, height) = panorama.dimensions();
    let generator = PrefilterGenerator::new(settings);
    let environment = generator
        .prefilter_equirectangular(path, panorama)
        .map_err(|source| LoadError::Prefilter {
            path: path.to_string(),
            source,
        })?;
    drop(generator);

    log::info!(
        "HDR environment {} loaded ({}x{}, {} prefiltered levels)",
        path,
        width,
        height,
        environment.mip_count()
    );
    Ok(environment)
}

fn decode_hdr(path: &str, bytes: &[u8]) -> Result<Rgb32FImage, LoadError> {
    image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
        .map(|img| img.into_rgb32f())
        .map_err(|source| LoadError::Decode {
            path: path.to_string(),
            source,
        })
}
