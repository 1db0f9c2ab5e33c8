//! Prefiltered environment maps.
//!
//! An [`EnvironmentMap`] is derived once from an equirectangular HDR panorama.
//! It stores a chain of progressively smaller and blurrier images. Level `k`
//! has exactly the dimensions of mip level `k` of the base image, so the whole
//! chain uploads into a single mipmapped texture and shaders select the
//! blur by sampling at `roughness * (levels - 1)`.

use anyhow::bail;
use image::{Rgb32FImage, imageops};

use crate::data_structures::texture::fit_within;

/// Resolution and depth of the prefiltered mip chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrefilterSettings {
    /// Bound on both sides of the sharpest level; larger sources are
    /// downsampled to fit, keeping their aspect ratio.
    pub base_width: u32,
    /// Upper bound on the number of levels.
    pub levels: u32,
    /// Gaussian sigma, in texels, applied to the roughest level.
    pub max_blur: f32,
}

impl PrefilterSettings {
    /// Lower the base bound to what a device can hold in one texture.
    pub fn within(self, max_texture_dimension: u32) -> Self {
        Self {
            base_width: self.base_width.min(max_texture_dimension),
            ..self
        }
    }
}

impl Default for PrefilterSettings {
    fn default() -> Self {
        Self {
            base_width: 512,
            levels: 6,
            max_blur: 2.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnvironmentLevel {
    pub roughness: f32,
    pub image: Rgb32FImage,
}

#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    source: String,
    levels: Vec<EnvironmentLevel>,
}

impl EnvironmentMap {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn levels(&self) -> &[EnvironmentLevel] {
        &self.levels
    }

    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Dimensions of the sharpest level.
    pub fn base_size(&self) -> (u32, u32) {
        self.levels
            .first()
            .map(|level| level.image.dimensions())
            .unwrap_or((0, 0))
    }
}

/// Turns decoded panoramas into [`EnvironmentMap`]s.
///
/// The generator is meant to be scoped to a single load: create it, derive the
/// map, drop it.
pub struct PrefilterGenerator {
    settings: PrefilterSettings,
}

impl PrefilterGenerator {
    pub fn new(settings: PrefilterSettings) -> Self {
        Self { settings }
    }

    /// Derives the mip chain from `panorama`, consuming it. The decoded source is
    /// released as soon as the sharpest level exists.
    pub fn prefilter_equirectangular(
        &self,
        source: &str,
        panorama: Rgb32FImage,
    ) -> anyhow::Result<EnvironmentMap> {
        let (width, height) = panorama.dimensions();
        if width == 0 || height == 0 {
            bail!("{source} has no pixels");
        }

        let (base_width, base_height) = fit_within(width, height, self.settings.base_width);
        let base = if (base_width, base_height) == (width, height) {
            panorama
        } else {
            let resized = imageops::resize(
                &panorama,
                base_width,
                base_height,
                imageops::FilterType::Triangle,
            );
            drop(panorama);
            resized
        };

        let count = self.level_count(base_width, base_height);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(EnvironmentLevel {
            roughness: 0.0,
            image: base,
        });
        for k in 1..count {
            let roughness = k as f32 / (count - 1) as f32;
            let previous = &levels[k as usize - 1].image;
            let downsampled = imageops::resize(
                previous,
                (base_width >> k).max(1),
                (base_height >> k).max(1),
                imageops::FilterType::Triangle,
            );
            let sigma = roughness * self.settings.max_blur;
            let image = if sigma > 0.0 {
                imageops::blur(&downsampled, sigma)
            } else {
                downsampled
            };
            levels.push(EnvironmentLevel { roughness, image });
        }

        log::debug!(
            "Prefiltered {source} into {count} levels starting at {base_width}x{base_height}"
        );
        Ok(EnvironmentMap {
            source: source.to_string(),
            levels,
        })
    }

    fn level_count(&self, width: u32, height: u32) -> u32 {
        let full_chain = 32 - width.max(height).leading_zeros();
        self.settings.levels.clamp(1, full_chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panorama(width: u32, height: u32, value: f32) -> Rgb32FImage {
        Rgb32FImage::from_pixel(width, height, image::Rgb([value, value * 0.5, value * 0.25]))
    }

    #[test]
    fn levels_follow_mip_dimensions() {
        let generator = PrefilterGenerator::new(PrefilterSettings {
            base_width: 64,
            levels: 5,
            max_blur: 1.0,
        });
        let env = generator
            .prefilter_equirectangular("night.hdr", panorama(256, 128, 1.0))
            .unwrap();

        assert_eq!(env.mip_count(), 5);
        assert_eq!(env.base_size(), (64, 32));
        for (k, level) in env.levels().iter().enumerate() {
            assert_eq!(
                level.image.dimensions(),
                ((64 >> k).max(1), (32 >> k).max(1))
            );
        }
        assert_eq!(env.levels()[0].roughness, 0.0);
        assert_eq!(env.levels()[4].roughness, 1.0);
    }

    #[test]
    fn small_panorama_caps_the_level_count() {
        let generator = PrefilterGenerator::new(PrefilterSettings::default());
        let env = generator
            .prefilter_equirectangular("tiny.hdr", panorama(4, 2, 1.0))
            .unwrap();
        // 4x2 -> 2x1 -> 1x1
        assert_eq!(env.mip_count(), 3);
        assert_eq!(env.base_size(), (4, 2));
        assert_eq!(env.levels()[2].image.dimensions(), (1, 1));
    }

    #[test]
    fn uniform_radiance_survives_filtering() {
        let generator = PrefilterGenerator::new(PrefilterSettings {
            base_width: 32,
            levels: 4,
            max_blur: 2.0,
        });
        let env = generator
            .prefilter_equirectangular("flat.hdr", panorama(64, 32, 8.0))
            .unwrap();
        for level in env.levels().iter().filter(|l| l.image.width() >= 16) {
            let (w, h) = level.image.dimensions();
            let pixel = level.image.get_pixel(w / 2, h / 2);
            assert!((pixel[0] - 8.0).abs() < 1e-2, "{:?}", pixel);
            assert!((pixel[1] - 4.0).abs() < 1e-2, "{:?}", pixel);
        }
    }

    #[test]
    fn both_sides_of_the_base_are_bounded() {
        let generator = PrefilterGenerator::new(PrefilterSettings::default());
        let tall = generator
            .prefilter_equirectangular("tall.hdr", panorama(1, 1000, 1.0))
            .unwrap();
        assert_eq!(tall.base_size(), (1, 512));

        let wide = generator
            .prefilter_equirectangular("wide.hdr", panorama(10_000, 1, 1.0))
            .unwrap();
        assert_eq!(wide.base_size(), (512, 1));
    }

    #[test]
    fn settings_respect_the_device_limit() {
        let settings = PrefilterSettings {
            base_width: 4096,
            ..Default::default()
        };
        assert_eq!(settings.within(2048).base_width, 2048);
        assert_eq!(PrefilterSettings::default().within(2048).base_width, 512);
    }

    #[test]
    fn empty_panorama_is_rejected() {
        let generator = PrefilterGenerator::new(PrefilterSettings::default());
        assert!(
            generator
                .prefilter_equirectangular("empty.hdr", Rgb32FImage::new(0, 0))
                .is_err()
        );
    }
}
