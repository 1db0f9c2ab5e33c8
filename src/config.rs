//! Code-level configuration.
//!
//! Every tunable of the demo scene is collected in [`SceneConfig`]. Defaults
//! reproduce that scene; the `with_*` setters cover the knobs a caller
//! typically changes.

use crate::{
    camera::CameraSettings,
    data_structures::{
        environment::PrefilterSettings, geometry::BoxDimensions, grid::GridLayout,
        material::GlassProfile, scene::Lights,
    },
};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// Equirectangular Radiance HDR panorama.
    pub environment: String,
    /// Normal maps, one glass panel each. Order decides grid placement.
    pub textures: Vec<String>,
    pub grid: GridLayout,
    pub panel: BoxDimensions,
    pub glass: GlassProfile,
    pub camera: CameraSettings,
    pub lights: Lights,
    pub prefilter: PrefilterSettings,
    /// Linear RGB clear colour.
    pub background: [f32; 3],
    pub title: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            environment: "/textures/night.hdr".to_string(),
            textures: vec!["/textures/glass.jpg".to_string()],
            grid: GridLayout::default(),
            panel: BoxDimensions::default(),
            glass: GlassProfile::default(),
            camera: CameraSettings::default(),
            lights: Lights::default(),
            prefilter: PrefilterSettings::default(),
            background: hex_to_linear(0x131313),
            title: "glass-grid".to_string(),
        }
    }
}

impl SceneConfig {
    pub fn with_environment(mut self, path: impl Into<String>) -> Self {
        self.environment = path.into();
        self
    }

    pub fn with_textures<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.textures = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_grid(mut self, grid: GridLayout) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_glass(mut self, glass: GlassProfile) -> Self {
        self.glass = glass;
        self
    }
}

/// `0xRRGGBB` in sRGB to linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colours_are_linearised() {
        assert_eq!(hex_to_linear(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(hex_to_linear(0x000000), [0.0, 0.0, 0.0]);
        let grey = hex_to_linear(0x404040);
        assert!((grey[0] - 0.0513).abs() < 1e-3);
        assert_eq!(grey[0], grey[2]);
    }

    #[test]
    fn builder_replaces_texture_list_in_order() {
        let config = SceneConfig::default().with_textures(["b.jpg", "a.jpg"]);
        assert_eq!(config.textures, vec!["b.jpg", "a.jpg"]);
        assert_eq!(config.grid.rows, 3);
    }
}
