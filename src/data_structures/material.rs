//! Glass material description.

use std::sync::Arc;

use crate::data_structures::{asset::TextureAsset, environment::EnvironmentMap};

/// Physical look shared by every panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlassProfile {
    pub colour: [f32; 3],
    pub roughness: f32,
    pub env_intensity: f32,
    pub transmission: f32,
    pub thickness: f32,
    pub ior: f32,
}

impl Default for GlassProfile {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0],
            roughness: 0.2,
            env_intensity: 0.5,
            transmission: 1.0,
            thickness: 0.3,
            ior: 1.5,
        }
    }
}

/// Which faces get rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    #[default]
    Double,
}

impl Side {
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// One normal map plus the environment that was published when the material
/// was built. A material created before the environment exists keeps `None`.
#[derive(Clone, Debug)]
pub struct GlassMaterial {
    normal_map: Arc<TextureAsset>,
    environment: Option<Arc<EnvironmentMap>>,
    profile: GlassProfile,
    side: Side,
}

impl GlassMaterial {
    pub fn new(
        normal_map: Arc<TextureAsset>,
        environment: Option<Arc<EnvironmentMap>>,
        profile: GlassProfile,
    ) -> Self {
        Self {
            normal_map,
            environment,
            profile,
            side: Side::Double,
        }
    }

    pub fn normal_map(&self) -> &Arc<TextureAsset> {
        &self.normal_map
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    pub fn profile(&self) -> &GlassProfile {
        &self.profile
    }

    pub fn side(&self) -> Side {
        self.side
    }
}
