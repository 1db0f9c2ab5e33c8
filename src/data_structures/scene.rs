//! The scene registry: environment slot, lights and the assembled panels.

use std::sync::Arc;

use crate::data_structures::{
    asset::TextureAsset,
    environment::EnvironmentMap,
    geometry::{BoxDimensions, BoxGeometry},
    grid::GridLayout,
    material::{GlassMaterial, GlassProfile},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub colour: [f32; 3],
    pub intensity: f32,
    /// Range after which the light contributes nothing; `0` means unlimited.
    pub distance: f32,
    pub angle: cgmath::Rad<f32>,
    pub penumbra: f32,
    pub decay: f32,
    pub position: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0],
            intensity: 2.0,
            distance: 100.0,
            angle: cgmath::Rad(std::f32::consts::PI / 6.0),
            penumbra: 0.1,
            decay: 1.0,
            position: cgmath::Point3::new(10.0, 10.0, 10.0),
            target: cgmath::Point3::new(0.0, 0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            colour: crate::config::hex_to_linear(0x404040),
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Lights {
    pub spot: SpotLight,
    pub ambient: AmbientLight,
}

/// A single glass panel. Never moved after placement.
#[derive(Clone, Debug)]
pub struct RenderableObject {
    geometry: Arc<BoxGeometry>,
    material: GlassMaterial,
    position: cgmath::Vector3<f32>,
}

impl RenderableObject {
    pub fn geometry(&self) -> &Arc<BoxGeometry> {
        &self.geometry
    }

    pub fn material(&self) -> &GlassMaterial {
        &self.material
    }

    pub fn position(&self) -> cgmath::Vector3<f32> {
        self.position
    }

    pub fn name(&self) -> &str {
        self.material.normal_map().name()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("the environment map has to be published before objects are assembled")]
    EnvironmentMissing,
}

#[derive(Debug, Default)]
pub struct Scene {
    environment: Option<Arc<EnvironmentMap>>,
    objects: Vec<RenderableObject>,
    lights: Lights,
    background: [f32; 3],
}

impl Scene {
    pub fn new(lights: Lights, background: [f32; 3]) -> Self {
        Self {
            environment: None,
            objects: Vec::new(),
            lights,
            background,
        }
    }

    /// Publishes the environment map. Materials built afterwards reference it.
    pub fn set_environment(&mut self, environment: EnvironmentMap) -> Arc<EnvironmentMap> {
        if let Some(previous) = &self.environment {
            log::warn!(
                "Replacing environment {} with {}; existing materials keep the old one",
                previous.source(),
                environment.source()
            );
        }
        let environment = Arc::new(environment);
        self.environment = Some(environment.clone());
        environment
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    /// Builds a material against whatever environment is currently published.
    pub fn material_for(&self, normal_map: Arc<TextureAsset>, profile: GlassProfile) -> GlassMaterial {
        GlassMaterial::new(normal_map, self.environment.clone(), profile)
    }

    /// Creates one panel per asset, in input order, placed on `layout`.
    ///
    /// All panels share one box geometry. Returns the number of panels added.
    pub fn assemble(
        &mut self,
        assets: Vec<TextureAsset>,
        layout: &GridLayout,
        dimensions: BoxDimensions,
        profile: &GlassProfile,
    ) -> Result<usize, SceneError> {
        if self.environment.is_none() {
            return Err(SceneError::EnvironmentMissing);
        }

        let geometry = Arc::new(BoxGeometry::new(dimensions));
        let count = assets.len();
        self.objects.reserve(count);
        for (index, asset) in assets.into_iter().enumerate() {
            let material = self.material_for(Arc::new(asset), *profile);
            let position = layout.position(index, count);
            log::debug!(
                "Placing {} at ({:.2}, {:.2}, {:.2})",
                material.normal_map().name(),
                position.x,
                position.y,
                position.z
            );
            self.objects.push(RenderableObject {
                geometry: geometry.clone(),
                material,
                position,
            });
        }
        log::info!(
            "Assembled {} glass panels on a {}x{} grid",
            count,
            layout.rows,
            layout.columns(count)
        );
        Ok(count)
    }

    pub fn objects(&self) -> &[RenderableObject] {
        &self.objects
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn background(&self) -> [f32; 3] {
        self.background
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb32FImage, RgbaImage};

    use super::*;
    use crate::data_structures::environment::{PrefilterGenerator, PrefilterSettings};

    fn environment() -> EnvironmentMap {
        PrefilterGenerator::new(PrefilterSettings::default())
            .prefilter_equirectangular("night.hdr", Rgb32FImage::new(8, 4))
            .unwrap()
    }

    fn assets(names: &[&str]) -> Vec<TextureAsset> {
        names
            .iter()
            .map(|name| TextureAsset::new(format!("/textures/{name}.png"), RgbaImage::new(1, 1)))
            .collect()
    }

    #[test]
    fn material_built_before_environment_has_none() {
        let mut scene = Scene::default();
        let texture = Arc::new(assets(&["early"]).remove(0));

        let early = scene.material_for(texture.clone(), GlassProfile::default());
        assert!(early.environment().is_none());

        scene.set_environment(environment());
        let late = scene.material_for(texture, GlassProfile::default());
        assert!(late.environment().is_some());
    }

    #[test]
    fn assembling_without_environment_creates_nothing() {
        let mut scene = Scene::default();
        let result = scene.assemble(
            assets(&["a", "b"]),
            &GridLayout::default(),
            BoxDimensions::default(),
            &GlassProfile::default(),
        );
        assert_eq!(result, Err(SceneError::EnvironmentMissing));
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn panels_share_geometry_and_environment() {
        let mut scene = Scene::default();
        let env = scene.set_environment(environment());
        let count = scene
            .assemble(
                assets(&["a", "b", "c", "d", "e"]),
                &GridLayout::default(),
                BoxDimensions::default(),
                &GlassProfile::default(),
            )
            .unwrap();

        assert_eq!(count, 5);
        let first = &scene.objects()[0];
        for object in scene.objects() {
            assert!(Arc::ptr_eq(object.geometry(), first.geometry()));
            assert!(Arc::ptr_eq(object.material().environment().unwrap(), &env));
        }
        let names: Vec<_> = scene.objects().iter().map(|o| o.name()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn empty_batch_yields_empty_grid() {
        let mut scene = Scene::default();
        scene.set_environment(environment());
        let count = scene
            .assemble(
                Vec::new(),
                &GridLayout::default(),
                BoxDimensions::default(),
                &GlassProfile::default(),
            )
            .unwrap();
        assert_eq!(count, 0);
        assert!(scene.objects().is_empty());
    }
}
