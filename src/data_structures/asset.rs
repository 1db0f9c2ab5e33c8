//! Decoded texture assets, before they are uploaded to the GPU.

use std::path::Path;

use image::RgbaImage;

/// How texture coordinates outside `0..1` are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl From<WrapMode> for wgpu::AddressMode {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// A successfully decoded normal map together with its sampling setup.
///
/// The source path is the identity of the asset. Pixels are kept in linear
/// RGBA8 since normal maps must not be gamma-corrected.
#[derive(Clone, Debug)]
pub struct TextureAsset {
    path: String,
    name: String,
    image: RgbaImage,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
    repeat: [f32; 2],
}

impl TextureAsset {
    pub fn new(path: impl Into<String>, image: RgbaImage) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            path,
            name,
            image,
            wrap_s: WrapMode::default(),
            wrap_t: WrapMode::default(),
            repeat: [1.0, 1.0],
        }
    }

    pub fn set_wrap(&mut self, wrap_s: WrapMode, wrap_t: WrapMode) {
        self.wrap_s = wrap_s;
        self.wrap_t = wrap_t;
    }

    pub fn set_repeat(&mut self, u: f32, v: f32) {
        self.repeat = [u, v];
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn wrap(&self) -> (WrapMode, WrapMode) {
        (self.wrap_s, self.wrap_t)
    }

    pub fn repeat(&self) -> [f32; 2] {
        self.repeat
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// File name of `path` without its extension, e.g. `/textures/glass.jpg` -> `glass`.
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_drops_directories_and_extension() {
        assert_eq!(display_name("/textures/glass.jpg"), "glass");
        assert_eq!(display_name("frosted.normal.png"), "frosted.normal");
        assert_eq!(display_name("textures/plain"), "plain");
    }

    #[test]
    fn new_asset_clamps_until_configured() {
        let mut asset = TextureAsset::new("/textures/a.png", RgbaImage::new(2, 2));
        assert_eq!(asset.name(), "a");
        assert_eq!(asset.wrap(), (WrapMode::ClampToEdge, WrapMode::ClampToEdge));

        asset.set_wrap(WrapMode::Repeat, WrapMode::Repeat);
        asset.set_repeat(1.0, 1.0);
        assert_eq!(asset.wrap(), (WrapMode::Repeat, WrapMode::Repeat));
        assert_eq!(asset.repeat(), [1.0, 1.0]);
        assert_eq!(
            wgpu::AddressMode::from(asset.wrap().0),
            wgpu::AddressMode::Repeat
        );
    }
}
