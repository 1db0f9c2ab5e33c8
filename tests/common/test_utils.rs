use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    io::Cursor,
};

use anyhow::Context as _;
use glass_grid::{
    config::SceneConfig, data_structures::environment::PrefilterSettings,
    resources::AssetSource,
};
use image::{DynamicImage, ImageFormat, Rgb, Rgb32FImage, Rgba, RgbaImage};
use tokio::time::Duration;

pub const ENVIRONMENT: &str = "/textures/night.hdr";

/// In-memory asset source with per-path latency and failures.
///
/// Records the order in which fetches start and complete so tests can check
/// both sequencing and concurrency. Latency is virtual when the test runs
/// with `start_paused = true`.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    latency: HashMap<String, Duration>,
    failures: HashSet<String>,
    started: RefCell<Vec<String>>,
    completed: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    pub fn with_latency(mut self, path: &str, millis: u64) -> Self {
        self.latency
            .insert(path.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.failures.insert(path.to_string());
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.borrow().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.borrow().clone()
    }
}

impl AssetSource for MemorySource {
    async fn fetch(&self, path: &str, progress: Option<&dyn Fn(f32)>) -> anyhow::Result<Vec<u8>> {
        self.started.borrow_mut().push(path.to_string());
        if let Some(delay) = self.latency.get(path) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(path) {
            anyhow::bail!("simulated failure for {path}");
        }
        let bytes = self
            .files
            .get(path)
            .cloned()
            .with_context(|| format!("{path} not found"))?;
        if let Some(progress) = progress {
            progress(0.5);
            progress(1.0);
        }
        self.completed.borrow_mut().push(path.to_string());
        Ok(bytes)
    }
}

/// A uniform Radiance HDR panorama.
pub fn hdr_bytes(width: u32, height: u32, colour: [f32; 3]) -> Vec<u8> {
    let image = Rgb32FImage::from_pixel(width, height, Rgb(colour));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb32F(image)
        .write_to(&mut cursor, ImageFormat::Hdr)
        .unwrap();
    cursor.into_inner()
}

/// A flat tangent-space normal map (every texel points straight out).
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([128, 128, 255, 255]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut cursor, ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

pub fn texture_path(name: &str) -> String {
    format!("/textures/{name}.png")
}

/// Source holding a valid environment plus one normal map per name.
pub fn source_with(names: &[&str]) -> MemorySource {
    names.iter().fold(
        MemorySource::new().with_file(ENVIRONMENT, hdr_bytes(32, 16, [0.5, 0.5, 0.5])),
        |source, name| source.with_file(&texture_path(name), png_bytes(4, 4)),
    )
}

/// Default scene with a small prefilter chain and the given normal maps.
pub fn config_with(names: &[&str]) -> SceneConfig {
    let mut config = SceneConfig::default()
        .with_environment(ENVIRONMENT)
        .with_textures(names.iter().map(|name| texture_path(name)));
    config.prefilter = PrefilterSettings {
        base_width: 16,
        levels: 3,
        max_blur: 1.0,
    };
    config
}

/// All orderings of `items`.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut all = Vec::new();
    for (i, head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            all.push(tail);
        }
    }
    all
}
