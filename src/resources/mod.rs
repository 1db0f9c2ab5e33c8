//! Loading of normal maps and the HDR environment from external files.

use std::future::Future;

pub mod batch;
pub mod environment;

/// Where asset bytes come from.
///
/// The loaders only ever ask for bytes by path; the platform decides whether
/// that is a file read or an HTTP request. `progress` receives the loaded
/// fraction in `[0, 1]` whenever the source can tell.
pub trait AssetSource {
    fn fetch(
        &self,
        path: &str,
        progress: Option<&dyn Fn(f32)>,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

/// Load failures, always carrying the path that failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {path}")]
    Fetch {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to decode {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to prefilter {path}")]
    Prefilter {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &str {
        match self {
            LoadError::Fetch { path, .. }
            | LoadError::Decode { path, .. }
            | LoadError::Prefilter { path, .. } => path,
        }
    }
}

/// Reads assets from `./assets` natively and from `<origin>/assets` on the web.
///
/// Leading slashes are ignored, so `/textures/glass.jpg` and
/// `textures/glass.jpg` resolve to the same file.
#[derive(Clone, Debug)]
pub struct FileSource {
    root: String,
}

impl FileSource {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn resolve(&self, path: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.root).join(path.trim_start_matches('/'))
    }

    #[cfg(target_arch = "wasm32")]
    fn resolve(&self, path: &str) -> anyhow::Result<reqwest::Url> {
        use anyhow::Context;

        let window = web_sys::window().context("no window")?;
        let origin = window
            .location()
            .origin()
            .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
        let base = reqwest::Url::parse(&format!("{}/{}/", origin, self.root.trim_matches('/')))?;
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

impl Default for FileSource {
    fn default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            // Fall back to the copy made by build.rs when started outside the crate root.
            if !std::path::Path::new("assets").exists() {
                return Self::new(env!("GLASS_GRID_BUNDLED_ASSETS"));
            }
        }
        Self::new("assets")
    }
}

#[cfg(not(target_arch = "wasm32"))]
const CHUNK_SIZE: usize = 64 * 1024;

impl AssetSource for FileSource {
    async fn fetch(&self, path: &str, progress: Option<&dyn Fn(f32)>) -> anyhow::Result<Vec<u8>> {
        use anyhow::Context;

        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.resolve(path)?;
            let response = reqwest::get(url).await?.error_for_status()?;
            let data = response.bytes().await?.to_vec();
            if let Some(progress) = progress {
                progress(1.0);
            }
            data
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            use tokio::io::AsyncReadExt;

            let full_path = self.resolve(path);
            let mut file = tokio::fs::File::open(&full_path)
                .await
                .with_context(|| format!("cannot open {}", full_path.display()))?;
            let total = file.metadata().await?.len();
            let mut data = Vec::with_capacity(total as usize);
            let mut chunk = vec![0u8; CHUNK_SIZE];
            loop {
                let read = file.read(&mut chunk).await?;
                if read == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..read]);
                if let Some(progress) = progress {
                    if total > 0 {
                        progress((data.len() as f32 / total as f32).min(1.0));
                    }
                }
            }
            if let Some(progress) = progress {
                if total == 0 {
                    progress(1.0);
                }
            }
            data
        };

        Ok(data)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("glass-grid-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_relative_to_root_and_reports_progress() {
        let dir = scratch_dir("progress");
        let bytes = vec![7u8; CHUNK_SIZE * 2 + 10];
        std::fs::write(dir.join("textures/blob.bin"), &bytes).unwrap();

        let source = FileSource::new(dir.to_string_lossy());
        let seen = RefCell::new(Vec::new());
        let record = |fraction: f32| seen.borrow_mut().push(fraction);
        let data = source
            .fetch("/textures/blob.bin", Some(&record))
            .await
            .unwrap();

        assert_eq!(data, bytes);
        let seen = seen.into_inner();
        assert!(seen.len() >= 3);
        assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let source = FileSource::new(scratch_dir("missing").to_string_lossy());
        let err = source.fetch("textures/nope.jpg", None).await.unwrap_err();
        assert!(format!("{err:#}").contains("nope.jpg"));
    }
}
