use canis_core::AssetResolver;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fallback clip when a behavior has no dedicated video.
pub const DEFAULT_CLIP: &str = "default.mp4";

/// Maps behavior names to `<dir>/<name>.mp4`, falling back to the default
/// clip, and remembers the last one chosen even when it is missing on disk.
#[derive(Debug)]
pub struct VideoLibrary {
    dir: PathBuf,
    current: Mutex<Option<PathBuf>>,
}

impl VideoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if !dir.is_dir() {
            tracing::warn!("Video directory {} does not exist", dir.display());
        }
        Self {
            dir,
            current: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lookup(&self, name: &str) -> PathBuf {
        let clip = self.dir.join(format!("{name}.mp4"));
        if clip.is_file() {
            clip
        } else {
            self.dir.join(DEFAULT_CLIP)
        }
    }
}

impl AssetResolver for VideoLibrary {
    fn on_behavior_name_resolved(&self, name: &str) -> anyhow::Result<PathBuf> {
        let clip = self.lookup(name);
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(clip.clone());
        if !clip.is_file() {
            anyhow::bail!(
                "No clip for {} and no {} in {}",
                name,
                DEFAULT_CLIP,
                self.dir.display()
            );
        }
        tracing::debug!("Playing {}", clip.display());
        Ok(clip)
    }

    fn current(&self) -> Option<PathBuf> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
