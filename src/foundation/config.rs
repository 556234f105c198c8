use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{MediaError, MediaResult};

/// Default number of metadata entries retained per tier.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Default font name (resolved as `<font_path>/<name>.ttf`).
pub const DEFAULT_FONT: &str = "IBMPlexSans-Bold";

/// Runtime configuration of a [`crate::MediaService`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Directory holding `.ttf` font files.
    pub font_path: PathBuf,
    /// Root of the tiered image store.
    pub image_path: PathBuf,
    /// Directory holding uploaded audio tracks.
    pub audio_path: PathBuf,
    /// Metadata entries retained per tier.
    pub cache_capacity: usize,
    /// Render worker threads; `None` lets rayon decide.
    pub worker_threads: Option<usize>,
    /// Font used when a text block names none.
    pub default_font: String,
    /// Log verbosity: `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("./fonts"),
            image_path: PathBuf::from("./images"),
            audio_path: PathBuf::from("./images/tracks"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            worker_threads: None,
            default_font: DEFAULT_FONT.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Defaults, overlaid by an optional JSON file, overlaid by `FRAMESMITH_*` variables.
    pub fn load(file: Option<&Path>) -> MediaResult<Self> {
        let mut cfg = match file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|name| std::env::var(name).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON configuration file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> MediaResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| MediaError::serde(format!("config '{}': {e}", path.display())))
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> MediaResult<()> {
        if let Some(v) = lookup("FRAMESMITH_FONT_PATH") {
            self.font_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("FRAMESMITH_IMAGE_PATH") {
            self.image_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("FRAMESMITH_AUDIO_PATH") {
            self.audio_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("FRAMESMITH_CACHE_CAPACITY") {
            self.cache_capacity = v.parse::<usize>().map_err(|e| {
                MediaError::validation(format!("FRAMESMITH_CACHE_CAPACITY '{v}': {e}"))
            })?;
        }
        if let Some(v) = lookup("FRAMESMITH_WORKER_THREADS") {
            let n = v.parse::<usize>().map_err(|e| {
                MediaError::validation(format!("FRAMESMITH_WORKER_THREADS '{v}': {e}"))
            })?;
            self.worker_threads = Some(n);
        }
        if let Some(v) = lookup("FRAMESMITH_LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    /// Reject values the service cannot start with.
    pub fn validate(&self) -> MediaResult<()> {
        if self.cache_capacity == 0 {
            return Err(MediaError::validation("cache_capacity must be >= 1"));
        }
        if self.worker_threads == Some(0) {
            return Err(MediaError::validation(
                "worker_threads must be >= 1 when set",
            ));
        }
        if self.default_font.trim().is_empty() {
            return Err(MediaError::validation("default_font must be non-empty"));
        }
        self.log_filter()?;
        Ok(())
    }

    /// Parsed [`Self::log_level`].
    pub fn log_filter(&self) -> MediaResult<tracing::Level> {
        self.log_level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| MediaError::validation(format!("unknown log_level '{}'", self.log_level)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
