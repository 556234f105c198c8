use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

use crate::foundation::core::ContentKey;
use crate::foundation::error::{MediaError, MediaResult};

/// Mime type reported when a stored file cannot be probed.
pub const FALLBACK_MIME: &str = "image/png";

/// Dimensions and content type of a stored artifact.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ArtifactMeta {
    /// Width in pixels (0 when the file could not be probed).
    pub width: u32,
    /// Height in pixels (0 when the file could not be probed).
    pub height: u32,
    /// Content type, e.g. `image/png`.
    pub mime: String,
}

/// Read just the header of an image file to recover its metadata.
///
/// Files the decoder does not recognize are reported as `image/png` with zero dimensions; a
/// missing file is [`MediaError::NotFound`].
pub fn probe_file(path: &Path) -> MediaResult<ArtifactMeta> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MediaError::not_found(path.display().to_string()),
        _ => MediaError::storage(format!("open '{}': {e}", path.display())),
    })?;

    let probed = image::ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|e| MediaError::storage(format!("read '{}': {e}", path.display())))
        .map(|reader| {
            let mime = reader.format().map(|f| f.to_mime_type().to_string());
            (mime, reader.into_dimensions())
        })?;

    match probed {
        (Some(mime), Ok((width, height))) => Ok(ArtifactMeta {
            width,
            height,
            mime,
        }),
        (_, dims) => {
            tracing::debug!(path = %path.display(), ok = dims.is_ok(), "probe failed, using fallback");
            Ok(ArtifactMeta {
                width: 0,
                height: 0,
                mime: FALLBACK_MIME.to_string(),
            })
        }
    }
}

/// Bounded least-recently-used map from key to metadata for one tier.
///
/// Eviction only forgets metadata; the stored file stays and is re-probed on the next lookup.
pub(crate) struct MetadataCache {
    inner: Mutex<LruCache<ContentKey, ArtifactMeta>>,
}

impl MetadataCache {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn get(&self, key: &ContentKey) -> Option<ArtifactMeta> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    pub(crate) fn insert(&self, key: ContentKey, meta: ArtifactMeta) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.put(key, meta);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn contains(&self, key: &ContentKey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/meta.rs"]
mod tests;
