use std::{
    fs::File,
    io::{Cursor, Write as _},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    foundation::core::ContentKey,
    foundation::error::{MediaError, MediaResult},
    store::tier::Tier,
};

const TMP_SUFFIX: &str = ".tmp";

static STAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Disk-backed, content-addressed blob storage with one directory per tier.
///
/// Files are named by their hex [`ContentKey`] without extension. Writes go to a `.tmp`
/// sibling and are renamed into place, so readers see either nothing or a complete file.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create the tier directories under `root` and sweep leftovers of interrupted writes.
    pub fn open(root: impl Into<PathBuf>) -> MediaResult<Self> {
        let root = root.into();
        let store = Self { root };
        let mut swept = 0usize;
        for tier in Tier::all() {
            let dir = store.tier_dir(tier);
            std::fs::create_dir_all(&dir).map_err(|e| {
                MediaError::storage(format!("create tier dir '{}': {e}", dir.display()))
            })?;
            swept += sweep_staged(&dir);
        }
        if swept > 0 {
            tracing::info!(swept, root = %store.root.display(), "removed stale staged files");
        }
        Ok(store)
    }

    /// Root directory holding the tier directories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `tier`.
    pub fn tier_dir(&self, tier: Tier) -> PathBuf {
        self.root.join(tier.dir_name())
    }

    /// Final path of `key` in `tier` (which may not exist yet).
    pub fn path_for(&self, tier: Tier, key: &ContentKey) -> PathBuf {
        self.tier_dir(tier).join(key.as_str())
    }

    /// `true` when a published artifact exists.
    pub fn contains(&self, tier: Tier, key: &ContentKey) -> bool {
        self.path_for(tier, key).is_file()
    }

    /// Read a published artifact fully.
    pub fn read(&self, tier: Tier, key: &ContentKey) -> MediaResult<Vec<u8>> {
        let path = self.path_for(tier, key);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::not_found(format!("{tier}/{key}")),
            _ => MediaError::storage(format!("read '{}': {e}", path.display())),
        })
    }

    /// Publish `bytes` under `key`; an existing artifact is kept as is.
    pub fn put_bytes(&self, tier: Tier, key: &ContentKey, bytes: &[u8]) -> MediaResult<PathBuf> {
        let dest = self.path_for(tier, key);
        if dest.is_file() {
            tracing::debug!(%tier, %key, "artifact already present");
            return Ok(dest);
        }
        let mut staged = StagedFile::create(&self.tier_dir(tier), key.as_str())?;
        staged
            .file_mut()?
            .write_all(bytes)
            .map_err(|e| MediaError::storage(format!("write {tier}/{key}: {e}")))?;
        staged.publish(&dest)?;
        tracing::debug!(%tier, %key, bytes = bytes.len(), "artifact published");
        Ok(dest)
    }

    /// Encode `img` as PNG and publish it under `key`.
    pub fn put_image(
        &self,
        tier: Tier,
        key: &ContentKey,
        img: &image::RgbaImage,
    ) -> MediaResult<PathBuf> {
        if self.contains(tier, key) {
            return Ok(self.path_for(tier, key));
        }
        let bytes = encode_png(img)?;
        self.put_bytes(tier, key, &bytes)
    }
}

/// Canonical PNG encoding used for every generated artifact.
pub fn encode_png(img: &image::RgbaImage) -> MediaResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| MediaError::render(format!("png encode: {e}")))?;
    Ok(buf)
}

/// A `.tmp` file that is either renamed into place or removed on drop.
pub(crate) struct StagedFile {
    path: Option<PathBuf>,
    file: Option<File>,
}

impl StagedFile {
    /// Create a uniquely named staging file in `dir`.
    pub(crate) fn create(dir: &Path, stem: &str) -> MediaResult<Self> {
        let seq = STAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(
            "{stem}.{}-{seq}{TMP_SUFFIX}",
            std::process::id()
        ));
        let file = File::create(&path)
            .map_err(|e| MediaError::storage(format!("create '{}': {e}", path.display())))?;
        Ok(Self {
            path: Some(path),
            file: Some(file),
        })
    }

    pub(crate) fn file_mut(&mut self) -> MediaResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| MediaError::storage("staged file already published"))
    }

    /// Flush to disk and atomically rename to `dest`.
    pub(crate) fn publish(mut self, dest: &Path) -> MediaResult<()> {
        let (Some(path), Some(file)) = (self.path.take(), self.file.take()) else {
            return Err(MediaError::storage("staged file already published"));
        };
        let fail = |path: PathBuf, e: std::io::Error| {
            let _ = std::fs::remove_file(&path);
            MediaError::storage(format!("publish '{}': {e}", dest.display()))
        };
        if let Err(e) = file.sync_all() {
            return Err(fail(path, e));
        }
        drop(file);
        if let Err(e) = std::fs::rename(&path, dest) {
            return Err(fail(path, e));
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.file.take();
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Remove leftover `.tmp` files in `dir`, returning how many were deleted.
pub(crate) fn sweep_staged(dir: &Path) -> usize {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0usize;
    for entry in rd.flatten() {
        let path = entry.path();
        let is_staged = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TMP_SUFFIX));
        if is_staged && path.is_file() && std::fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
#[path = "../../tests/unit/store/content.rs"]
mod tests;
