use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};

use crate::foundation::core::{ContentHasher, ContentKey};
use crate::foundation::error::{MediaError, MediaResult};
use crate::store::content::{StagedFile, sweep_staged};

/// Bytes read up front to identify an upload.
pub const SNIFF_LEN: usize = 265;

/// Audio containers accepted for upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    /// MPEG-1/2 layer III, with or without an ID3 tag.
    Mp3,
    /// Ogg container.
    Ogg,
    /// AAC in ADTS framing.
    Aac,
    /// WebM (Matroska with a `webm` doctype).
    Webm,
}

impl AudioKind {
    /// Content type served for this kind.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Aac => "audio/aac",
            Self::Webm => "video/webm",
        }
    }
}

/// Identify an allowed audio container from its first bytes.
pub fn sniff(head: &[u8]) -> Option<AudioKind> {
    if infer::audio::is_mp3(head) {
        Some(AudioKind::Mp3)
    } else if infer::audio::is_ogg(head) {
        Some(AudioKind::Ogg)
    } else if infer::audio::is_aac(head) {
        Some(AudioKind::Aac)
    } else if infer::video::is_webm(head) {
        Some(AudioKind::Webm)
    } else {
        None
    }
}

/// A stored track.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Track {
    /// Content key (MD5 of the uploaded bytes).
    pub key: ContentKey,
    /// Location on disk.
    pub path: PathBuf,
    /// Detected container.
    pub kind: AudioKind,
}

/// Flat content-addressed directory of uploaded audio.
#[derive(Clone, Debug)]
pub struct TrackStore {
    dir: PathBuf,
}

impl TrackStore {
    /// Create `dir` if needed and sweep interrupted uploads.
    pub fn open(dir: impl Into<PathBuf>) -> MediaResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            MediaError::storage(format!("create track dir '{}': {e}", dir.display()))
        })?;
        let swept = sweep_staged(&dir);
        if swept > 0 {
            tracing::info!(swept, dir = %dir.display(), "removed stale track uploads");
        }
        Ok(Self { dir })
    }

    /// Track directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream `reader` into the store, hashing while writing.
    ///
    /// Uploads that do not start like an allowed container are rejected before anything is
    /// written.
    pub fn ingest(&self, mut reader: impl Read) -> MediaResult<Track> {
        let mut head = Vec::with_capacity(SNIFF_LEN);
        reader
            .by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| MediaError::storage(format!("read upload: {e}")))?;
        let kind = sniff(&head).ok_or_else(|| {
            MediaError::unsupported(format!(
                "upload is not one of mp3, ogg, aac, webm ({} bytes sniffed)",
                head.len()
            ))
        })?;

        let mut hasher = ContentHasher::new();
        let mut staged = StagedFile::create(&self.dir, "upload")?;
        let mut total = head.len() as u64;
        hasher.update(&head);
        write_chunk(&mut staged, &head)?;

        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MediaError::storage(format!("read upload: {e}"))),
            };
            hasher.update(&buf[..n]);
            write_chunk(&mut staged, &buf[..n])?;
            total += n as u64;
        }

        let key = hasher.finish();
        let path = self.path_for(&key);
        if path.is_file() {
            tracing::debug!(%key, "track already stored");
        } else {
            staged.publish(&path)?;
            tracing::info!(%key, ?kind, bytes = total, "track stored");
        }
        Ok(Track { key, path, kind })
    }

    fn path_for(&self, key: &ContentKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    /// Look up a stored track and re-sniff its container.
    pub fn get(&self, key: &ContentKey) -> MediaResult<Track> {
        let path = self.path_for(key);
        let file = std::fs::File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::not_found(format!("track {key}")),
            _ => MediaError::storage(format!("open '{}': {e}", path.display())),
        })?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| MediaError::storage(format!("read '{}': {e}", path.display())))?;
        let kind = sniff(&head)
            .ok_or_else(|| MediaError::unsupported(format!("track {key} is not audio")))?;
        Ok(Track {
            key: key.clone(),
            path,
            kind,
        })
    }

    /// Remove a stored track.
    pub fn delete(&self, key: &ContentKey) -> MediaResult<()> {
        let path = self.path_for(key);
        std::fs::remove_file(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::not_found(format!("track {key}")),
            _ => MediaError::storage(format!("delete '{}': {e}", path.display())),
        })?;
        tracing::info!(%key, "track deleted");
        Ok(())
    }
}

fn write_chunk(staged: &mut StagedFile, bytes: &[u8]) -> MediaResult<()> {
    staged
        .file_mut()?
        .write_all(bytes)
        .map_err(|e| MediaError::storage(format!("write upload: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/media/audio.rs"]
mod tests;
