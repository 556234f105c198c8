//! Tiered content-addressed artifact storage with per-tier metadata caches.

pub(crate) mod content;
pub(crate) mod meta;
pub(crate) mod tier;

use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;

use crate::foundation::core::ContentKey;
use crate::foundation::error::{MediaError, MediaResult};
use crate::render::resample::downscale;

pub use content::{ContentStore, encode_png};
pub use meta::{ArtifactMeta, FALLBACK_MIME, probe_file};
pub use tier::{PRECOMPUTED_LADDER, SCALED_PIXEL_BUDGETS, Tier};

use meta::MetadataCache;

/// A published artifact and what is known about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Tier the artifact was served from.
    pub tier: Tier,
    /// Content key.
    pub key: ContentKey,
    /// Probed dimensions and mime type.
    pub meta: ArtifactMeta,
    /// Location on disk.
    pub path: PathBuf,
}

impl Artifact {
    /// Open the artifact for streaming.
    pub fn open(&self) -> MediaResult<File> {
        File::open(&self.path).map_err(|e| {
            MediaError::storage(format!("open '{}': {e}", self.path.display()))
        })
    }
}

/// [`ContentStore`] plus one bounded metadata cache per tier.
///
/// Scaled tiers outside the precomputed ladder are produced on first request from the full
/// tier.
pub struct ArtifactStore {
    content: ContentStore,
    caches: Vec<MetadataCache>,
}

impl ArtifactStore {
    /// Open (creating if needed) the store at `root`, caching up to `capacity` entries per tier.
    pub fn open(root: impl Into<PathBuf>, capacity: usize) -> MediaResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| MediaError::validation("metadata cache capacity must be >= 1"))?;
        let content = ContentStore::open(root)?;
        let caches = (0..Tier::COUNT)
            .map(|_| MetadataCache::new(capacity))
            .collect();
        Ok(Self { content, caches })
    }

    /// Underlying blob store.
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        self.content.root()
    }

    fn cache(&self, tier: Tier) -> MediaResult<&MetadataCache> {
        self.caches
            .get(tier.index())
            .ok_or_else(|| MediaError::not_found(format!("no tier {tier}")))
    }

    /// `true` when `key` is published in `tier` (cached metadata counts).
    pub fn contains(&self, tier: Tier, key: &ContentKey) -> bool {
        self.cache(tier).is_ok_and(|c| c.contains(key)) || self.content.contains(tier, key)
    }

    /// Cached or freshly probed artifact, without materializing missing tiers.
    pub fn lookup(&self, tier: Tier, key: &ContentKey) -> MediaResult<Option<Artifact>> {
        let cache = self.cache(tier)?;
        let path = self.content.path_for(tier, key);
        if let Some(meta) = cache.get(key) {
            tracing::trace!(%tier, %key, "metadata cache hit");
            return Ok(Some(Artifact {
                tier,
                key: key.clone(),
                meta,
                path,
            }));
        }

        let meta = match probe_file(&path) {
            Ok(meta) => meta,
            Err(MediaError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        cache.insert(key.clone(), meta.clone());
        tracing::debug!(
            %tier,
            %key,
            width = meta.width,
            height = meta.height,
            mime = %meta.mime,
            cached = cache.len(),
            "metadata probed"
        );
        Ok(Some(Artifact {
            tier,
            key: key.clone(),
            meta,
            path,
        }))
    }

    /// Artifact for `key` in `tier`; scaled tiers are derived from the full tier when absent.
    pub fn get(&self, tier: Tier, key: &ContentKey) -> MediaResult<Artifact> {
        if let Some(found) = self.lookup(tier, key)? {
            return Ok(found);
        }
        let Some(budget) = tier.pixel_budget() else {
            return Err(MediaError::not_found(format!("{tier}/{key}")));
        };

        self.materialize(tier, budget, key)?;
        self.lookup(tier, key)?
            .ok_or_else(|| MediaError::not_found(format!("{tier}/{key}")))
    }

    fn materialize(&self, tier: Tier, budget: u64, key: &ContentKey) -> MediaResult<()> {
        tracing::debug!(%tier, %key, "materializing scaled tier from full");
        let bytes = self.content.read(Tier::Full, key)?;
        let full = image::load_from_memory(&bytes)
            .map_err(|e| MediaError::decode(format!("F/{key}: {e}")))?
            .to_rgba8();
        let scaled = downscale(&full, budget)?;
        self.content.put_image(tier, key, &scaled)?;
        Ok(())
    }

    /// Stream an artifact with its metadata.
    pub fn open_artifact(&self, tier: Tier, key: &ContentKey) -> MediaResult<(ArtifactMeta, File)> {
        let artifact = self.get(tier, key)?;
        let file = artifact.open()?;
        Ok((artifact.meta, file))
    }

    /// Publish raw bytes.
    pub fn put_bytes(&self, tier: Tier, key: &ContentKey, bytes: &[u8]) -> MediaResult<PathBuf> {
        self.content.put_bytes(tier, key, bytes)
    }

    /// Publish an image as PNG.
    pub fn put_image(&self, tier: Tier, key: &ContentKey, img: &RgbaImage) -> MediaResult<PathBuf> {
        self.content.put_image(tier, key, img)
    }

    /// Write every tier of [`PRECOMPUTED_LADDER`] that is not yet present.
    pub fn precompute_ladder(&self, key: &ContentKey, img: &RgbaImage) -> MediaResult<()> {
        PRECOMPUTED_LADDER.par_iter().try_for_each(|&tier| {
            if self.content.contains(tier, key) {
                return Ok(());
            }
            let budget = tier
                .pixel_budget()
                .ok_or_else(|| MediaError::validation(format!("{tier} has no pixel budget")))?;
            let scaled = downscale(img, budget)?;
            self.content.put_image(tier, key, &scaled).map(|_| ())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/artifact.rs"]
mod tests;
