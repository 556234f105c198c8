//! Process-level facade: render submission, artifact fetch, image and track ingest.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::sync::Arc;

use image::ImageFormat;

use crate::foundation::config::ServiceConfig;
use crate::foundation::core::{ContentHasher, ContentKey};
use crate::foundation::error::{MediaError, MediaResult};
use crate::media::audio::{Track, TrackStore};
use crate::media::tube::{thumbnail_urls, video_id_from_url};
use crate::model::frame::FrameSpec;
use crate::render::overlay::apply_play_overlay;
use crate::render::pipeline::FrameRenderer;
use crate::scheduler::Scheduler;
use crate::store::{ArtifactMeta, ArtifactStore, Tier, encode_png};
use crate::text::{FontLibrary, GlyphSource};

const OVERLAY_TAG: &[u8] = b"play-overlay:";

/// Owns the artifact store, the render scheduler and the track store.
pub struct MediaService {
    config: ServiceConfig,
    store: Arc<ArtifactStore>,
    scheduler: Scheduler,
    tracks: TrackStore,
}

impl MediaService {
    /// Open every store named by `config` and start the render workers.
    pub fn open(config: ServiceConfig) -> MediaResult<Self> {
        let fonts = FontLibrary::new(&config.font_path, config.default_font.clone());
        Self::with_glyphs(config, Arc::new(fonts))
    }

    /// Like [`Self::open`], shaping text with `glyphs` instead of the font directory.
    pub fn with_glyphs(config: ServiceConfig, glyphs: Arc<dyn GlyphSource>) -> MediaResult<Self> {
        config.validate()?;
        let store = Arc::new(ArtifactStore::open(&config.image_path, config.cache_capacity)?);
        let job = Arc::new(FrameRenderer::new(store.clone(), glyphs));
        let scheduler = Scheduler::start(job, config.worker_threads)?;
        let tracks = TrackStore::open(&config.audio_path)?;
        tracing::info!(
            images = %config.image_path.display(),
            fonts = %config.font_path.display(),
            tracks = %config.audio_path.display(),
            "media service ready"
        );
        Ok(Self {
            config,
            store,
            scheduler,
            tracks,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared artifact store.
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Render the frame described by `body` unless it already exists, returning its key.
    ///
    /// A caller-supplied `key` must equal the digest of `body`. Blocks until the full tier
    /// and the precomputed ladder are published or the render fails.
    #[tracing::instrument(skip(self, body), fields(bytes = body.len()))]
    pub fn submit_render(&self, key: Option<&str>, body: &[u8]) -> MediaResult<ContentKey> {
        let actual = ContentKey::digest(body);
        if let Some(expected) = key
            && !expected.trim().eq_ignore_ascii_case(actual.as_str())
        {
            return Err(MediaError::KeyMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        if self.store.lookup(Tier::Full, &actual)?.is_some() {
            tracing::debug!(key = %actual, "render cache hit");
            return Ok(actual);
        }

        let spec = FrameSpec::from_json(body)?;
        tracing::debug!(key = %actual, nodes = spec.node_count(), "render admitted");
        self.scheduler.render(actual.clone(), spec)?;
        Ok(actual)
    }

    /// Metadata and an open file for `key` in `tier`; scaled tiers are derived on demand.
    #[tracing::instrument(skip(self))]
    pub fn fetch_artifact(&self, tier: Tier, key: &str) -> MediaResult<(ArtifactMeta, File)> {
        let key = parse_known_key(key)?;
        self.store.open_artifact(tier, &key)
    }

    /// Store an uploaded image and precompute its ladder.
    ///
    /// GIFs are kept byte for byte; everything else is re-encoded as PNG and keyed by the
    /// PNG bytes.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn ingest_image(&self, bytes: &[u8]) -> MediaResult<ContentKey> {
        let format = image::guess_format(bytes)
            .map_err(|e| MediaError::unsupported(format!("image upload: {e}")))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| MediaError::decode(format!("image upload: {e}")))?
            .to_rgba8();

        let full: Cow<'_, [u8]> = if format == ImageFormat::Gif {
            Cow::Borrowed(bytes)
        } else {
            Cow::Owned(encode_png(&img)?)
        };
        let key = ContentKey::digest(&full);
        self.store.precompute_ladder(&key, &img)?;
        self.store.put_bytes(Tier::Full, &key, &full)?;
        tracing::info!(%key, ?format, width = img.width(), height = img.height(), "image ingested");
        Ok(key)
    }

    /// Store `bytes` with the play-button overlay composited on top.
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn ingest_thumbnail_overlay(&self, bytes: &[u8]) -> MediaResult<ContentKey> {
        let mut hasher = ContentHasher::new();
        hasher.update(OVERLAY_TAG);
        hasher.update(bytes);
        let key = hasher.finish();
        self.publish_overlay(&key, bytes)?;
        Ok(key)
    }

    /// Fetch the best available thumbnail for a video URL and store it with the overlay.
    ///
    /// The key is the digest of `url`, so repeated requests for the same link skip the fetch.
    #[tracing::instrument(skip(self, fetch))]
    pub fn ingest_tube_thumbnail(
        &self,
        url: &str,
        mut fetch: impl FnMut(&str) -> MediaResult<Vec<u8>>,
    ) -> MediaResult<ContentKey> {
        let id = video_id_from_url(url)?;
        let key = ContentKey::digest(url.as_bytes());
        if self.store.contains(Tier::Full, &key) {
            tracing::debug!(%key, "thumbnail already stored");
            return Ok(key);
        }

        let mut last_err = None;
        for candidate in thumbnail_urls(&id) {
            match fetch(&candidate) {
                Ok(bytes) => {
                    self.publish_overlay(&key, &bytes)?;
                    return Ok(key);
                }
                Err(e) => {
                    tracing::warn!(url = %candidate, error = %e, "thumbnail candidate failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| MediaError::not_found(format!("thumbnail for {id}"))))
    }

    fn publish_overlay(&self, key: &ContentKey, bytes: &[u8]) -> MediaResult<()> {
        if self.store.contains(Tier::Full, key) {
            return Ok(());
        }
        let img = image::load_from_memory(bytes)
            .map_err(|e| MediaError::decode(format!("thumbnail: {e}")))?
            .to_rgba8();
        let composed = apply_play_overlay(&img)?;
        self.store.precompute_ladder(key, &composed)?;
        self.store.put_image(Tier::Full, key, &composed)?;
        tracing::info!(%key, width = composed.width(), height = composed.height(), "thumbnail stored");
        Ok(())
    }

    /// Stream an audio upload into the track store.
    #[tracing::instrument(skip_all)]
    pub fn ingest_track(&self, reader: impl Read) -> MediaResult<Track> {
        self.tracks.ingest(reader)
    }

    /// Stored track for `key`.
    pub fn track(&self, key: &str) -> MediaResult<Track> {
        self.tracks.get(&parse_known_key(key)?)
    }

    /// Remove the stored track for `key`.
    #[tracing::instrument(skip(self))]
    pub fn delete_track(&self, key: &str) -> MediaResult<()> {
        self.tracks.delete(&parse_known_key(key)?)
    }
}

/// Keys from outside that are not well-formed cannot name anything stored.
fn parse_known_key(key: &str) -> MediaResult<ContentKey> {
    ContentKey::parse(key.trim()).map_err(|_| MediaError::not_found(format!("key '{key}'")))
}

#[cfg(test)]
#[path = "../tests/unit/service.rs"]
mod tests;
