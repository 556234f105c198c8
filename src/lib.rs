//! Framesmith renders declarative frame descriptions into images and serves them from a
//! content-addressed store with precomputed downscaled tiers.
//!
//! - Submit a [`FrameSpec`] through [`MediaService::submit_render`]
//! - Identical submissions render once; every caller waits on the same [`RenderTicket`]
//! - Fetch any [`Tier`] of a stored artifact; missing scaled tiers are derived on demand
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod media;
pub(crate) mod model;
pub(crate) mod render;
pub(crate) mod scheduler;
pub(crate) mod service;
pub(crate) mod store;
pub(crate) mod text;

pub use crate::foundation::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_FONT, ServiceConfig};
pub use crate::foundation::core::{CONTENT_KEY_LEN, ContentHasher, ContentKey, Rgba8};
pub use crate::foundation::error::{ErrorKind, MediaError, MediaResult};

pub use crate::media::{
    AudioKind, MIN_VIDEO_ID_LEN, SNIFF_LEN, Track, TrackStore, sniff, thumbnail_urls, video_id_from_url,
};
pub use crate::model::frame::{AlignH, AlignV, DEFAULT_TEXT_DPI, FrameSpec, MAX_FRAME_EDGE, TextSpec};
pub use crate::render::{
    Canvas, Compositor, FrameRenderer, apply_play_overlay, downscale, play_button,
    target_dimensions,
};
pub use crate::scheduler::{RenderJob, RenderTicket, Scheduler};
pub use crate::service::MediaService;
pub use crate::store::{
    Artifact, ArtifactMeta, ArtifactStore, ContentStore, FALLBACK_MIME, PRECOMPUTED_LADDER,
    SCALED_PIXEL_BUDGETS, Tier, encode_png, probe_file,
};
pub use crate::text::{
    FitOutcome, FontLibrary, GlyphBitmap, GlyphSource, MAX_FIT_ITERATIONS, PixelRect, PlacedBitmap,
    TextBox, TextExtent, TextMeasure, TextRaster, WRAP_FALLBACK_PT, fit_font_size, layout,
    pt_to_px, sanitize, wrap_lines,
};
