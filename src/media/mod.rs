//! Collaborators around the render core: audio uploads and video thumbnails.

pub(crate) mod audio;
pub(crate) mod tube;

pub use audio::{AudioKind, SNIFF_LEN, Track, TrackStore, sniff};
pub use tube::{MIN_VIDEO_ID_LEN, thumbnail_urls, video_id_from_url};
