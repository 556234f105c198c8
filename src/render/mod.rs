//! Frame composition, resampling and the render job.

pub(crate) mod canvas;
pub(crate) mod compositor;
pub(crate) mod overlay;
pub(crate) mod pipeline;
pub(crate) mod resample;

pub use canvas::Canvas;
pub use compositor::Compositor;
pub use overlay::{apply_play_overlay, play_button};
pub use pipeline::FrameRenderer;
pub use resample::{downscale, target_dimensions};
