use std::sync::Arc;

use crate::foundation::core::ContentKey;
use crate::foundation::error::MediaResult;
use crate::model::frame::FrameSpec;
use crate::render::compositor::Compositor;
use crate::scheduler::RenderJob;
use crate::store::ArtifactStore;
use crate::store::tier::Tier;
use crate::text::GlyphSource;

/// Render job run by the scheduler: composite, publish the ladder, then the full tier.
///
/// The full tier is what marks a frame as rendered, so it goes last.
pub struct FrameRenderer<G: GlyphSource + ?Sized> {
    store: Arc<ArtifactStore>,
    glyphs: Arc<G>,
}

impl<G: GlyphSource + ?Sized> FrameRenderer<G> {
    /// Renderer writing into `store` and shaping text with `glyphs`.
    pub fn new(store: Arc<ArtifactStore>, glyphs: Arc<G>) -> Self {
        Self { store, glyphs }
    }
}

impl<G: GlyphSource + ?Sized + 'static> RenderJob for FrameRenderer<G> {
    #[tracing::instrument(skip_all, fields(%key))]
    fn run(&self, key: &ContentKey, spec: &FrameSpec) -> MediaResult<()> {
        if self.store.contains(Tier::Full, key) {
            tracing::debug!("already rendered");
            return Ok(());
        }

        let started = std::time::Instant::now();
        let img = Compositor::new(self.store.content(), self.glyphs.as_ref()).render(spec)?;
        self.store.precompute_ladder(key, &img)?;
        self.store.put_image(Tier::Full, key, &img)?;
        tracing::info!(
            width = img.width(),
            height = img.height(),
            nodes = spec.node_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame rendered"
        );
        Ok(())
    }
}
