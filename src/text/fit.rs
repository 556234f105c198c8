use crate::foundation::error::MediaResult;

/// Upper bound on auto-fit probes.
pub const MAX_FIT_ITERATIONS: u32 = 64;

/// Extra room added to the smaller available edge to form the search interval.
const FIT_HEADROOM_PT: f64 = 100.0;

/// Measured size of a shaped string, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    /// Advance width of the widest line.
    pub width: f32,
    /// Sum of line heights.
    pub height: f32,
}

/// Measurement seam between the layout algorithms and a concrete shaper.
pub trait TextMeasure {
    /// Measure `text` (which may contain `\n`) at `size_px`.
    fn measure(&mut self, text: &str, size_px: f32) -> MediaResult<TextExtent>;
}

/// Convert a point size to pixels at `dpi`.
pub fn pt_to_px(size_pt: f32, dpi: f32) -> f32 {
    size_pt * dpi / 72.0
}

/// Collapse runs of spaces and drop spaces that touch a line break.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last: Option<char> = None;
    for ch in text.chars() {
        match (last, ch) {
            (Some(' '), ' ') | (Some('\n'), ' ') => continue,
            (Some(' '), '\n') => {
                out.pop();
                out.push('\n');
            }
            _ => out.push(ch),
        }
        last = Some(ch);
    }
    out
}

/// Result of an auto-fit search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitOutcome {
    /// Chosen size in points.
    pub size_pt: f32,
    /// Extent measured at `size_pt`.
    pub extent: TextExtent,
    /// Whether the binding axis landed within one pixel of its target.
    pub converged: bool,
    /// Probes spent.
    pub iterations: u32,
}

/// Bisect the point size so the binding axis of `text` fills `avail_w x avail_h`.
///
/// The binding axis is whichever axis has less slack at the current probe. The search stops as
/// soon as that axis is within one pixel of its target. If [`MAX_FIT_ITERATIONS`] probes pass
/// without that happening, the largest probe that fit inside the box is returned (or the
/// smallest probe, if none did) and the outcome is flagged as not converged.
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    measure: &mut M,
    text: &str,
    avail_w: u32,
    avail_h: u32,
    dpi: f32,
) -> MediaResult<FitOutcome> {
    let target_w = f64::from(avail_w);
    let target_h = f64::from(avail_h);

    let mut lo = 0.0f64;
    let mut hi = target_w.min(target_h) + FIT_HEADROOM_PT;
    let mut cur = (hi - lo) / 2.0;

    let mut best_fit: Option<(f64, TextExtent)> = None;
    let mut smallest: Option<(f64, TextExtent)> = None;

    for iteration in 1..=MAX_FIT_ITERATIONS {
        let extent = measure.measure(text, pt_to_px(cur as f32, dpi))?;
        let fw = f64::from(extent.width).floor();
        let fh = f64::from(extent.height).floor();

        let (got, target) = if target_w - fw > target_h - fh {
            (fh, target_h)
        } else {
            (fw, target_w)
        };

        if (got - target).abs() <= 1.0 {
            return Ok(FitOutcome {
                size_pt: cur as f32,
                extent,
                converged: true,
                iterations: iteration,
            });
        }

        if fw <= target_w && fh <= target_h && best_fit.is_none_or(|(s, _)| cur > s) {
            best_fit = Some((cur, extent));
        }
        if smallest.is_none_or(|(s, _)| cur < s) {
            smallest = Some((cur, extent));
        }

        if got < target {
            lo = cur;
        } else {
            hi = cur;
        }
        cur = lo + (hi - lo) / 2.0;
    }

    let (size, extent) = best_fit.or(smallest).unwrap_or((0.0, TextExtent::default()));
    tracing::warn!(
        text_len = text.len(),
        avail_w,
        avail_h,
        size_pt = size,
        "auto-fit did not converge, using best candidate"
    );
    Ok(FitOutcome {
        size_pt: size as f32,
        extent,
        converged: false,
        iterations: MAX_FIT_ITERATIONS,
    })
}

/// Greedy word wrap of `text` at `max_width` pixels.
///
/// Explicit `\n` always breaks. Within a paragraph, words (split on single spaces, empty pieces
/// dropped) are appended while the joined line still measures `<= max_width`; a word that does
/// not fit starts the next line. Every emitted line holds at least one word, so an overlong word
/// sits alone on its own line. Blank paragraphs yield an empty line.
pub fn wrap_lines<M: TextMeasure + ?Sized>(
    measure: &mut M,
    text: &str,
    max_width: u32,
    size_px: f32,
) -> MediaResult<Vec<String>> {
    let limit = f64::from(max_width);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut words = paragraph.split(' ').filter(|w| !w.is_empty());
        let Some(first) = words.next() else {
            lines.push(String::new());
            continue;
        };
        let mut current = first.to_string();
        for word in words {
            let candidate = format!("{current} {word}");
            let width = f64::from(measure.measure(&candidate, size_px)?.width).ceil();
            if width > limit {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/text/fit.rs"]
mod tests;
