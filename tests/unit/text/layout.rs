use super::*;

/// Monospace stand-in painting solid blocks: `0.5 * px` per char, `1.25 * px` per line.
struct Blocks;

impl TextMeasure for Blocks {
    fn measure(&mut self, text: &str, size_px: f32) -> MediaResult<TextExtent> {
        let widest = text.split('\n').map(|l| l.chars().count()).max().unwrap_or(0);
        let lines = text.split('\n').count();
        Ok(TextExtent {
            width: widest as f32 * 0.5 * size_px,
            height: lines as f32 * 1.25 * size_px,
        })
    }
}

impl TextRaster for Blocks {
    fn rasterize(
        &mut self,
        _text: &str,
        _size_px: f32,
        color: Rgba8,
        window: PixelRect,
    ) -> MediaResult<GlyphBitmap> {
        Ok(GlyphBitmap {
            width: window.width,
            height: window.height,
            pixels: vec![color.premul(); window.width as usize * window.height as usize],
        })
    }
}

fn text(v: serde_json::Value) -> TextSpec {
    serde_json::from_value(v).unwrap()
}

fn bx(width: u32, height: u32, inset: u32) -> TextBox {
    TextBox::new(width, height, inset)
}

#[test]
fn empty_string_places_nothing() {
    let t = text(serde_json::json!({"string": ""}));
    assert!(layout(&t, bx(100, 100, 0), &mut Blocks).unwrap().is_empty());
}

#[test]
fn left_top_alignment_respects_padding_and_border() {
    let t = text(serde_json::json!({
        "string": "ab", "fontsize": 72.0, "dpi": 72.0,
        "padX": 5, "padY": 5, "alignH": "left", "alignV": "top"
    }));
    let placed = layout(&t, bx(300, 200, 2), &mut Blocks).unwrap();
    assert_eq!(placed.len(), 1);
    assert_eq!((placed[0].x, placed[0].y), (7, 7));
    assert_eq!(placed[0].bitmap.width, 72);
}

#[test]
fn right_bottom_alignment_ends_at_padding() {
    let t = text(serde_json::json!({
        "string": "ab", "fontsize": 72.0, "dpi": 72.0,
        "padX": 5, "padY": 5, "alignH": "right", "alignV": "bottom"
    }));
    let placed = layout(&t, bx(300, 200, 2), &mut Blocks).unwrap();
    // 300 - 5 - 2 - 72 and 200 - 5 - 2 - 90
    assert_eq!((placed[0].x, placed[0].y), (221, 103));
}

#[test]
fn centre_alignment_uses_frame_midpoint() {
    let t = text(serde_json::json!({
        "string": "ab", "fontsize": 72.0, "dpi": 72.0, "padX": 30, "alignV": "center"
    }));
    let placed = layout(&t, bx(300, 200, 0), &mut Blocks).unwrap();
    assert_eq!((placed[0].x, placed[0].y), (114, 55));
}

#[test]
fn wrapped_lines_stack_by_height() {
    let t = text(serde_json::json!({
        "string": "aaaa bbbb cccc", "fontsize": 10.0, "dpi": 72.0,
        "wrap": true, "alignH": "left"
    }));
    let placed = layout(&t, bx(60, 100, 0), &mut Blocks).unwrap();
    assert_eq!(placed.len(), 2);
    assert_eq!((placed[0].x, placed[0].y), (0, 0));
    assert_eq!(placed[0].bitmap.width, 45);
    assert_eq!((placed[1].x, placed[1].y), (0, 13));
    assert_eq!(placed[1].bitmap.width, 20);
}

#[test]
fn wrapped_blank_lines_still_advance() {
    let t = text(serde_json::json!({
        "string": "a\n\nb", "fontsize": 10.0, "dpi": 72.0, "wrap": true, "alignH": "left"
    }));
    let placed = layout(&t, bx(100, 100, 0), &mut Blocks).unwrap();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[1].y, 25);
}

#[test]
fn wrap_without_size_uses_fallback_points() {
    let t = text(serde_json::json!({"string": "x", "wrap": true, "dpi": 72.0}));
    let placed = layout(&t, bx(100, 100, 0), &mut Blocks).unwrap();
    // 1.25 * 12px
    assert_eq!(placed[0].bitmap.height, 15);
}

#[test]
fn auto_fit_fills_box_and_centres() {
    let t = text(serde_json::json!({"string": "Hi", "alignH": "center", "alignV": "center"}));
    let placed = layout(&t, bx(200, 100, 0), &mut Blocks).unwrap();
    assert_eq!(placed.len(), 1);
    let p = &placed[0];
    assert!(p.bitmap.height.abs_diff(100) <= 2, "{}", p.bitmap.height);
    assert!(p.y.abs() <= 1);
    let centre = p.x + i64::from(p.bitmap.width) / 2;
    assert!((centre - 100).abs() <= 1);
    assert_eq!(p.bitmap.pixels[0], Rgba8::BLACK.premul());
}

#[test]
fn auto_fit_without_room_places_nothing() {
    let t = text(serde_json::json!({"string": "Hi", "padX": 60}));
    assert!(layout(&t, bx(100, 100, 0), &mut Blocks).unwrap().is_empty());
}

#[test]
fn font_files_resolve_by_name() {
    let lib = FontLibrary::new("/fonts", "IBMPlexSans-Bold");
    assert_eq!(lib.font_file(None), PathBuf::from("/fonts/IBMPlexSans-Bold.ttf"));
    assert_eq!(lib.font_file(Some("Mono")), PathBuf::from("/fonts/Mono.ttf"));
}

#[test]
fn missing_font_is_a_font_error() {
    let lib = FontLibrary::new(std::env::temp_dir().join("framesmith_no_fonts_here"), "Nope");
    let t = text(serde_json::json!({"string": "Hi"}));
    let err = lib.layout(&t, bx(100, 100, 0)).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Font);
}

#[test]
fn oversized_text_is_cut_to_the_visible_window() {
    let t = text(serde_json::json!({
        "string": "WWWWWWWWWWWWWWWWWWWW", "fontsize": 3000.0, "dpi": 72.0, "alignH": "left"
    }));
    let placed = layout(&t, bx(200, 100, 0), &mut Blocks).unwrap();
    assert_eq!(placed.len(), 1);
    let p = &placed[0];
    assert_eq!((p.x, p.y), (0, 0));
    assert_eq!((p.bitmap.width, p.bitmap.height), (200, 100));
}

#[test]
fn centred_oversized_text_keeps_its_offset_inside_the_window() {
    let t = text(serde_json::json!({
        "string": "abcd", "fontsize": 100.0, "dpi": 72.0, "alignV": "center"
    }));
    // 200px wide text centred in a 100px frame starts at -50.
    let placed = layout(&t, bx(100, 200, 0), &mut Blocks).unwrap();
    let p = &placed[0];
    assert_eq!(p.x, 0);
    assert_eq!(p.bitmap.width, 100);
    assert_eq!(p.y, 38);
    assert_eq!(p.bitmap.height, 125);
}

#[test]
fn window_follows_the_canvas_not_the_frame() {
    let t = text(serde_json::json!({
        "string": "abcd", "fontsize": 20.0, "dpi": 72.0, "alignH": "left"
    }));
    let mut b = bx(30, 30, 0);
    // Frame sits at (10, 10) on a 25x25 canvas.
    b.visible = PixelRect::sized(25, 25).offset(-10, -10);
    let placed = layout(&t, b, &mut Blocks).unwrap();
    let p = &placed[0];
    assert_eq!((p.x, p.y), (0, 0));
    assert_eq!((p.bitmap.width, p.bitmap.height), (15, 15));

    b.visible = PixelRect::sized(25, 25).offset(-100, -100);
    assert!(layout(&t, b, &mut Blocks).unwrap().is_empty());
}

#[test]
fn rectangles_intersect_with_signed_origins() {
    let a = PixelRect {
        x: -5,
        y: 3,
        width: 10,
        height: 10,
    };
    let b = PixelRect::sized(8, 8);
    assert_eq!(
        a.intersect(b),
        Some(PixelRect {
            x: 0,
            y: 3,
            width: 5,
            height: 5
        })
    );
    assert_eq!(a.intersect(b.offset(20, 0)), None);
    assert!(PixelRect::sized(0, 4).is_empty());
}
