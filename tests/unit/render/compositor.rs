use super::*;

use crate::foundation::core::ContentKey;
use crate::model::frame::TextSpec;
use crate::text::{GlyphBitmap, PlacedBitmap};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "framesmith_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Places one opaque 2x2 block at (1, 1) in the text colour.
struct Stamp;

impl GlyphSource for Stamp {
    fn layout(&self, text: &TextSpec, _bx: TextBox) -> MediaResult<Vec<PlacedBitmap>> {
        Ok(vec![PlacedBitmap {
            bitmap: GlyphBitmap {
                width: 2,
                height: 2,
                pixels: vec![text.text_color().premul(); 4],
            },
            x: 1,
            y: 1,
        }])
    }
}

fn spec(v: serde_json::Value) -> FrameSpec {
    serde_json::from_value(v).unwrap()
}

fn render(store: &ContentStore, v: serde_json::Value) -> MediaResult<RgbaImage> {
    Compositor::new(store, &Stamp).render(&spec(v))
}

fn with_store(name: &str, f: impl FnOnce(&ContentStore)) {
    let dir = temp_dir(name);
    let store = ContentStore::open(&dir).unwrap();
    f(&store);
    std::fs::remove_dir_all(&dir).ok();
}

const CLEAR: [u8; 4] = [0, 0, 0, 0];

#[test]
fn solid_background_fills_exact_canvas() {
    with_store("comp_solid", |store| {
        let img = render(
            store,
            serde_json::json!({"width": 200, "height": 100, "background": [255, 0, 0, 255]}),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (200, 100));
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    });
}

#[test]
fn missing_background_leaves_transparent() {
    with_store("comp_clear", |store| {
        let img = render(store, serde_json::json!({"width": 3, "height": 3})).unwrap();
        assert!(img.pixels().all(|p| p.0 == CLEAR));
    });
}

#[test]
fn overflowing_children_are_cropped() {
    with_store("comp_crop", |store| {
        let img = render(
            store,
            serde_json::json!({
                "width": 10, "height": 10,
                "sub": [{"x": 8, "y": 8, "width": 10, "height": 10, "background": [0, 0, 255]}]
            }),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(9, 9).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(7, 7).0, CLEAR);
    });
}

#[test]
fn root_offset_shifts_root_content() {
    with_store("comp_root_offset", |store| {
        let img = render(
            store,
            serde_json::json!({"width": 4, "height": 1, "x": 2, "background": [0, 255, 0]}),
        )
        .unwrap();
        assert_eq!(img.get_pixel(1, 0).0, CLEAR);
        assert_eq!(img.get_pixel(2, 0).0, [0, 255, 0, 255]);
    });
}

#[test]
fn child_origins_accumulate() {
    with_store("comp_nested", |store| {
        let img = render(
            store,
            serde_json::json!({
                "width": 10, "height": 10,
                "sub": [{
                    "x": 5, "y": 5, "width": 4, "height": 4,
                    "sub": [{"x": 2, "y": 2, "width": 1, "height": 1, "background": [0, 255, 0]}]
                }]
            }),
        )
        .unwrap();
        assert_eq!(img.get_pixel(7, 7).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, CLEAR);
    });
}

#[test]
fn border_draws_frame_inside_bounds() {
    with_store("comp_border", |store| {
        let img = render(
            store,
            serde_json::json!({"width": 10, "height": 10, "thickness": 2, "color": [255, 0, 0]}),
        )
        .unwrap();
        let red = [255, 0, 0, 255];
        assert_eq!(img.get_pixel(0, 0).0, red);
        assert_eq!(img.get_pixel(5, 1).0, red);
        assert_eq!(img.get_pixel(5, 8).0, red);
        assert_eq!(img.get_pixel(1, 5).0, red);
        assert_eq!(img.get_pixel(9, 5).0, red);
        assert_eq!(img.get_pixel(5, 5).0, CLEAR);
        assert_eq!(img.get_pixel(2, 2).0, CLEAR);
    });
}

#[test]
fn translucent_border_does_not_double_blend_corners() {
    with_store("comp_border_alpha", |store| {
        let img = render(
            store,
            serde_json::json!({"width": 6, "height": 6, "thickness": 1, "color": [0, 0, 0, 128]}),
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0).0[3], 128);
        assert_eq!(img.get_pixel(0, 3).0[3], 128);
    });
}

#[test]
fn background_image_is_stretched_nearest() {
    with_store("comp_bgimage", |store| {
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
        let key = ContentKey::digest(b"bg");
        store.put_image(Tier::Full, &key, &src).unwrap();

        let img = render(
            store,
            serde_json::json!({"width": 4, "height": 2, "bgimage": key.as_str()}),
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 0).0, [0, 0, 255, 255]);
        assert_eq!(img.get_pixel(3, 1).0, [0, 0, 255, 255]);
    });
}

#[test]
fn unknown_background_image_is_skipped() {
    with_store("comp_bg_missing", |store| {
        let key = ContentKey::digest(b"never stored");
        let img = render(
            store,
            serde_json::json!({
                "width": 2, "height": 2, "background": [1, 2, 3], "bgimage": key.as_str()
            }),
        )
        .unwrap();
        assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    });
}

#[test]
fn corrupt_background_image_is_render_error() {
    with_store("comp_bg_corrupt", |store| {
        let key = ContentKey::digest(b"corrupt");
        store.put_bytes(Tier::Full, &key, b"no pixels here").unwrap();
        let err = render(
            store,
            serde_json::json!({"width": 2, "height": 2, "bgimage": key.as_str()}),
        )
        .unwrap_err();
        assert!(matches!(err, MediaError::Render(_)));
    });
}

#[test]
fn text_lands_relative_to_node_and_children_paint_over_it() {
    with_store("comp_text", |store| {
        let img = render(
            store,
            serde_json::json!({
                "width": 10, "height": 10,
                "sub": [
                    {"x": 3, "y": 3, "width": 5, "height": 5,
                     "text": {"string": "x", "fontcolor": [0, 255, 0]}},
                    {"x": 5, "y": 5, "width": 1, "height": 1, "background": [255, 0, 0]}
                ]
            }),
        )
        .unwrap();
        assert_eq!(img.get_pixel(4, 4).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(5, 4).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(6, 6).0, CLEAR);
    });
}

/// Remembers every box it was asked to lay out in.
#[derive(Default)]
struct Boxes(std::sync::Mutex<Vec<TextBox>>);

impl GlyphSource for Boxes {
    fn layout(&self, _text: &TextSpec, bx: TextBox) -> MediaResult<Vec<PlacedBitmap>> {
        self.0.lock().unwrap().push(bx);
        Ok(Vec::new())
    }
}

#[test]
fn text_sees_the_canvas_relative_to_its_frame() {
    with_store("comp_visible", |store| {
        let boxes = Boxes::default();
        let frame = spec(serde_json::json!({
            "width": 100, "height": 50,
            "sub": [{"width": 40, "height": 30, "x": 70, "y": -5, "thickness": 2,
                     "text": {"string": "x"}}]
        }));
        Compositor::new(store, &boxes).render(&frame).unwrap();

        let seen = boxes.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].width, seen[0].height, seen[0].inset), (40, 30, 2));
        assert_eq!(
            seen[0].visible,
            PixelRect {
                x: -70,
                y: 5,
                width: 100,
                height: 50
            }
        );
    });
}
