use super::*;

#[test]
fn digest_matches_known_md5() {
    assert_eq!(
        ContentKey::digest(b"").as_str(),
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    assert_eq!(
        ContentKey::digest(b"abc").as_str(),
        "900150983cd24fb0d6963f7d28e17f72"
    );
}

#[test]
fn digest_is_stable_and_streaming_agrees() {
    let a = ContentKey::digest(b"hello world");
    let b = ContentKey::digest(b"hello world");
    assert_eq!(a, b);

    let mut h = ContentHasher::new();
    h.update(b"hello ");
    h.update(b"world");
    assert_eq!(h.finish(), a);
}

#[test]
fn parse_normalizes_case_and_rejects_garbage() {
    let k = ContentKey::parse("900150983CD24FB0D6963F7D28E17F72").unwrap();
    assert_eq!(k.as_str(), "900150983cd24fb0d6963f7d28e17f72");

    assert!(ContentKey::parse("../../etc/passwd").is_err());
    assert!(ContentKey::parse("abc").is_err());
    assert!(ContentKey::parse("zz0150983cd24fb0d6963f7d28e17f72").is_err());
}

#[test]
fn colour_from_three_and_four_components() {
    let c: Rgba8 = serde_json::from_str("[255, 0, 0]").unwrap();
    assert_eq!(c, Rgba8::new(255, 0, 0, 255));

    let c: Rgba8 = serde_json::from_str("[1, 2, 3, 4]").unwrap();
    assert_eq!(c, Rgba8::new(1, 2, 3, 4));
}

#[test]
fn colour_malformed_falls_back_to_black_and_clamps() {
    let c: Rgba8 = serde_json::from_str("[9]").unwrap();
    assert_eq!(c, Rgba8::BLACK);

    let c: Rgba8 = serde_json::from_str("[300, -5, 10]").unwrap();
    assert_eq!(c, Rgba8::new(255, 0, 10, 255));
}

#[test]
fn premul_scales_rgb_by_alpha() {
    assert_eq!(Rgba8::new(255, 0, 0, 255).premul(), [255, 0, 0, 255]);
    assert_eq!(Rgba8::new(200, 100, 50, 0).premul(), [0, 0, 0, 0]);
    assert_eq!(Rgba8::new(255, 255, 255, 128).premul(), [128, 128, 128, 128]);
}
