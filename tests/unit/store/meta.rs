use super::*;

fn temp_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "framesmith_meta_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::write(&path, bytes).unwrap();
    path
}

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([1, 2, 3, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn meta(w: u32) -> ArtifactMeta {
    ArtifactMeta {
        width: w,
        height: 1,
        mime: "image/png".to_string(),
    }
}

#[test]
fn probe_reads_png_header() {
    let path = temp_file("png", &png_bytes(7, 5));
    let m = probe_file(&path).unwrap();
    assert_eq!(m.width, 7);
    assert_eq!(m.height, 5);
    assert_eq!(m.mime, "image/png");
    std::fs::remove_file(&path).ok();
}

#[test]
fn probe_of_garbage_falls_back_to_png() {
    let path = temp_file("garbage", b"definitely not an image");
    let m = probe_file(&path).unwrap();
    assert_eq!(m, ArtifactMeta {
        width: 0,
        height: 0,
        mime: FALLBACK_MIME.to_string(),
    });
    std::fs::remove_file(&path).ok();
}

#[test]
fn probe_of_missing_file_is_not_found() {
    let path = std::env::temp_dir().join("framesmith_meta_definitely_missing_file");
    assert!(matches!(
        probe_file(&path).unwrap_err(),
        MediaError::NotFound(_)
    ));
}

#[test]
fn cache_evicts_least_recently_used() {
    let cache = MetadataCache::new(NonZeroUsize::new(2).unwrap());
    let a = ContentKey::digest(b"a");
    let b = ContentKey::digest(b"b");
    let c = ContentKey::digest(b"c");

    cache.insert(a.clone(), meta(1));
    cache.insert(b.clone(), meta(2));
    assert_eq!(cache.get(&a), Some(meta(1)));
    cache.insert(c.clone(), meta(3));

    assert_eq!(cache.len(), 2);
    assert!(cache.contains(&a));
    assert!(!cache.contains(&b));
    assert_eq!(cache.get(&c), Some(meta(3)));
}
