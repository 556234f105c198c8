use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "framesmith_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn open_creates_every_tier_dir() {
    let tmp = temp_dir("content_open");
    let store = ContentStore::open(&tmp).unwrap();
    for tier in Tier::all() {
        assert!(store.tier_dir(tier).is_dir(), "{tier}");
    }
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn put_then_read_uses_key_as_filename() {
    let tmp = temp_dir("content_put");
    let store = ContentStore::open(&tmp).unwrap();
    let key = ContentKey::digest(b"payload");

    let path = store.put_bytes(Tier::Full, &key, b"payload").unwrap();
    assert_eq!(path, tmp.join("F").join(key.as_str()));
    assert_eq!(store.read(Tier::Full, &key).unwrap(), b"payload");
    assert_eq!(entries(&store.tier_dir(Tier::Full)), vec![key.to_string()]);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn existing_artifacts_are_never_rewritten() {
    let tmp = temp_dir("content_immutable");
    let store = ContentStore::open(&tmp).unwrap();
    let key = ContentKey::digest(b"first");

    store.put_bytes(Tier::Scaled(3), &key, b"first").unwrap();
    store.put_bytes(Tier::Scaled(3), &key, b"second").unwrap();
    assert_eq!(store.read(Tier::Scaled(3), &key).unwrap(), b"first");

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_artifact_is_not_found() {
    let tmp = temp_dir("content_missing");
    let store = ContentStore::open(&tmp).unwrap();
    let key = ContentKey::digest(b"nothing");
    assert!(!store.contains(Tier::Full, &key));
    assert!(matches!(
        store.read(Tier::Full, &key).unwrap_err(),
        MediaError::NotFound(_)
    ));
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn interrupted_write_leaves_no_final_file_and_no_staging() {
    let tmp = temp_dir("content_interrupt");
    let store = ContentStore::open(&tmp).unwrap();
    let key = ContentKey::digest(b"half");
    let dir = store.tier_dir(Tier::Full);

    {
        let mut staged = StagedFile::create(&dir, key.as_str()).unwrap();
        staged.file_mut().unwrap().write_all(b"ha").unwrap();
        assert_eq!(entries(&dir).len(), 1);
        assert!(entries(&dir)[0].ends_with(".tmp"));
    }

    assert!(!store.contains(Tier::Full, &key));
    assert!(entries(&dir).is_empty());
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn interrupted_overwrite_keeps_previous_complete_file() {
    let tmp = temp_dir("content_interrupt_prev");
    let store = ContentStore::open(&tmp).unwrap();
    let key = ContentKey::digest(b"complete");
    store.put_bytes(Tier::Full, &key, b"complete").unwrap();

    {
        let mut staged = StagedFile::create(&store.tier_dir(Tier::Full), key.as_str()).unwrap();
        staged.file_mut().unwrap().write_all(b"trunc").unwrap();
    }

    assert_eq!(store.read(Tier::Full, &key).unwrap(), b"complete");
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn open_sweeps_stale_staging_files() {
    let tmp = temp_dir("content_sweep");
    let store = ContentStore::open(&tmp).unwrap();
    let stale = store.tier_dir(Tier::Scaled(5)).join("abc.1-1.tmp");
    std::fs::write(&stale, b"junk").unwrap();

    let _reopened = ContentStore::open(&tmp).unwrap();
    assert!(!stale.exists());
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn put_image_writes_decodable_png() {
    let tmp = temp_dir("content_png");
    let store = ContentStore::open(&tmp).unwrap();
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    let key = ContentKey::digest(b"img");

    let path = store.put_image(Tier::Full, &key, &img).unwrap();
    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (3, 2));
    assert_eq!(back.get_pixel(2, 1).0, [10, 20, 30, 255]);
    std::fs::remove_dir_all(&tmp).ok();
}
