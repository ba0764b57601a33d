use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "strata_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_rel_path_cleans_separators() {
    assert_eq!(normalize_rel_path("a/./b//c.png").unwrap(), "a/b/c.png");
    assert_eq!(normalize_rel_path("layers\\0.png").unwrap(), "layers/0.png");
}

#[test]
fn normalize_rel_path_rejects_escapes() {
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("C:/x.png").is_err());
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn save_then_load() {
    let root = temp_dir("store_save_load");
    let store = LayerImageStore::new(&root);
    let buf = PixelBuffer::from_rgba8(1, 2, &[9, 8, 7, 6, 5, 4, 3, 2]).unwrap();
    store.save("layers/a.png", &buf).unwrap();
    assert!(root.join("layers").join("a.png").exists());
    assert_eq!(store.load("layers/a.png").unwrap(), buf);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_and_corrupt_files() {
    let root = temp_dir("store_missing");
    std::fs::create_dir_all(&root).unwrap();
    let store = LayerImageStore::new(&root);
    assert!(matches!(store.load("nope.png"), Err(StrataError::Other(_))));

    std::fs::write(root.join("bad.png"), b"junk").unwrap();
    assert!(matches!(
        store.load("bad.png"),
        Err(StrataError::MalformedLayerImage(_))
    ));
    let _ = std::fs::remove_dir_all(&root);
}
