use anim_cache_engine::DiskStore;

#[tokio::test]
async fn test_publish_then_lookup_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::new(dir.path()).unwrap();

    let key = "http://example.com/a.mp4";
    assert!(!store.exists(key));
    assert!(store.lookup(key).is_none());

    let path = store.write_and_publish(key, b"animation bytes").await.unwrap();
    assert!(path.is_file());
    assert!(store.exists(key));
    assert_eq!(store.lookup(key).unwrap(), path);
    assert_eq!(std::fs::read(&path).unwrap(), b"animation bytes");
}

#[tokio::test]
async fn test_distinct_keys_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::new(dir.path()).unwrap();

    let a = store.write_and_publish("key_a", b"aaa").await.unwrap();
    let b = store.write_and_publish("key_b", b"bbb").await.unwrap();
    assert_ne!(a, b);
    assert_eq!(std::fs::read(&a).unwrap(), b"aaa");
    assert_eq!(std::fs::read(&b).unwrap(), b"bbb");
}

#[tokio::test]
async fn test_in_progress_temp_file_is_not_visible() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::new(dir.path()).unwrap();

    // Simulate a write that has not been published yet.
    std::fs::write(dir.path().join("k.temp.mp4"), b"partial").unwrap();
    assert!(!store.exists("k"));
    assert!(store.lookup("k").is_none());
}

#[tokio::test]
async fn test_republish_same_key_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::new(dir.path()).unwrap();

    store.write_and_publish("k", b"old").await.unwrap();
    let path = store.write_and_publish("k", b"new").await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"new");
}

#[tokio::test]
async fn test_clear_removes_published_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskStore::new(dir.path()).unwrap();

    store.write_and_publish("k1", b"1").await.unwrap();
    store.write_and_publish("k2", b"2").await.unwrap();
    store.clear().unwrap();

    assert!(!store.exists("k1"));
    assert!(!store.exists("k2"));
}
