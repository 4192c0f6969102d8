use admissions_core::submission::ObjectStorage;
use admissions_storage::{LocalObjectStorage, MemoryObjectStorage};

#[tokio::test]
async fn local_upload_writes_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalObjectStorage::new(dir.path().join("uploads"), "http://h/uploads".into())
        .await
        .unwrap();

    let path = storage
        .upload("photos/1/photo-1.png", b"first", "image/png")
        .await
        .unwrap();
    assert_eq!(path, "photos/1/photo-1.png");
    storage
        .upload("photos/1/photo-1.png", b"second", "image/png")
        .await
        .unwrap();

    let on_disk = std::fs::read(dir.path().join("uploads/photos/1/photo-1.png")).unwrap();
    assert_eq!(on_disk, b"second");
    assert_eq!(
        storage.public_url(&path),
        "http://h/uploads/photos/1/photo-1.png"
    );
}

#[tokio::test]
async fn local_upload_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalObjectStorage::new(dir.path().to_path_buf(), "http://h".into())
        .await
        .unwrap();
    let err = storage
        .upload("../escape.png", b"x", "image/png")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid object path"));
    assert!(!dir.path().parent().unwrap().join("escape.png").exists());
}

#[tokio::test]
async fn memory_upload_keeps_content_type() {
    let storage = MemoryObjectStorage::new("https://cdn.test/");
    storage
        .upload("signatures/3/signature-5.png", &[1, 2, 3], "image/png")
        .await
        .unwrap();
    let stored = storage.get("signatures/3/signature-5.png").unwrap();
    assert_eq!(stored.bytes, vec![1, 2, 3]);
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(storage.paths(), vec!["signatures/3/signature-5.png".to_string()]);
    assert_eq!(
        storage.public_url("signatures/3/signature-5.png"),
        "https://cdn.test/signatures/3/signature-5.png"
    );
}
