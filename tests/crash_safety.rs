use keystash::{Error, FixedResolver, Store, WriteMode};
use serde_json::json;

fn store_at(path: &std::path::Path, mode: WriteMode) -> Store<FixedResolver> {
    Store::builder()
        .resolver(FixedResolver(path.to_path_buf()))
        .write_mode(mode)
        .build()
        .unwrap()
}

#[test]
fn corrupt_file_fails_get_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, b"{\"truncated\": [1, 2").unwrap();
    let store = store_at(&path, WriteMode::Atomic);

    match store.get(Some("truncated"), None).unwrap_err() {
        Error::Deserialize(msg) => assert!(msg.contains("corrupt.json")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        store.set("x", json!(1), None).unwrap_err(),
        Error::Deserialize(_)
    ));
    // the bad file is left alone for inspection
    assert_eq!(std::fs::read(&path).unwrap(), b"{\"truncated\": [1, 2");
}

#[test]
fn non_object_document_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.json");
    std::fs::write(&path, b"[\"a\", \"b\"]").unwrap();
    let store = store_at(&path, WriteMode::Atomic);
    assert!(matches!(
        store.keys(None).unwrap_err(),
        Error::Deserialize(_)
    ));
}

#[test]
fn zero_byte_file_is_corrupt_not_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let store = store_at(&path, WriteMode::Direct);
    store.set("secret", json!("hunter2"), None).unwrap();

    // an in-place write that died right after truncating
    std::fs::File::create(&path).unwrap();

    match store.keys(None).unwrap_err() {
        Error::Deserialize(msg) => assert!(msg.contains("s.json")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        store.set("other", json!(1), None).unwrap_err(),
        Error::Deserialize(_)
    ));
    // the next set must not have papered over the damage
    assert_eq!(std::fs::read(&path).unwrap(), b"");
}

#[test]
fn leftover_tmp_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let store = store_at(&path, WriteMode::Atomic);
    store.set("good", json!(1), None).unwrap();

    // simulate a crash that left a half-written temp file behind
    std::fs::write(dir.path().join("s.json.tmp"), b"{\"good\": ").unwrap();
    assert_eq!(store.get_value("good", None).unwrap(), Some(json!(1)));

    store.set("next", json!(2), None).unwrap();
    assert!(!dir.path().join("s.json.tmp").exists());
    assert_eq!(store.keys(None).unwrap(), vec!["good", "next"]);
}

#[test]
fn write_into_missing_directory_fails_without_creating_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("s.json");
    for mode in [WriteMode::Atomic, WriteMode::Direct] {
        let store = store_at(&path, mode);
        assert!(matches!(
            store.set("k", json!(1), None).unwrap_err(),
            Error::Io(_)
        ));
    }
    assert!(!dir.path().join("nope").exists());
}

#[cfg(unix)]
#[test]
fn read_only_directory_is_write_failure() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("ro");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

    let path = locked.join("s.json");
    let probe = std::fs::File::create(locked.join("probe"));
    if probe.is_ok() {
        // running as root: permissions are not enforced
        let _ = std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755));
        return;
    }
    let store = store_at(&path, WriteMode::Atomic);
    assert!(matches!(
        store.set("k", json!(1), None).unwrap_err(),
        Error::Io(_)
    ));
    let _ = std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755));
}

#[cfg(unix)]
#[test]
fn atomic_set_keeps_restricted_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creds.json");
    let store = store_at(&path, WriteMode::Atomic);
    store.set("a", json!(1), None).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();

    store.set("b", json!(2), None).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    assert_eq!(store.keys(None).unwrap(), vec!["a", "b"]);
}

#[cfg(unix)]
#[test]
fn atomic_set_through_symlink_updates_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("real.json");
    let link = dir.path().join("link.json");

    let real_store = store_at(&real, WriteMode::Atomic);
    real_store.set("a", json!(1), None).unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let via_link = store_at(&link, WriteMode::Atomic);
    via_link.set("b", json!(2), None).unwrap();

    let meta = std::fs::symlink_metadata(&link).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(real_store.keys(None).unwrap(), vec!["a", "b"]);
    assert_eq!(via_link.keys(None).unwrap(), vec!["a", "b"]);
}

#[cfg(unix)]
#[test]
fn unreadable_parent_on_get_is_io_not_missing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let sealed = dir.path().join("sealed");
    std::fs::create_dir(&sealed).unwrap();
    let path = sealed.join("s.json");
    let store = store_at(&path, WriteMode::Atomic);
    store.set("k", json!(1), None).unwrap();
    std::fs::set_permissions(&sealed, std::fs::Permissions::from_mode(0o000)).unwrap();

    if std::fs::metadata(&path).is_ok() {
        // running as root: permissions are not enforced
        let _ = std::fs::set_permissions(&sealed, std::fs::Permissions::from_mode(0o755));
        return;
    }
    let err = store.get(Some("k"), None).unwrap_err();
    let _ = std::fs::set_permissions(&sealed, std::fs::Permissions::from_mode(0o755));
    assert!(matches!(err, Error::Io(_)), "got {err:?}");
}
