//! Integration tests for reference resolution against a HEAD file

use crate::integration::test_utils::lake_with_pool;
use lakelog::{
    CancelToken, Commitish, ErrorKind, Head, HeadFile, HeadStore, LakeError, Payload,
    StorageError, Target, MAIN_BRANCH,
};
use tempfile::TempDir;

#[test]
fn test_resolution_with_head_file() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, logs) = lake_with_pool(temp_dir.path(), "logs");
    let metrics = lake.create_pool("metrics").unwrap().id;
    let root = lake.commit_object(&logs, MAIN_BRANCH).unwrap().id;
    lake.create_branch(&logs, "dev", MAIN_BRANCH).unwrap();
    let dev_leaf = lake
        .commit(&logs, "dev", Payload::new("t", "on dev"), &CancelToken::new())
        .unwrap();

    let head = HeadFile::in_dir(temp_dir.path());
    head.write(&Head::new("logs", "main")).unwrap();
    let resolver = lake.resolver(&head);

    let cases: Vec<(&str, _, _)> = vec![
        ("logs", logs, root),
        ("logs@dev", logs, dev_leaf),
        ("@dev", logs, dev_leaf),
        ("metrics", metrics, lake.commit_object(&metrics, MAIN_BRANCH).unwrap().id),
    ];
    for (reference, pool, commit) in cases {
        let resolved = resolver.resolve_str(reference).unwrap();
        assert_eq!(resolved.pool_id, pool, "{}", reference);
        assert_eq!(resolved.commit, commit, "{}", reference);
    }

    // Headless: a bare commit id of HEAD's pool.
    let resolved = resolver.resolve_str(&dev_leaf.to_string()).unwrap();
    assert_eq!(resolved.target, Target::Commit(dev_leaf));
    assert_eq!(resolved.pool_id, logs);

    // Resolution never writes HEAD.
    assert_eq!(head.read().unwrap(), Head::new("logs", "main"));
}

#[test]
fn test_resolution_errors() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, _) = lake_with_pool(temp_dir.path(), "logs");
    let head = HeadFile::in_dir(temp_dir.path());
    let resolver = lake.resolver(&head);

    assert!(matches!(
        resolver.resolve_str("@dev"),
        Err(LakeError::NoDefaultPool)
    ));
    assert!(matches!(
        resolver.resolve_args(&[]),
        Err(LakeError::HeadUnset)
    ));
    assert!(matches!(
        resolver.resolve_args(&["a".to_string(), "b".to_string()]),
        Err(LakeError::TooManyArguments)
    ));

    let err = resolver.resolve_str("logs@missing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.status_code(), 404);

    let err = resolver.resolve_str("logs@").unwrap_err();
    assert_eq!(err.status_code(), 400);

    assert!(matches!(
        resolver.resolve_str("ghost"),
        Err(LakeError::Storage(StorageError::PoolNotFound(_)))
    ));
}

#[test]
fn test_resolved_head_names_commitish_as_written() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, logs) = lake_with_pool(temp_dir.path(), "logs");
    let head = HeadFile::in_dir(temp_dir.path());
    let resolver = lake.resolver(&head);

    // Referring to the pool by id keeps the id in HEAD.
    let by_id = logs.to_string();
    let resolved = resolver.resolve(&Commitish::parse(&by_id).unwrap()).unwrap();
    assert_eq!(resolved.head(), Head::new(by_id, MAIN_BRANCH));
}
