//! Integration tests for concurrent writers on one branch

use crate::integration::test_utils::lake_with_pool;
use lakelog::commit::NewCommit;
use lakelog::{CancelToken, CommitId, Lake, ObjectStore, Payload, StorageError, Target, MAIN_BRANCH};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

#[test]
fn test_racing_advances_from_same_leaf() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    let registry = lake.registry().clone();
    let store = registry.open_store(&pool).unwrap();
    let leaf = lake.commit_object(&pool, MAIN_BRANCH).unwrap().id;

    const WRITERS: usize = 8;
    let candidates: Vec<CommitId> = (0..WRITERS)
        .map(|i| {
            store
                .put(NewCommit::new(leaf, Payload::new("w", format!("writer {}", i))))
                .unwrap()
        })
        .collect();

    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = candidates
        .into_iter()
        .map(|new| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.advance_branch(&pool, MAIN_BRANCH, leaf, new)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(err) = result {
            match err {
                StorageError::Conflict { actual, expected, .. } => {
                    assert_eq!(*expected, leaf);
                    assert_eq!(*actual, Some(winners[0].commit));
                }
                other => panic!("unexpected error: {}", other),
            }
        }
    }
}

#[test]
fn test_concurrent_commits_lose_nothing_silently() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    let lake = Arc::new(lake);

    const WRITERS: usize = 4;
    const ATTEMPTS: usize = 10;
    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let lake: Arc<Lake> = Arc::clone(&lake);
            thread::spawn(move || {
                let mut applied = 0;
                for i in 0..ATTEMPTS {
                    let payload = Payload::new("w", format!("{}-{}", w, i));
                    match lake.commit(&pool, MAIN_BRANCH, payload, &CancelToken::new()) {
                        Ok(_) => applied += 1,
                        Err(StorageError::Conflict { .. }) => {}
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                applied
            })
        })
        .collect();
    let applied: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Every successful commit is on the branch; conflicted ones are not.
    let history = lake
        .log(
            &pool,
            &Target::Branch(MAIN_BRANCH.to_string()),
            CommitId::NIL,
            CancelToken::new(),
        )
        .unwrap()
        .map(|r| r.unwrap())
        .count();
    assert_eq!(history, applied + 1);
}
