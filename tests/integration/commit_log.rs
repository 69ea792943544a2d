//! Integration tests for the commit log: append-only storage and history reads

use crate::integration::test_utils::{commit_n, lake_with_pool};
use lakelog::commit::{RecordFormat, RecordWriter};
use lakelog::registry::ROOT_MESSAGE;
use lakelog::{CancelToken, CommitId, ObjectStore, StorageError, Target, MAIN_BRANCH};
use tempfile::TempDir;

fn main_branch() -> Target {
    Target::Branch(MAIN_BRANCH.to_string())
}

#[test]
fn test_history_is_newest_first_and_ends_at_root() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    let mut expected = commit_n(&lake, &pool, 5);
    expected.push(ROOT_MESSAGE.to_string());

    let messages: Vec<String> = lake
        .log(&pool, &main_branch(), CommitId::NIL, CancelToken::new())
        .unwrap()
        .map(|r| r.unwrap().message)
        .collect();
    assert_eq!(messages, expected);
}

#[test]
fn test_ids_grow_along_the_chain() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    commit_n(&lake, &pool, 4);

    let ids: Vec<CommitId> = lake
        .log(&pool, &main_branch(), CommitId::NIL, CancelToken::new())
        .unwrap()
        .map(|r| r.unwrap().id)
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn test_existing_bytes_never_change() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    commit_n(&lake, &pool, 1);
    let store = lake.registry().open_store(&pool).unwrap();
    let leaf = lake.commit_object(&pool, MAIN_BRANCH).unwrap().id;
    let (before, _) = store.get_bytes(&leaf).unwrap();

    commit_n(&lake, &pool, 3);
    let (after, _) = store.get_bytes(&leaf).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_stop_excludes_boundary() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    commit_n(&lake, &pool, 4);
    let all: Vec<CommitId> = lake
        .log(&pool, &main_branch(), CommitId::NIL, CancelToken::new())
        .unwrap()
        .map(|r| r.unwrap().id)
        .collect();

    let stop = all[2];
    let since: Vec<CommitId> = lake
        .log(&pool, &main_branch(), stop, CancelToken::new())
        .unwrap()
        .map(|r| r.unwrap().id)
        .collect();
    assert_eq!(since, all[..2].to_vec());
    assert!(!since.contains(&stop));
}

#[test]
fn test_unknown_commit_target() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    let ghost = lakelog::IdGenerator::new().commit_id();
    let mut reader = lake
        .log(&pool, &Target::Commit(ghost), CommitId::NIL, CancelToken::new())
        .unwrap();
    assert!(matches!(
        reader.next(),
        Some(Err(StorageError::CommitNotFound(_)))
    ));
    assert!(reader.next().is_none());
}

#[test]
fn test_streamed_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let (lake, pool) = lake_with_pool(temp_dir.path(), "logs");
    commit_n(&lake, &pool, 2);

    let mut writer = RecordWriter::new(Vec::new(), RecordFormat::Json);
    for record in lake
        .log(&pool, &main_branch(), CommitId::NIL, CancelToken::new())
        .unwrap()
    {
        writer.write(&record.unwrap()).unwrap();
    }
    let out = String::from_utf8(writer.into_inner()).unwrap();
    let values: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["parent"], values[1]["id"]);
    assert!(values[2]["parent"].is_null());
}
