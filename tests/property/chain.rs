//! Property-based tests for commit chain traversal

use lakelog::{CancelToken, CommitId, Lake, Payload, Target, MAIN_BRANCH};
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use tempfile::TempDir;

fn history(lake: &Lake, pool: &lakelog::PoolId, stop: CommitId) -> Vec<CommitId> {
    lake.log(
        pool,
        &Target::Branch(MAIN_BRANCH.to_string()),
        stop,
        CancelToken::new(),
    )
    .unwrap()
    .map(|r| r.unwrap().id)
    .collect()
}

/// Any chain terminates at the root, newest first, and a stop commit is excluded.
#[test]
fn test_chain_terminates_and_stop_is_exclusive() {
    let mut runner = TestRunner::new(Config::with_cases(16));

    runner
        .run(&(0usize..12, any::<prop::sample::Index>()), |(n, pick)| {
            let temp_dir = TempDir::new().unwrap();
            let lake = Lake::init(&temp_dir.path().join("lake")).unwrap();
            let pool = lake.create_pool("logs").unwrap().id;
            let cancel = CancelToken::new();
            for i in 0..n {
                lake.commit(&pool, MAIN_BRANCH, Payload::new("p", format!("{}", i)), &cancel)
                    .unwrap();
            }

            let all = history(&lake, &pool, CommitId::NIL);
            prop_assert_eq!(all.len(), n + 1);
            prop_assert!(all.windows(2).all(|pair| pair[0] > pair[1]));

            let k = pick.index(all.len());
            let since = history(&lake, &pool, all[k]);
            prop_assert_eq!(&since[..], &all[..k]);

            Ok(())
        })
        .unwrap();
}
