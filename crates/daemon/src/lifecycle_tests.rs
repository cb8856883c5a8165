// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        state_dir: dir.to_path_buf(),
        socket_path: dir.join("daemon.sock"),
        lock_path: dir.join("daemon.pid"),
        version_path: dir.join("daemon.version"),
        log_path: dir.join("daemon.log"),
    }
}

#[tokio::test]
async fn startup_binds_the_socket_and_writes_lock_and_version_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    assert!(config.lock_path.exists());
    assert!(config.version_path.exists());
    assert!(config.socket_path.exists());

    result.daemon.shutdown().unwrap();
    drop(result.listener);
    assert!(!config.socket_path.exists());
}

#[tokio::test]
async fn a_second_startup_against_the_same_state_dir_fails_to_lock() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let first = startup(&config).await.unwrap();
    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    // The first daemon's files must survive the second's failed attempt.
    assert!(config.lock_path.exists());

    first.daemon.shutdown().unwrap();
    drop(first.listener);
}

#[tokio::test]
async fn startup_cleans_up_partial_state_on_a_non_lock_failure() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    // An unwritable socket path (parent dir missing) forces a bind failure
    // after the lock and version file are already written.
    config.socket_path = dir.path().join("missing-parent").join("daemon.sock");

    let result = startup(&config).await;
    assert!(matches!(result, Err(LifecycleError::BindFailed(_, _))));
    assert!(!config.version_path.exists());
}
