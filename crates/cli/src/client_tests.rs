// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn timeout_helpers_fall_back_to_defaults_when_unset() {
    for var in [
        "LOOPCTL_TIMEOUT_IPC_MS",
        "LOOPCTL_TIMEOUT_CONNECT_MS",
        "LOOPCTL_TIMEOUT_EXIT_MS",
        "LOOPCTL_CONNECT_POLL_MS",
    ] {
        std::env::remove_var(var);
    }
    assert_eq!(timeout_ipc(), Duration::from_secs(5));
    assert_eq!(timeout_connect(), Duration::from_secs(5));
    assert_eq!(timeout_exit(), Duration::from_secs(2));
    assert_eq!(poll_interval(), Duration::from_millis(50));
}

#[test]
#[serial]
fn timeout_helpers_honor_env_overrides() {
    std::env::set_var("LOOPCTL_TIMEOUT_IPC_MS", "1234");
    assert_eq!(timeout_ipc(), Duration::from_millis(1234));
    std::env::remove_var("LOOPCTL_TIMEOUT_IPC_MS");
}

#[test]
fn connect_fails_fast_when_no_socket_exists() {
    std::env::set_var("LOOPCTL_STATE_DIR", "/nonexistent/loopctl-state-dir-for-tests");
    let result = DaemonClient::connect();
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));
    std::env::remove_var("LOOPCTL_STATE_DIR");
}
