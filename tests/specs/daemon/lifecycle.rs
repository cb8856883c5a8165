use crate::prelude::*;
use tempfile::tempdir;

#[test]
fn daemon_start_boots_the_daemon_and_ping_gets_a_pong() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes().stdout_has("Daemon started");
    assert!(dir.path().join("daemon.sock").exists());
    let out = cli().state_dir(dir.path()).args(&["ping"]).passes();
    out.stdout_has("Pong");
    stop_daemon(dir.path());
}

#[test]
fn list_on_a_freshly_started_daemon_is_empty() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes();
    let out = cli().state_dir(dir.path()).args(&["list"]).passes();
    out.stdout_has("\"loops\": []");
    stop_daemon(dir.path());
}

#[test]
fn get_on_an_unknown_loop_id_reports_not_found() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes();
    let out = cli().state_dir(dir.path()).args(&["get", "does-not-exist"]).passes();
    out.stdout_has("no loop with id");
    stop_daemon(dir.path());
}

#[test]
fn daemon_start_against_an_already_running_daemon_is_a_no_op() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes();
    let out = cli().state_dir(dir.path()).args(&["daemon", "start"]).passes();
    out.stdout_has("already running");
    stop_daemon(dir.path());
}

#[test]
fn daemon_status_reports_not_running_against_a_fresh_state_dir() {
    let dir = tempdir().unwrap();
    let out = cli().state_dir(dir.path()).args(&["daemon", "status"]).passes();
    out.stdout_has("Daemon not running");
}

#[test]
fn daemon_stop_tears_down_the_socket_so_a_later_start_rebinds_cleanly() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes();
    cli().state_dir(dir.path()).args(&["daemon", "stop"]).passes().stdout_has("Daemon stopped");
    assert!(!dir.path().join("daemon.sock").exists());
    cli().state_dir(dir.path()).args(&["daemon", "start"]).passes().stdout_has("Daemon started");
    cli().state_dir(dir.path()).args(&["ping"]).passes().stdout_has("Pong");
    stop_daemon(dir.path());
}

#[test]
fn a_plain_query_never_auto_starts_the_daemon() {
    let dir = tempdir().unwrap();
    cli().state_dir(dir.path()).args(&["ping"]).fails().stderr_has("daemon not running");
}
