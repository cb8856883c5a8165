// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::FakeAdapter;
use std::time::Duration;

fn sh(script: &str) -> LaunchSpec {
    LaunchSpec {
        cmd: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
    }
}

async fn drain_until_exit(rx: &mut mpsc::Receiver<SupervisorEvent>) -> Vec<SupervisorEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let is_exit = matches!(event, SupervisorEvent::Exit { .. });
        events.push(event);
        if is_exit {
            break;
        }
    }
    events
}

#[tokio::test]
async fn spawned_process_reports_its_exit_code() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let mut rx = supervisor
        .spawn("loop-1", sh("exit 7"), Path::new("."), adapter)
        .expect("spawn succeeds");

    let events = drain_until_exit(&mut rx).await;
    assert_eq!(events.last(), Some(&SupervisorEvent::Exit { code: Some(7) }));
    supervisor.reap("loop-1");
}

#[tokio::test]
async fn stdout_is_routed_through_the_parser() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let mut rx = supervisor
        .spawn("loop-2", sh("echo hello"), Path::new("."), adapter)
        .expect("spawn succeeds");

    let events = drain_until_exit(&mut rx).await;
    assert!(events.iter().any(|e| matches!(
        e,
        SupervisorEvent::Parsed(ParserEvent::Text(text)) if text.trim_end() == "hello"
    )));
    supervisor.reap("loop-2");
}

#[tokio::test]
async fn refuses_a_second_spawn_for_the_same_loop_id() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let _rx = supervisor
        .spawn("loop-3", sh("sleep 5"), Path::new("."), adapter.clone())
        .expect("first spawn succeeds");

    let err = supervisor
        .spawn("loop-3", sh("sleep 5"), Path::new("."), adapter)
        .expect_err("second spawn for the same loop id must be refused");
    assert!(matches!(err, SupervisorError::AlreadyRunning(id) if id == "loop-3"));

    supervisor.stop("loop-3").await.expect("stop succeeds");
    supervisor.reap("loop-3");
}

#[tokio::test]
async fn intervene_writes_a_line_to_child_stdin() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let mut rx = supervisor
        .spawn(
            "loop-4",
            LaunchSpec {
                cmd: "cat".to_string(),
                args: vec![],
            },
            Path::new("."),
            adapter,
        )
        .expect("spawn succeeds");

    supervisor
        .intervene("loop-4", "ping")
        .await
        .expect("intervene succeeds while the process is alive");

    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event arrives before timeout")
        .expect("channel stays open");
    assert_eq!(
        event,
        SupervisorEvent::Parsed(ParserEvent::Text("ping\n".to_string()))
    );

    supervisor.stop("loop-4").await.expect("stop succeeds");
    drain_until_exit(&mut rx).await;
    supervisor.reap("loop-4");
}

#[tokio::test]
async fn intervene_on_an_unknown_loop_is_an_error() {
    let supervisor = ProcessSupervisor::new();
    let err = supervisor
        .intervene("no-such-loop", "hi")
        .await
        .expect_err("no process is attached");
    assert!(matches!(err, SupervisorError::NotRunning(id) if id == "no-such-loop"));
}

#[tokio::test]
async fn stop_terminates_the_child_and_marks_it_operator_stopped() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let mut rx = supervisor
        .spawn("loop-5", sh("sleep 30"), Path::new("."), adapter)
        .expect("spawn succeeds");

    supervisor.stop("loop-5").await.expect("stop succeeds");
    assert!(supervisor.was_stopped("loop-5"));

    let events = drain_until_exit(&mut rx).await;
    assert!(matches!(events.last(), Some(SupervisorEvent::Exit { .. })));
    supervisor.reap("loop-5");
    assert!(!supervisor.has_live_process("loop-5"));
}

#[tokio::test]
async fn pause_and_resume_do_not_error_on_a_live_process() {
    let supervisor = ProcessSupervisor::new();
    let adapter: Arc<dyn AgentAdapter> = Arc::new(FakeAdapter::new("fake"));
    let mut rx = supervisor
        .spawn("loop-6", sh("sleep 5"), Path::new("."), adapter)
        .expect("spawn succeeds");

    supervisor.pause("loop-6").expect("pause succeeds");
    supervisor.resume("loop-6").expect("resume succeeds");

    supervisor.stop("loop-6").await.expect("stop succeeds");
    drain_until_exit(&mut rx).await;
    supervisor.reap("loop-6");
}

#[tokio::test]
async fn signalling_an_unknown_loop_is_an_error() {
    let supervisor = ProcessSupervisor::new();
    assert!(matches!(
        supervisor.pause("no-such-loop"),
        Err(SupervisorError::NotRunning(_))
    ));
    assert!(matches!(
        supervisor.resume("no-such-loop"),
        Err(SupervisorError::NotRunning(_))
    ));
}
