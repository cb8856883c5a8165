// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task: accepts socket connections and handles them without
//! blocking anything else — each connection gets its own spawned task,
//! one request in, one response out.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::lifecycle::Engine;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Shared context handed to every connection task.
pub struct ListenCtx {
    pub engine: Engine,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

#[derive(Debug, Error)]
enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Accept connections until the process is torn down. Each connection
    /// is handled on its own task so one slow client can't stall another.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
                                    debug!("client disconnected")
                                }
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("connection timed out")
                                }
                                _ => error!(error = %e, "connection error"),
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept error"),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    if matches!(request, Request::Ping) {
        debug!(?request, "received request");
    } else {
        info!(?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    debug!(?response, "sending response");
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    let engine = &ctx.engine;
    match request {
        Request::Ping => Response::Pong,
        Request::Hello => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },
        Request::CreateLoop {
            agent,
            issue_url,
            repo_root,
            skip_permissions,
        } => match engine.fetch_issue(&issue_url).await {
            Ok(issue) => respond_loop(engine.create_loop(agent, issue, repo_root, skip_permissions).await),
            Err(e) => Response::Error { message: e.to_string() },
        },
        Request::StartLoop { id } => respond_ok(engine.start_loop(&id).await),
        Request::PauseLoop { id } => respond_ok(engine.pause_loop(&id).await),
        Request::ResumeLoop { id } => respond_ok(engine.resume_loop(&id).await),
        Request::ResumePausedLoop { id } => respond_ok(engine.resume_paused_loop(&id).await),
        Request::StopLoop { id } => respond_ok(engine.stop_loop(&id).await),
        Request::RetryLoop { id } => respond_ok(engine.retry_loop(&id).await),
        Request::SendIntervention { id, message } => respond_ok(engine.send_intervention(&id, &message).await),
        Request::DiscardPausedLoop { id } => respond_ok(engine.discard_paused_loop(&id).await),
        Request::MarkOrphanedPausedLoops => match engine.mark_orphaned_paused_loops().await {
            Ok(count) => Response::OrphansMarked { count },
            Err(e) => Response::Error { message: e.to_string() },
        },
        Request::CanResumeInSession { id } => match engine.can_resume_in_session(&id) {
            Ok(can_resume) => Response::CanResume { can_resume },
            Err(e) => Response::Error { message: e.to_string() },
        },
        Request::CloseIssue { id, comment } => {
            match engine.close_issue(&id, comment.as_deref()).await {
                Ok(outcome) => Response::IssueClosed {
                    already_closed: matches!(outcome, loopctl_core::CloseOutcome::AlreadyClosed),
                },
                Err(e) => Response::Error { message: e.to_string() },
            }
        }
        Request::ToggleCriterion { id, n, completed } => respond_loop(engine.toggle_criterion(&id, n, completed).await),
        Request::GetLoop { id } => match engine.get_loop(&id) {
            Ok(loop_) => Response::Loop { loop_ },
            Err(e) => Response::Error { message: e.to_string() },
        },
        Request::ListLoops => match engine.list_loops() {
            Ok(loops) => Response::Loops { loops },
            Err(e) => Response::Error { message: e.to_string() },
        },
        Request::GetLog { id } => match engine.journal().read_all(&id) {
            Ok(entries) => Response::Log { entries },
            Err(e) => Response::Error { message: e.to_string() },
        },
    }
}

fn respond_ok<T>(result: Result<T, loopctl_engine::EngineError>) -> Response {
    match result {
        Ok(_) => Response::Ok,
        Err(e) => Response::Error { message: e.to_string() },
    }
}

fn respond_loop(result: Result<loopctl_core::Loop, loopctl_engine::EngineError>) -> Response {
    match result {
        Ok(loop_) => Response::Loop { loop_ },
        Err(e) => Response::Error { message: e.to_string() },
    }
}
