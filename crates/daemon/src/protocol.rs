// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format encoding/decoding for the operator IPC protocol.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Protocol (transport-level) errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

/// Maximum message size (16 MiB — a log-heavy response is still orders of
/// magnitude smaller than this).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default IPC timeout for one request/response round trip.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Protocol version, surfaced over `Hello` so a CLI built against a
/// different daemon version notices.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One operator command. Each variant either mutates the engine's state
/// (emitting an event on success) or reports a typed error — see
/// [`Response::Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Ping,
    Hello,
    CreateLoop {
        agent: String,
        issue_url: String,
        repo_root: PathBuf,
        skip_permissions: bool,
    },
    StartLoop {
        id: String,
    },
    PauseLoop {
        id: String,
    },
    ResumeLoop {
        id: String,
    },
    ResumePausedLoop {
        id: String,
    },
    StopLoop {
        id: String,
    },
    RetryLoop {
        id: String,
    },
    SendIntervention {
        id: String,
        message: String,
    },
    DiscardPausedLoop {
        id: String,
    },
    MarkOrphanedPausedLoops,
    CanResumeInSession {
        id: String,
    },
    CloseIssue {
        id: String,
        comment: Option<String>,
    },
    ToggleCriterion {
        id: String,
        n: usize,
        completed: bool,
    },
    GetLoop {
        id: String,
    },
    ListLoops,
    GetLog {
        id: String,
    },
}

/// A loop as rendered over the wire — the engine's `Loop` record is reused
/// directly since it is already `Serialize`/`Deserialize`.
pub type LoopView = loopctl_core::Loop;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Response {
    Pong,
    Hello { version: String },
    Ok,
    Loop { loop_: LoopView },
    Loops { loops: Vec<LoopView> },
    Log { entries: Vec<loopctl_core::LogEntry> },
    CanResume { can_resume: bool },
    OrphansMarked { count: usize },
    IssueClosed { already_closed: bool },
    Error { message: String },
}

/// Encode a message to JSON bytes (without the length prefix). Use with
/// [`write_message`], which adds the wire framing.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

/// Decode a message from wire format.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read a length-prefixed message from an async reader.
pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a length-prefixed message to an async writer.
pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a request with a timeout.
pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Write a response with a timeout.
pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
