// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn request_round_trips_through_encode_decode() {
    let req = Request::SendIntervention {
        id: "loop-1".to_string(),
        message: "switch to plan B".to_string(),
    };
    let bytes = encode(&req).expect("encode");
    let decoded: Request = decode(&bytes).expect("decode");
    match decoded {
        Request::SendIntervention { id, message } => {
            assert_eq!(id, "loop-1");
            assert_eq!(message, "switch to plan B");
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn oversized_message_is_rejected_before_it_hits_the_wire() {
    let huge = "x".repeat(MAX_MESSAGE_SIZE + 1);
    let req = Request::SendIntervention {
        id: "loop-1".to_string(),
        message: huge,
    };
    let err = encode(&req).expect_err("should reject oversized payload");
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_message_reports_connection_closed_on_clean_eof() {
    let (mut client, server) = tokio::io::duplex(64);
    drop(server);
    let err = read_message(&mut client).await.expect_err("closed");
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn write_then_read_message_round_trips_over_a_duplex_stream() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    let payload = encode(&Request::Ping).expect("encode");
    write_message(&mut a, &payload).await.expect("write");
    let read_back = read_message(&mut b).await.expect("read");
    assert_eq!(read_back, payload);
}
