// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::message::MessageType;
use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};

fn pair() -> (Connection, DuplexStream) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    (Connection::from_stream("test:36330", client), server)
}

#[tokio::test]
async fn commands_are_newline_terminated() {
    let (connection, server) = pair();
    connection.command("updates clear").execute().await.unwrap();
    connection.command("queue-info").execute().await.unwrap();

    let mut lines = BufReader::new(server).lines();
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("updates clear"));
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("queue-info"));
}

#[tokio::test]
async fn execute_reply_reads_one_line() {
    let (connection, mut server) = pair();
    server.write_all(b"Welcome\n").await.unwrap();

    // greeting line first, then the reply
    let greeting = connection.command("auth secret").execute_reply().await.unwrap();
    assert_eq!(greeting, "Welcome");

    server.write_all(b"> OK\n").await.unwrap();
    let reply = connection.command("ping").execute_reply().await.unwrap();
    assert_eq!(reply, "OK");
}

#[tokio::test]
async fn reader_yields_messages_in_order() {
    let (connection, mut server) = pair();
    let mut reader = connection.reader().unwrap();

    server
        .write_all(b"> PyON 1 heartbeat\n0\n---\n> PyON 1 units\n[]\n---\n")
        .await
        .unwrap();

    assert!(reader.read().await.unwrap());
    assert_eq!(reader.current().unwrap().message_type, MessageType::Heartbeat);
    assert!(reader.read().await.unwrap());
    let message = reader.take_current().unwrap();
    assert_eq!(message.message_type, MessageType::QueueInfo);
    assert_eq!(message.text, "[]");
    assert!(reader.current().is_none());
}

#[tokio::test]
async fn reader_reports_end_of_stream() {
    let (connection, server) = pair();
    let mut reader = connection.reader().unwrap();
    drop(server);
    assert!(!reader.read().await.unwrap());
}

#[tokio::test]
async fn second_reader_is_rejected() {
    let (connection, _server) = pair();
    let _reader = connection.reader().unwrap();
    assert!(matches!(connection.reader(), Err(ProtocolError::ReaderTaken)));
}

#[tokio::test]
async fn close_unblocks_pending_read() {
    let (connection, _server) = pair();
    let connection = Arc::new(connection);
    let mut reader = connection.reader().unwrap();

    let pending = tokio::spawn(async move { reader.read().await });
    tokio::task::yield_now().await;

    connection.close().await.unwrap();
    let err = pending.await.unwrap().unwrap_err();
    assert!(err.is_shutdown());
    assert!(!connection.is_connected());
}

#[tokio::test]
async fn close_is_idempotent_and_rejects_commands() {
    let (connection, _server) = pair();
    connection.close().await.unwrap();
    connection.close().await.unwrap();

    let err = connection.command("queue-info").execute().await.unwrap_err();
    assert!(matches!(err, ProtocolError::Closed));
}

#[tokio::test]
async fn close_abandons_write_the_peer_never_reads() {
    let (client, _server) = tokio::io::duplex(4);
    let connection = Arc::new(Connection::from_stream("test:36330", client));

    let stalled = {
        let connection = Arc::clone(&connection);
        tokio::spawn(async move { connection.command("updates add 0 60 $heartbeat").execute().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!stalled.is_finished());

    tokio::time::timeout(Duration::from_secs(2), connection.close()).await.unwrap().unwrap();
    let err = tokio::time::timeout(Duration::from_secs(2), stalled).await.unwrap().unwrap().unwrap_err();
    assert!(err.is_shutdown());
}

#[tokio::test]
async fn cancel_fails_queued_commands() {
    let (client, _server) = tokio::io::duplex(4);
    let connection = Connection::from_stream("test:36330", client);
    connection.cancel();

    let err = connection.command("queue-info").execute().await.unwrap_err();
    assert!(err.is_shutdown());
    assert!(!connection.is_connected());
}

#[tokio::test]
async fn open_times_out_or_fails_on_unroutable_host() {
    // 10.255.255.1 is non-routable in most environments; a refused connection is also fine
    let result = Connection::open("10.255.255.1", 36330, Duration::from_millis(50)).await;
    assert!(result.is_err());
}

#[test]
fn auth_is_redacted() {
    assert_eq!(redact("auth hunter2"), "auth ********");
    assert_eq!(redact("queue-info"), "queue-info");
}
