// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One stream to one agent.
//!
//! Commands are written line by line and must be serialized by the caller.
//! A single [`Reader`] pulls pushed messages off the same stream. Closing the
//! connection from any task wakes a blocked [`Reader::read`].

use crate::frame::FrameBuffer;
use crate::message::Message;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const READ_CHUNK: usize = 8 * 1024;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Errors from the protocol connection
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connecting to {address} timed out")]
    ConnectTimeout { address: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    Closed,
    #[error("connection already has a reader")]
    ReaderTaken,
    #[error("invalid {message_type} payload: {source}")]
    Payload {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Errors raised because the connection was closed underneath the caller.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, ProtocolError::Closed)
    }
}

struct Inbound {
    stream: BoxedReader,
    frames: FrameBuffer,
}

impl Inbound {
    /// Read one chunk; `Ok(false)` at end of stream.
    async fn fill(&mut self, shutdown: &CancellationToken) -> Result<bool, ProtocolError> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = tokio::select! {
            _ = shutdown.cancelled() => return Err(ProtocolError::Closed),
            n = self.stream.read(&mut chunk) => n?,
        };
        if n == 0 {
            return Ok(false);
        }
        self.frames.extend(&chunk[..n]);
        Ok(true)
    }
}

/// Connection to one agent's command server.
pub struct Connection {
    peer: String,
    writer: Mutex<Option<BoxedWriter>>,
    inbound: Arc<Mutex<Inbound>>,
    shutdown: CancellationToken,
    reader_taken: AtomicBool,
}

impl Connection {
    /// Open a TCP connection, giving up after `timeout`.
    pub async fn open(host: &str, port: u16, timeout: Duration) -> Result<Self, ProtocolError> {
        let address = format!("{host}:{port}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ProtocolError::ConnectTimeout { address: address.clone() })??;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        tracing::debug!(peer = %address, "connection opened");
        Ok(Self::from_parts(address, Box::new(read), Box::new(write)))
    }

    /// Wrap an already-open stream (in-memory transports, tests).
    pub fn from_stream<S>(peer: impl Into<String>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        Self::from_parts(peer.into(), Box::new(read), Box::new(write))
    }

    fn from_parts(peer: String, read: BoxedReader, write: BoxedWriter) -> Self {
        Self {
            peer,
            writer: Mutex::new(Some(write)),
            inbound: Arc::new(Mutex::new(Inbound { stream: read, frames: FrameBuffer::default() })),
            shutdown: CancellationToken::new(),
            reader_taken: AtomicBool::new(false),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_connected(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub fn command(&self, text: impl Into<String>) -> Command<'_> {
        Command { connection: self, text: text.into() }
    }

    /// Create the connection's only reader.
    pub fn reader(&self) -> Result<Reader, ProtocolError> {
        if self.reader_taken.swap(true, Ordering::SeqCst) {
            return Err(ProtocolError::ReaderTaken);
        }
        Ok(Reader {
            inbound: Arc::clone(&self.inbound),
            shutdown: self.shutdown.clone(),
            current: None,
        })
    }

    /// Stop the connection without waiting: pending reads and writes fail
    /// with [`ProtocolError::Closed`]. The stream is released on drop.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Close the connection. Safe to call repeatedly and from any task.
    ///
    /// Never waits on the peer: an in-flight write is abandoned first.
    pub async fn close(&self) -> Result<(), ProtocolError> {
        self.shutdown.cancel();
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            tracing::debug!(peer = %self.peer, "closing connection");
            writer.shutdown().await?;
        }
        Ok(())
    }

    async fn write_line(&self, text: &str) -> Result<(), ProtocolError> {
        let mut writer = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(ProtocolError::Closed),
            writer = self.writer.lock() => writer,
        };
        let writer = writer.as_mut().ok_or(ProtocolError::Closed)?;
        let write = async {
            writer.write_all(text.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(ProtocolError::Closed),
            written = write => Ok(written?),
        }
    }

    async fn read_line(&self) -> Result<String, ProtocolError> {
        let mut inbound = self.inbound.lock().await;
        loop {
            if let Some(line) = inbound.frames.next_line() {
                return Ok(line);
            }
            if !inbound.fill(&self.shutdown).await? {
                return Err(ProtocolError::Closed);
            }
        }
    }
}

/// One command line bound to a connection.
pub struct Command<'a> {
    connection: &'a Connection,
    text: String,
}

impl Command<'_> {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Write the command.
    pub async fn execute(&self) -> Result<(), ProtocolError> {
        tracing::trace!(peer = %self.connection.peer, command = %redact(&self.text), "sending command");
        self.connection.write_line(&self.text).await
    }

    /// Write the command and read the immediate single-line reply.
    pub async fn execute_reply(&self) -> Result<String, ProtocolError> {
        self.execute().await?;
        self.connection.read_line().await
    }
}

/// Keep shared secrets out of logs.
fn redact(text: &str) -> &str {
    if text.starts_with("auth ") {
        "auth ********"
    } else {
        text
    }
}

/// Pull cursor over pushed messages.
pub struct Reader {
    inbound: Arc<Mutex<Inbound>>,
    shutdown: CancellationToken,
    current: Option<Message>,
}

impl Reader {
    /// Advance to the next message.
    ///
    /// `Ok(false)` at end of stream; `Err(ProtocolError::Closed)` once the
    /// connection is closed.
    pub async fn read(&mut self) -> Result<bool, ProtocolError> {
        let mut inbound = self.inbound.lock().await;
        loop {
            if let Some(message) = inbound.frames.next_message(Utc::now()) {
                self.current = Some(message);
                return Ok(true);
            }
            if !inbound.fill(&self.shutdown).await? {
                self.current = None;
                return Ok(false);
            }
        }
    }

    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    pub fn take_current(&mut self) -> Option<Message> {
        self.current.take()
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
