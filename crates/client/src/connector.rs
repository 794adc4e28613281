// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! How agents obtain their connection.

use async_trait::async_trait;
use fw_core::AgentSettings;
use fw_wire::{Connection, ProtocolError};
use std::time::Duration;

/// Default connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connection for an agent's settings.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &AgentSettings) -> Result<Connection, ProtocolError>;
}

/// Plain TCP to the agent's host and port.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, settings: &AgentSettings) -> Result<Connection, ProtocolError> {
        Connection::open(&settings.host, settings.port, self.timeout).await
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::DuplexConnector;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::DuplexStream;
    use tokio::sync::mpsc;

    /// In-memory connector; the server half of every connection is handed to
    /// the test through [`DuplexConnector::accept`].
    #[derive(Clone)]
    pub struct DuplexConnector {
        inner: Arc<Inner>,
    }

    struct Inner {
        servers_tx: mpsc::UnboundedSender<DuplexStream>,
        servers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<DuplexStream>>,
        connects: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Mutex<Duration>,
        refuse: Mutex<bool>,
        capacity: Mutex<usize>,
    }

    impl Default for DuplexConnector {
        fn default() -> Self {
            let (servers_tx, servers_rx) = mpsc::unbounded_channel();
            Self {
                inner: Arc::new(Inner {
                    servers_tx,
                    servers_rx: tokio::sync::Mutex::new(servers_rx),
                    connects: AtomicUsize::new(0),
                    in_flight: AtomicUsize::new(0),
                    max_in_flight: AtomicUsize::new(0),
                    delay: Mutex::new(Duration::ZERO),
                    refuse: Mutex::new(false),
                    capacity: Mutex::new(256 * 1024),
                }),
            }
        }
    }

    impl DuplexConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold every connect attempt for `delay` before it succeeds.
        pub fn set_delay(&self, delay: Duration) {
            *self.inner.delay.lock() = delay;
        }

        /// Fail connect attempts as if the agent were unreachable.
        pub fn set_refuse(&self, refuse: bool) {
            *self.inner.refuse.lock() = refuse;
        }

        /// Buffer size of later connections; a tiny buffer stalls writes
        /// until the server reads.
        pub fn set_capacity(&self, capacity: usize) {
            *self.inner.capacity.lock() = capacity;
        }

        /// Server half of the next connection.
        pub async fn accept(&self) -> Option<DuplexStream> {
            self.inner.servers_rx.lock().await.recv().await
        }

        pub fn connects(&self) -> usize {
            self.inner.connects.load(Ordering::SeqCst)
        }

        /// Highest number of connect attempts that overlapped.
        pub fn max_in_flight(&self) -> usize {
            self.inner.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for DuplexConnector {
        async fn connect(&self, settings: &AgentSettings) -> Result<Connection, ProtocolError> {
            let inner = &self.inner;
            inner.connects.fetch_add(1, Ordering::SeqCst);
            let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            inner.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = *inner.delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            inner.in_flight.fetch_sub(1, Ordering::SeqCst);

            if *inner.refuse.lock() {
                return Err(ProtocolError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "refused",
                )));
            }
            let (client, server) = tokio::io::duplex(*inner.capacity.lock());
            let _ = inner.servers_tx.send(server);
            Ok(Connection::from_stream(settings.identity().address(), client))
        }
    }
}
