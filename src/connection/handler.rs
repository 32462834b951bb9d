//! Connection Handler Module
//!
//! This module handles individual client connections to the demo server.
//! Each client gets its own task that runs in a loop, reading request lines
//! and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  read bytes ─> split line    │
//!    │       ─> execute ─> reply    │
//!    │                              │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. Client disconnects / error
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream, so a read may hold half a line or several lines. Bytes
//! accumulate in a `BytesMut` and complete lines are split off the front.

use crate::commands::{ClientSession, CommandHandler, Reply};
use crate::storage::RecordStore;
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum size for the read buffer (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests processed
    pub requests_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_processed(&self) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
pub struct ConnectionHandler<S> {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command handler (shared across connections)
    command_handler: CommandHandler<S>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: RecordStore<Payload = ClientSession>,
{
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler<S>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            stats,
        }
    }

    /// Runs the main connection loop until the client disconnects or an
    /// error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(line) = self.next_line()? {
                let reply = self.command_handler.execute(&line);
                self.stats.request_processed();
                self.send_reply(&reply).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Splits one complete line off the front of the buffer, if there is one.
    fn next_line(&mut self) -> Result<Option<String>, ConnectionError> {
        let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };

        let mut line = self.buffer.split_to(pos);
        self.buffer.advance(1);

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        let line = String::from_utf8(line.to_vec()).map_err(|_| ConnectionError::InvalidUtf8)?;
        trace!(client = %self.addr, remaining = self.buffer.len(), "Parsed request line");
        Ok(Some(line))
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a reply to the client.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Request line was not valid UTF-8
    #[error("request is not valid UTF-8")]
    InvalidUtf8,

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial line)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection<S>(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler<S>,
    stats: Arc<ConnectionStats>,
) where
    S: RecordStore<Payload = ClientSession>,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
