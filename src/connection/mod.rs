//! Connection Handler Module
//!
//! This module manages individual client connections to the demo server.
//! Each client connection is handled by its own async task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (main.rs)                                │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() + spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Split line  │───>│ Execute cmd │     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               ▼             │
//! │                                        ┌─────────────┐      │
//! │                                        │ Send reply  │      │
//! │                                        └─────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use flashsession::commands::CommandHandler;
//! use flashsession::connection::{handle_connection, ConnectionStats};
//! use flashsession::id::RandomGenerator;
//! use flashsession::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new(RandomGenerator::new()));
//! let stats = Arc::new(ConnectionStats::new());
//! let handler = CommandHandler::new(store);
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler, stats));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
