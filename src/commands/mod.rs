//! Command Handler Module
//!
//! This module implements the request layer of the demo server. It receives
//! one request line, runs it against the session store through the request
//! binding, and returns a reply line.
//!
//! ## Architecture
//!
//! ```text
//! Client Request (one line)
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ SessionBinding  │  (binding module)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  MemoryStore    │  (storage module)
//! └─────────────────┘
//! ```

pub mod handler;

// Re-export the main command handler
pub use handler::{ClientSession, CommandHandler, Reply};
