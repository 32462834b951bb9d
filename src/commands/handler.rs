//! Command Handler Module
//!
//! Executes one line-protocol request against a session store through the
//! [`SessionBinding`]. Every request that touches a session follows the same
//! shape: load (or create) the record, mutate the copy, commit it back,
//! reply with the token.
//!
//! ## Supported Commands
//!
//! - `PING` - Test connection
//! - `VISIT [token]` - Count a visit, creating a session if needed
//! - `LOGIN token user [display name]` - Attach a user to a session
//! - `WHOAMI token` - Show the session's user
//! - `LOGOUT token` - End a session
//! - `SESSIONS` - Number of sessions held
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│  dispatch() │───>│  execute()  │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                     SessionBinding          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::binding::SessionBinding;
use crate::storage::{RecordStore, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Per-client data kept in each session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    /// Authenticated user id, if logged in
    pub user_id: Option<String>,
    /// Display name of the authenticated user
    pub username: Option<String>,
    /// Requests seen for this session
    pub visits: u64,
}

impl ClientSession {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `PONG`
    Pong,
    /// `OK <text>` (or bare `OK`)
    Ok(String),
    /// `ERR <message>`
    Error(String),
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Reply::Ok(text.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Encodes the reply as a newline-terminated line.
    pub fn serialize(&self) -> Vec<u8> {
        format!("{}\n", self).into_bytes()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Pong => write!(f, "PONG"),
            Reply::Ok(text) if text.is_empty() => write!(f, "OK"),
            Reply::Ok(text) => write!(f, "OK {}", text),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

/// Handles session commands by dispatching them to the appropriate handlers.
pub struct CommandHandler<S> {
    binding: SessionBinding<S>,
}

impl<S> Clone for CommandHandler<S> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
        }
    }
}

impl<S> CommandHandler<S>
where
    S: RecordStore<Payload = ClientSession>,
{
    /// Creates a new command handler over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            binding: SessionBinding::new(store),
        }
    }

    /// Executes a request line and returns the reply.
    pub fn execute(&self, line: &str) -> Reply {
        let mut parts = line.split_whitespace();

        let cmd_name = match parts.next() {
            Some(name) => name.to_uppercase(),
            None => return Reply::error("empty command"),
        };
        let args: Vec<&str> = parts.collect();

        self.dispatch(&cmd_name, &args)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[&str]) -> Reply {
        match cmd {
            "PING" => Reply::Pong,
            "VISIT" => self.cmd_visit(args),
            "LOGIN" => self.cmd_login(args),
            "WHOAMI" => self.cmd_whoami(args),
            "LOGOUT" => self.cmd_logout(args),
            "SESSIONS" => Reply::ok(self.binding.store().len().to_string()),
            _ => Reply::error(format!("unknown command '{}'", cmd)),
        }
    }

    fn cmd_visit(&self, args: &[&str]) -> Reply {
        if args.len() > 1 {
            return Reply::error("wrong number of arguments for 'VISIT'");
        }

        let mut record = match self.binding.load(args.first().copied()) {
            Ok(record) => record,
            Err(e) => return self.store_error(e),
        };

        record.payload.visits += 1;

        if let Err(e) = self.binding.commit(&record) {
            return self.store_error(e);
        }

        let user = record.payload.username.as_deref().unwrap_or("-");
        Reply::ok(format!(
            "{} visits={} user={}",
            SessionBinding::<S>::token(&record),
            record.payload.visits,
            user
        ))
    }

    fn cmd_login(&self, args: &[&str]) -> Reply {
        let (token, user_id, username) = match args {
            [token, user_id] => (*token, *user_id, *user_id),
            [token, user_id, username] => (*token, *user_id, *username),
            _ => return Reply::error("wrong number of arguments for 'LOGIN'"),
        };

        let mut record = match self.binding.load(Some(token)) {
            Ok(record) => record,
            Err(e) => return self.store_error(e),
        };

        record.payload.user_id = Some(user_id.to_string());
        record.payload.username = Some(username.to_string());

        if let Err(e) = self.binding.commit(&record) {
            return self.store_error(e);
        }

        debug!(user = user_id, "Session authenticated");
        Reply::ok(format!(
            "{} user={}",
            SessionBinding::<S>::token(&record),
            username
        ))
    }

    fn cmd_whoami(&self, args: &[&str]) -> Reply {
        let token = match args {
            [token] => *token,
            _ => return Reply::error("wrong number of arguments for 'WHOAMI'"),
        };

        match self.binding.lookup(token) {
            Ok(record) => Reply::ok(record.payload.username.unwrap_or_else(|| "-".to_string())),
            Err(e) if e.is_not_found() => Reply::error("no session"),
            Err(e) => self.store_error(e),
        }
    }

    fn cmd_logout(&self, args: &[&str]) -> Reply {
        let token = match args {
            [token] => *token,
            _ => return Reply::error("wrong number of arguments for 'LOGOUT'"),
        };

        match self.binding.end(token) {
            Ok(()) => Reply::ok(""),
            Err(e) => self.store_error(e),
        }
    }

    fn store_error(&self, e: StoreError) -> Reply {
        if !e.is_not_found() {
            error!(error = %e, "Session store failure");
        }
        Reply::error(e.to_string())
    }
}
