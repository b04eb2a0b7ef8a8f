//! Error types for gateway operations.
//!
//! Configuration and lookup errors fail fast at startup; transport errors
//! from individual tool servers are isolated at the aggregation boundary
//! and reported per-server (see `ToolSet::errors`).

use std::fmt;

/// Errors surfaced by the gateway core.
#[derive(Debug, Clone)]
pub enum GatewayError {
    /// Missing or invalid static configuration (empty instructions, unset
    /// model, unknown selector entry, malformed endpoint URL).
    Configuration(String),

    /// Lookup miss against the tool-server registry.
    UnknownServer(String),

    /// Lookup miss against the agent registry.
    UnknownAgent(String),

    /// Agent registration collision. Should abort process initialization.
    DuplicateAgent(String),

    /// Transport-level failure opening or querying one tool server.
    Connection {
        /// Logical name of the server that failed.
        server: String,
        message: String,
    },

    /// The connection manager has already been shut down.
    Closed,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::UnknownServer(name) => write!(f, "Unknown tool server: {}", name),
            Self::UnknownAgent(name) => write!(f, "Unknown agent: {}", name),
            Self::DuplicateAgent(name) => write!(f, "Agent already registered: {}", name),
            Self::Connection { server, message } => {
                write!(f, "Connection to tool server `{}` failed: {}", server, message)
            }
            Self::Closed => write!(f, "Connection manager already shut down"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap a transport error for the named server.
    pub fn connection(server: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Connection {
            server: server.into(),
            message: err.to_string(),
        }
    }
}
