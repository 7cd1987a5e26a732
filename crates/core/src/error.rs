//! Error taxonomy for a sync cycle.
//!
//! Every variant carries `op`, the chain of operation names that produced it
//! (outermost first), so a fatal error reaching the caller reads like
//! `sync: describe: transport.send: ...`.

use thiserror::Error;

/// Errors produced anywhere in the synchronization pipeline.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network-level failure that survived the single retry.
    #[error("{op}: transport failure: {message}")]
    Transport { op: String, message: String },

    /// The remote answered with a non-success status code.
    #[error("{op}: {status}")]
    ApiResponse {
        op: String,
        code: u16,
        status: String,
    },

    /// The response body did not have the expected shape.
    #[error("{op}: failed to decode response: {message}")]
    Decode { op: String, message: String },

    /// The local store rejected a read or write.
    #[error("{op}: storage failure: {message}")]
    Storage { op: String, message: String },

    /// The cycle was cancelled between items.
    #[error("sync cycle cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn transport(op: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub fn api_response(op: &str, code: u16, status: impl Into<String>) -> Self {
        Self::ApiResponse {
            op: op.to_string(),
            code,
            status: status.into(),
        }
    }

    pub fn decode(op: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            op: op.to_string(),
            message: message.into(),
        }
    }

    pub fn storage(op: &str, message: impl Into<String>) -> Self {
        Self::Storage {
            op: op.to_string(),
            message: message.into(),
        }
    }

    /// Prefix the operation chain with an enclosing operation name.
    pub fn within(self, outer: &str) -> Self {
        match self {
            Self::Transport { op, message } => Self::Transport {
                op: format!("{}: {}", outer, op),
                message,
            },
            Self::ApiResponse { op, code, status } => Self::ApiResponse {
                op: format!("{}: {}", outer, op),
                code,
                status,
            },
            Self::Decode { op, message } => Self::Decode {
                op: format!("{}: {}", outer, op),
                message,
            },
            Self::Storage { op, message } => Self::Storage {
                op: format!("{}: {}", outer, op),
                message,
            },
            Self::Cancelled => Self::Cancelled,
        }
    }

    /// Only an explicit per-item rejection from the remote may be skipped.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::ApiResponse { .. })
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::ApiResponse { .. } => "api_response",
            Self::Decode { .. } => "decode",
            Self::Storage { .. } => "storage",
            Self::Cancelled => "cancelled",
        }
    }
}
