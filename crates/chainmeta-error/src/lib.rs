//! # chainmeta Error
//!
//! Unified error type for the chainmeta crates. Every failure raised by the
//! chain registry, the refresh-ahead cache or a chain-RPC variant is a
//! [`ChainMetaError`], and every variant belongs to exactly one [`ErrorKind`]:
//!
//! - [`ErrorKind::Transport`] - node or store unreachable; the caller may retry
//! - [`ErrorKind::Decode`] - malformed address, signature, ABI or binary payload
//! - [`ErrorKind::NotFound`] - absent row, account, receipt or implausible token
//! - [`ErrorKind::Configuration`] - malformed chain row or cache key
//! - [`ErrorKind::Cancelled`] - the caller's context was cancelled
//! - [`ErrorKind::Unsupported`] - the backend has no implementation of the call
//!
//! ## Example
//!
//! ```
//! use chainmeta_error::{ChainMetaError, ErrorKind, Result};
//!
//! fn parse_owner(addr: &str) -> Result<()> {
//!     if !addr.starts_with("0x") {
//!         return Err(ChainMetaError::InvalidAddress {
//!             address: addr.to_string(),
//!             reason: "missing 0x prefix".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = parse_owner("dead").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Decode);
//! assert!(!err.is_retryable());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// The main error type for chainmeta operations.
///
/// The type is `Clone` so that a single failed load can be handed to every
/// caller that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainMetaError {
    // ============ Decode Errors ============
    /// Address could not be parsed in the backend's native form
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address
        address: String,
        /// Reason for rejection
        reason: String,
    },

    /// Transaction hash or signature could not be parsed
    #[error("Invalid transaction hash '{hash}': {reason}")]
    InvalidHash {
        /// The rejected hash
        hash: String,
        /// Reason for rejection
        reason: String,
    },

    /// A payload returned by the node could not be decoded
    #[error("Failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded (ABI return, mint layout, TLV entry...)
        what: String,
        /// Decoder message
        reason: String,
    },

    /// The node answered with a JSON-RPC error object (revert, unknown
    /// method, invalid params). The same request will fail the same way.
    #[error("RPC call rejected: {method} - code {code}: {message}")]
    RpcRejected {
        /// RPC method or logical operation
        method: String,
        /// JSON-RPC error code
        code: i64,
        /// Error message from the node
        message: String,
    },

    // ============ Transport Errors ============
    /// RPC request failed before a response could be interpreted
    #[error("RPC request failed: {method} - {reason}")]
    Rpc {
        /// RPC method or logical operation
        method: String,
        /// Transport message
        reason: String,
    },

    /// The row store query failed
    #[error("Row store query failed: {0}")]
    Store(String),

    /// Operation exceeded its deadline
    #[error("Operation '{operation}' timed out after {millis}ms")]
    Timeout {
        /// Operation name
        operation: String,
        /// Configured timeout in milliseconds
        millis: u64,
    },

    // ============ Not Found ============
    /// No chain matches the lookup key
    #[error("Chain not found: {0}")]
    ChainNotFound(String),

    /// The address does not resolve to a usable token
    #[error("Token not found: {address} on {chain}")]
    TokenNotFound {
        /// Chain name
        chain: String,
        /// Token address or symbolic name
        address: String,
    },

    /// Account does not exist on chain
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Receipt or signature status does not exist
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    // ============ Configuration Errors ============
    /// A chain row failed validation
    #[error("Invalid chain row {id}: {reason}")]
    InvalidChainRow {
        /// Numeric row identifier
        id: i64,
        /// Validation message
        reason: String,
    },

    /// Cache key does not have the `<chain>#<value>` shape
    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),

    /// The store returned no chains at all
    #[error("Chain store returned an empty result set")]
    EmptyChainSet,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ============ Control Flow ============
    /// Caller cancelled the operation
    #[error("Operation '{0}' was cancelled")]
    Cancelled(String),

    /// Backend has no implementation for this operation
    #[error("Not supported on {backend}: {operation}")]
    Unsupported {
        /// Backend display name
        backend: String,
        /// Operation name
        operation: String,
    },

    // ============ Generic ============
    /// Wrapped error from an external source
    #[error("External error: {message}")]
    External {
        /// Error message
        message: String,
    },
}

/// Convenient Result type using ChainMetaError
pub type Result<T> = std::result::Result<T, ChainMetaError>;

/// Coarse classification used by callers to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Network or store unreachable; safe to retry
    Transport,
    /// Malformed input or payload; retrying will not help
    Decode,
    /// The requested thing does not exist
    NotFound,
    /// Malformed configuration row or cache key
    Configuration,
    /// Cancelled by the caller
    Cancelled,
    /// Not implemented for this backend
    Unsupported,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// Invalid address
    InvalidAddress = 1001,
    /// Invalid hash or signature
    InvalidHash = 1002,
    /// Payload decode failure
    Decode = 1003,
    /// Node rejected the call
    RpcRejected = 1004,
    /// RPC failure
    Rpc = 2001,
    /// Store failure
    Store = 2002,
    /// Timeout
    Timeout = 2003,
    /// Chain not found
    ChainNotFound = 3001,
    /// Token not found
    TokenNotFound = 3002,
    /// Account not found
    AccountNotFound = 3003,
    /// Transaction not found
    TransactionNotFound = 3004,
    /// Invalid chain row
    InvalidChainRow = 4001,
    /// Invalid cache key
    InvalidCacheKey = 4002,
    /// Empty chain set
    EmptyChainSet = 4003,
    /// Configuration
    Config = 4004,
    /// Cancelled
    Cancelled = 5001,
    /// Not supported
    Unsupported = 9001,
}

impl ChainMetaError {
    /// Builds a transport error for an RPC method
    pub fn rpc(method: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ChainMetaError::Rpc {
            method: method.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds the error for a JSON-RPC error object returned by the node
    pub fn rpc_rejected(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        ChainMetaError::RpcRejected {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Builds a decode error
    pub fn decode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ChainMetaError::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds an unsupported-operation error
    pub fn unsupported(backend: impl std::fmt::Display, operation: impl Into<String>) -> Self {
        ChainMetaError::Unsupported {
            backend: backend.to_string(),
            operation: operation.into(),
        }
    }

    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChainMetaError::InvalidAddress { .. }
            | ChainMetaError::InvalidHash { .. }
            | ChainMetaError::Decode { .. }
            | ChainMetaError::RpcRejected { .. } => ErrorKind::Decode,
            ChainMetaError::Rpc { .. }
            | ChainMetaError::Store(_)
            | ChainMetaError::Timeout { .. }
            | ChainMetaError::External { .. } => ErrorKind::Transport,
            ChainMetaError::ChainNotFound(_)
            | ChainMetaError::TokenNotFound { .. }
            | ChainMetaError::AccountNotFound(_)
            | ChainMetaError::TransactionNotFound(_) => ErrorKind::NotFound,
            ChainMetaError::InvalidChainRow { .. }
            | ChainMetaError::InvalidCacheKey(_)
            | ChainMetaError::EmptyChainSet
            | ChainMetaError::Config(_) => ErrorKind::Configuration,
            ChainMetaError::Cancelled(_) => ErrorKind::Cancelled,
            ChainMetaError::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// Returns the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ChainMetaError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            ChainMetaError::InvalidHash { .. } => ErrorCode::InvalidHash,
            ChainMetaError::Decode { .. } => ErrorCode::Decode,
            ChainMetaError::RpcRejected { .. } => ErrorCode::RpcRejected,
            ChainMetaError::Rpc { .. } => ErrorCode::Rpc,
            ChainMetaError::Store(_) => ErrorCode::Store,
            ChainMetaError::Timeout { .. } => ErrorCode::Timeout,
            ChainMetaError::ChainNotFound(_) => ErrorCode::ChainNotFound,
            ChainMetaError::TokenNotFound { .. } => ErrorCode::TokenNotFound,
            ChainMetaError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            ChainMetaError::TransactionNotFound(_) => ErrorCode::TransactionNotFound,
            ChainMetaError::InvalidChainRow { .. } => ErrorCode::InvalidChainRow,
            ChainMetaError::InvalidCacheKey(_) => ErrorCode::InvalidCacheKey,
            ChainMetaError::EmptyChainSet => ErrorCode::EmptyChainSet,
            ChainMetaError::Config(_) => ErrorCode::Config,
            ChainMetaError::Cancelled(_) => ErrorCode::Cancelled,
            ChainMetaError::Unsupported { .. } => ErrorCode::Unsupported,
            ChainMetaError::External { .. } => ErrorCode::Unknown,
        }
    }

    /// Returns true if a retry with the same input may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns true for the not-found class
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Adds context to an error
    fn context(self, ctx: impl Into<String>) -> Result<T>;

    /// Adds context using a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| ChainMetaError::External {
            message: format!("{}: {}", ctx.into(), e),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| ChainMetaError::External {
            message: format!("{}: {}", f(), e),
        })
    }
}

// ============ From implementations for common error types ============

impl From<hex::FromHexError> for ChainMetaError {
    fn from(err: hex::FromHexError) -> Self {
        ChainMetaError::decode("hex", err)
    }
}

impl From<std::num::ParseIntError> for ChainMetaError {
    fn from(err: std::num::ParseIntError) -> Self {
        ChainMetaError::decode("integer", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChainMetaError::InvalidAddress {
            address: "0x123".to_string(),
            reason: "Too short".to_string(),
        };
        assert!(err.to_string().contains("0x123"));
        assert!(err.to_string().contains("Too short"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ChainMetaError::rpc("eth_call", "refused").kind(), ErrorKind::Transport);
        assert_eq!(ChainMetaError::decode("mint", "short").kind(), ErrorKind::Decode);
        assert_eq!(
            ChainMetaError::AccountNotFound("abc".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ChainMetaError::InvalidCacheKey("nohash".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ChainMetaError::Cancelled("x".into()).kind(), ErrorKind::Cancelled);
        assert_eq!(
            ChainMetaError::unsupported("bitcoin", "get_balance").kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_retryable() {
        let timeout = ChainMetaError::Timeout {
            operation: "eth_call".into(),
            millis: 30_000,
        };
        assert!(timeout.is_retryable());
        assert!(ChainMetaError::Store("db down".into()).is_retryable());

        let invalid = ChainMetaError::InvalidAddress {
            address: "x".into(),
            reason: "bad".into(),
        };
        assert!(!invalid.is_retryable());

        let missing = ChainMetaError::TokenNotFound {
            chain: "ethereum".into(),
            address: "0xdead".into(),
        };
        assert!(!missing.is_retryable());
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_rejected_call_is_not_retryable() {
        let err = ChainMetaError::rpc_rejected("eth_call", 3, "execution reverted");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!err.is_retryable());
        assert_eq!(err.code() as u32, 1004);
        assert!(err.to_string().contains("execution reverted"));
    }

    #[test]
    fn test_error_code() {
        assert_eq!(ChainMetaError::EmptyChainSet.code(), ErrorCode::EmptyChainSet);
        assert_eq!(ChainMetaError::EmptyChainSet.code() as u32, 4003);
    }

    #[test]
    fn test_error_context() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file missing"));

        let with_ctx = result.context("Failed to load rows");
        assert!(with_ctx.is_err());
        assert!(with_ctx.unwrap_err().to_string().contains("Failed to load rows"));
    }

    #[test]
    fn test_from_hex() {
        let err: ChainMetaError = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
