// ## 📂 File: `src/types.rs`

//! Top-level error for file operations and the flat error taxonomy used by
//! audit records and callers that branch on failure class.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::CryptoError;
use crate::headers::HeaderError;
use crate::stream::validator::ConsistencyError;

/// Failure classes. Stable names; used in audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidKeySize,
    VersionValidation,
    HeaderIntegrity,
    AuthenticationFailure,
    DataIntegrity,
    BufferOverflow,
    ReadConsistency,
    Cancelled,
    UnexpectedEof,
    InvalidInput,
    Kdf,
    Configuration,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Unified error for `encrypt_file` / `decrypt_file`.
/// - `From<T>` impls let `?` carry module errors up unchanged.
/// - `kind()` flattens them onto `ErrorKind`.
#[derive(Debug, Error)]
pub enum FileCryptoError {
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Tag verification failed for one block. Never retried.
    #[error("authentication failed for block {block_index}")]
    AuthenticationFailure { block_index: i64 },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Container ended inside a block.
    #[error("unexpected end of input in block {block_index}: expected {expected} bytes, got {actual}")]
    UnexpectedEof { block_index: i64, expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FileCryptoError {
    pub fn kind(&self) -> ErrorKind {
        use FileCryptoError as E;
        match self {
            E::Header(h) => match h {
                HeaderError::VersionValidation { .. } => ErrorKind::VersionValidation,
                HeaderError::IntegrityMismatch { .. } => ErrorKind::HeaderIntegrity,
                HeaderError::BufferTooShort { .. } | HeaderError::NegativeOriginalSize { .. } => {
                    ErrorKind::DataIntegrity
                }
            },
            E::Crypto(c) => match c {
                CryptoError::InvalidKeySize { .. } => ErrorKind::InvalidKeySize,
                CryptoError::AuthenticationFailure => ErrorKind::AuthenticationFailure,
                CryptoError::Kdf(_) => ErrorKind::Kdf,
                CryptoError::InputMismatch { .. }
                | CryptoError::EmptySecret
                | CryptoError::InvalidNonceLen { .. }
                | CryptoError::InvalidTagLen { .. }
                | CryptoError::Failure(_) => ErrorKind::InvalidInput,
            },
            E::AuthenticationFailure { .. } => ErrorKind::AuthenticationFailure,
            E::Consistency(c) => c.kind(),
            E::Config(_) => ErrorKind::Configuration,
            E::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            E::InvalidInput(_) => ErrorKind::InvalidInput,
            E::Cancelled => ErrorKind::Cancelled,
            E::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => ErrorKind::UnexpectedEof,
            E::Io(_) => ErrorKind::Io,
        }
    }

    /// Block index for per-block failures.
    pub fn block_index(&self) -> Option<i64> {
        match self {
            FileCryptoError::AuthenticationFailure { block_index }
            | FileCryptoError::UnexpectedEof { block_index, .. } => Some(*block_index),
            _ => None,
        }
    }
}
