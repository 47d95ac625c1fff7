//! fileseal-core
//!
//! Streaming authenticated encryption for whole files.
//! A file becomes `[header][block 0]..[block k-1]`, each block sealed with
//! AES-GCM (raw key), ChaCha20-Poly1305 or XChaCha20-Poly1305 (Argon2id
//! password keys).

#![forbid(unsafe_code)]

// Shared and top level
pub mod config;
pub mod constants;
pub mod notify;
pub mod types;

// Format and primitives
pub mod buffers;
pub mod crypto;
pub mod headers;
pub mod telemetry;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::crypto::{CipherAlgorithm, DecryptionInput, EncryptionInput, KdfParams, SecretInput};
    pub use crate::notify::PostWriteNotifier;
    pub use crate::stream::{AlignmentMode, AlignmentPolicy, FileCryptor, TransferInstruction};
    pub use crate::telemetry::{AuditEvent, AuditSink, TelemetrySnapshot};
    pub use crate::types::{ErrorKind, FileCryptoError};
    pub use tokio_util::sync::CancellationToken;
}
