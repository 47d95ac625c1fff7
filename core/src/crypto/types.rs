// ## 📂 File: `src/crypto/types.rs`

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::constants::TAG_LEN;

/// Stable key and nonce sizes.
pub const KEY_LEN_32: usize = 32;

/// 96-bit nonce (AES-GCM, ChaCha20-Poly1305).
pub const NONCE_LEN_12: usize = 12;

/// 192-bit extended nonce (XChaCha20-Poly1305).
pub const NONCE_LEN_24: usize = 24;

/// Raw key sizes accepted by AES-GCM.
pub const AES_KEY_SIZES: &[usize] = &[16, 24, 32];

/// Derived keys are always 32 bytes.
pub const DERIVED_KEY_SIZES: &[usize] = &[KEY_LEN_32];

/// How an algorithm gets its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Caller supplies raw key bytes.
    Direct,
    /// Key is derived from a password with Argon2id.
    Derived,
}

/// The closed set of supported algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    /// AES-GCM with a caller-supplied 128/192/256-bit key.
    AesGcm,
    /// ChaCha20-Poly1305 keyed by Argon2id(password, kdfSalt).
    ChaCha20Poly1305,
    /// XChaCha20-Poly1305 keyed by Argon2id(password, kdfSalt).
    XChaCha20Poly1305,
}

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 3] = [
        CipherAlgorithm::AesGcm,
        CipherAlgorithm::ChaCha20Poly1305,
        CipherAlgorithm::XChaCha20Poly1305,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            CipherAlgorithm::AesGcm => "aes-gcm",
            CipherAlgorithm::ChaCha20Poly1305 => "chacha20-poly1305",
            CipherAlgorithm::XChaCha20Poly1305 => "xchacha20-poly1305",
        }
    }

    pub const fn nonce_len(&self) -> usize {
        match self {
            CipherAlgorithm::XChaCha20Poly1305 => NONCE_LEN_24,
            _ => NONCE_LEN_12,
        }
    }

    pub const fn tag_len(&self) -> usize {
        TAG_LEN
    }

    pub const fn key_mode(&self) -> KeyMode {
        match self {
            CipherAlgorithm::AesGcm => KeyMode::Direct,
            _ => KeyMode::Derived,
        }
    }

    pub const fn accepted_key_sizes(&self) -> &'static [usize] {
        match self {
            CipherAlgorithm::AesGcm => AES_KEY_SIZES,
            _ => DERIVED_KEY_SIZES,
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub enum CryptoError {
    /// Key length not accepted by the algorithm.
    InvalidKeySize {
        algorithm: CipherAlgorithm,
        actual: usize,
        accepted: &'static [usize],
    },

    /// Nonce length mismatch for the algorithm.
    InvalidNonceLen { expected: usize, actual: usize },

    /// Secret kind does not match the algorithm's key mode.
    InputMismatch { algorithm: CipherAlgorithm, expected: KeyMode },

    /// Secret is empty.
    EmptySecret,

    /// Tag buffer is not exactly one tag wide.
    InvalidTagLen { expected: usize, actual: usize },

    /// AEAD tag mismatch.
    AuthenticationFailure,

    /// Argon2id rejected its parameters or failed to run.
    Kdf(String),

    /// General runtime error with context.
    Failure(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        match self {
            InvalidKeySize { algorithm, actual, accepted } =>
                write!(f, "invalid key size for {}: {} bytes (accepted: {:?})", algorithm, actual, accepted),
            InvalidNonceLen { expected, actual } =>
                write!(f, "invalid nonce length: expected={}, actual={}", expected, actual),
            InputMismatch { algorithm, expected } => match expected {
                KeyMode::Direct => write!(f, "{} expects a raw key, got a password", algorithm),
                KeyMode::Derived => write!(f, "{} expects a password, got a raw key", algorithm),
            },
            EmptySecret =>
                write!(f, "secret must not be empty"),
            InvalidTagLen { expected, actual } =>
                write!(f, "invalid tag length: expected={}, actual={}", expected, actual),
            AuthenticationFailure =>
                write!(f, "AEAD authentication failed"),
            Kdf(msg) =>
                write!(f, "key derivation failed: {}", msg),
            Failure(msg) =>
                write!(f, "crypto failure: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}
