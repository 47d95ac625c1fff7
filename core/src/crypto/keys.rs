// ## 📂 File: `src/crypto/keys.rs`

//! crypto/keys.rs
//! Key establishment: direct raw keys or Argon2id-derived keys.
//!
//! Design notes:
//! - Secrets arrive in `Zeroizing` storage and key material leaves in it, so
//!   every exit path (success, error, cancellation, panic unwind) wipes them.
//! - The algorithm fixes the mode. A password handed to the raw-key algorithm
//!   (or the reverse) is rejected before any I/O happens.
//! - Argon2id runs on tokio's blocking pool.

use std::fmt;

use zeroize::Zeroizing;

use crate::crypto::kdf::{derive_key, KdfParams};
use crate::crypto::types::{CipherAlgorithm, CryptoError, KeyMode};

/// Caller secret for one operation.
#[derive(Clone)]
pub enum SecretInput {
    RawKey(Zeroizing<Vec<u8>>),
    Password(Zeroizing<Vec<u8>>),
}

pub type EncryptionInput = SecretInput;
pub type DecryptionInput = SecretInput;

impl SecretInput {
    pub fn raw_key(key: impl Into<Vec<u8>>) -> Self {
        SecretInput::RawKey(Zeroizing::new(key.into()))
    }

    pub fn password(password: impl AsRef<[u8]>) -> Self {
        SecretInput::Password(Zeroizing::new(password.as_ref().to_vec()))
    }

    pub fn mode(&self) -> KeyMode {
        match self {
            SecretInput::RawKey(_) => KeyMode::Direct,
            SecretInput::Password(_) => KeyMode::Derived,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            SecretInput::RawKey(k) => k.as_slice(),
            SecretInput::Password(p) => p.as_slice(),
        }
    }

    /// Check this secret fits `algorithm` without touching the KDF.
    pub fn check_for(&self, algorithm: CipherAlgorithm) -> Result<(), CryptoError> {
        let expected = algorithm.key_mode();
        if self.mode() != expected {
            return Err(CryptoError::InputMismatch { algorithm, expected });
        }
        if self.bytes().is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        if expected == KeyMode::Direct {
            let accepted = algorithm.accepted_key_sizes();
            let actual = self.bytes().len();
            if !accepted.contains(&actual) {
                return Err(CryptoError::InvalidKeySize { algorithm, actual, accepted });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SecretInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretInput::RawKey(k) => write!(f, "RawKey(<{} bytes redacted>)", k.len()),
            SecretInput::Password(_) => write!(f, "Password(<redacted>)"),
        }
    }
}

/// Final AEAD key for one operation. Zeroed on drop.
pub struct KeyMaterial {
    key: Zeroizing<Vec<u8>>,
    mode: KeyMode,
}

impl KeyMaterial {
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.key.len())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Blocking key establishment.
pub fn establish_key(
    algorithm: CipherAlgorithm,
    input: &SecretInput,
    kdf_salt: &[u8],
    params: &KdfParams,
) -> Result<KeyMaterial, CryptoError> {
    input.check_for(algorithm)?;

    match input {
        SecretInput::RawKey(k) => Ok(KeyMaterial {
            key: Zeroizing::new(k.to_vec()),
            mode: KeyMode::Direct,
        }),
        SecretInput::Password(p) => {
            let key = derive_key(p, kdf_salt, params)?;
            Ok(KeyMaterial { key, mode: KeyMode::Derived })
        }
    }
}

/// Async key establishment. Password derivation is moved to the blocking pool;
/// raw keys are handled inline.
pub async fn establish_key_async(
    algorithm: CipherAlgorithm,
    input: &SecretInput,
    kdf_salt: [u8; crate::constants::KDF_SALT_LEN],
    params: KdfParams,
) -> Result<KeyMaterial, CryptoError> {
    input.check_for(algorithm)?;

    if input.mode() == KeyMode::Direct {
        return establish_key(algorithm, input, &kdf_salt, &params);
    }

    let owned = input.clone();
    tokio::task::spawn_blocking(move || establish_key(algorithm, &owned, &kdf_salt, &params))
        .await
        .map_err(|e| CryptoError::Kdf(format!("key derivation task failed: {}", e)))?
}
