// ## 📂 File: `src/crypto/aead.rs`

//! src/crypto/aead.rs
//! Per-block AEAD providers for AES-GCM, ChaCha20-Poly1305 and XChaCha20-Poly1305.
//!
//! Design notes:
//! - All three work in place with a detached 16-byte tag, so the engine can lay a
//!   block out as `[tag region][ciphertext]` without extra copies.
//! - Tag verification is constant-time and fails closed: on mismatch the buffer
//!   content is unspecified and must not be written out.
//! - Caller provides the per-block nonce and AAD (see `nonce` and `aad`).
//! - Expanded key state (AES round keys, ChaCha keys) is zeroized on drop.

use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};

use crate::crypto::types::{CipherAlgorithm, CryptoError, TAG_LEN};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Common shape of the three block ciphers.
pub trait BlockCipherProvider: Send + Sync {
    fn algorithm(&self) -> CipherAlgorithm;

    fn nonce_len(&self) -> usize {
        self.algorithm().nonce_len()
    }

    fn tag_len(&self) -> usize {
        self.algorithm().tag_len()
    }

    /// Encrypt `buf` in place and write the tag to `tag_out`.
    fn encrypt_block(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        tag_out: &mut [u8],
    ) -> Result<(), CryptoError>;

    /// Verify `tag` and decrypt `buf` in place.
    fn decrypt_block(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<(), CryptoError>;
}

#[inline]
fn check_lengths<A: AeadCore>(nonce: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
    let expected = A::NonceSize::USIZE;
    if nonce.len() != expected {
        return Err(CryptoError::InvalidNonceLen { expected, actual: nonce.len() });
    }
    if tag.len() != TAG_LEN || A::TagSize::USIZE != TAG_LEN {
        return Err(CryptoError::InvalidTagLen { expected: TAG_LEN, actual: tag.len() });
    }
    Ok(())
}

fn seal_detached<A: AeadInPlace>(
    cipher: &A,
    nonce: &[u8],
    aad: &[u8],
    buf: &mut [u8],
    tag_out: &mut [u8],
) -> Result<(), CryptoError> {
    check_lengths::<A>(nonce, tag_out)?;
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), aad, buf)
        .map_err(|_| CryptoError::Failure("AEAD seal failed".into()))?;
    tag_out.copy_from_slice(&tag);
    Ok(())
}

fn open_detached<A: AeadInPlace>(
    cipher: &A,
    nonce: &[u8],
    aad: &[u8],
    buf: &mut [u8],
    tag: &[u8],
) -> Result<(), CryptoError> {
    check_lengths::<A>(nonce, tag)?;
    cipher
        .decrypt_in_place_detached(GenericArray::from_slice(nonce), aad, buf, GenericArray::from_slice(tag))
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// AES-GCM keyed directly by a 16, 24 or 32 byte key.
#[derive(Clone)]
pub enum AesGcmProvider {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl AesGcmProvider {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let bad_key = || CryptoError::InvalidKeySize {
            algorithm: CipherAlgorithm::AesGcm,
            actual: key.len(),
            accepted: CipherAlgorithm::AesGcm.accepted_key_sizes(),
        };
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(|_| bad_key()),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(|_| bad_key()),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(|_| bad_key()),
            _ => Err(bad_key()),
        }
    }
}

impl BlockCipherProvider for AesGcmProvider {
    fn algorithm(&self) -> CipherAlgorithm {
        CipherAlgorithm::AesGcm
    }

    fn encrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag_out: &mut [u8]) -> Result<(), CryptoError> {
        match self {
            Self::Aes128(c) => seal_detached(c, nonce, aad, buf, tag_out),
            Self::Aes192(c) => seal_detached(c, nonce, aad, buf, tag_out),
            Self::Aes256(c) => seal_detached(c, nonce, aad, buf, tag_out),
        }
    }

    fn decrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag: &[u8]) -> Result<(), CryptoError> {
        match self {
            Self::Aes128(c) => open_detached(c, nonce, aad, buf, tag),
            Self::Aes192(c) => open_detached(c, nonce, aad, buf, tag),
            Self::Aes256(c) => open_detached(c, nonce, aad, buf, tag),
        }
    }
}

/// ChaCha20-Poly1305 over an Argon2id-derived 32-byte key.
#[derive(Clone)]
pub struct ChaChaProvider(ChaCha20Poly1305);

impl ChaChaProvider {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        ChaCha20Poly1305::new_from_slice(key)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeySize {
                algorithm: CipherAlgorithm::ChaCha20Poly1305,
                actual: key.len(),
                accepted: CipherAlgorithm::ChaCha20Poly1305.accepted_key_sizes(),
            })
    }
}

impl BlockCipherProvider for ChaChaProvider {
    fn algorithm(&self) -> CipherAlgorithm {
        CipherAlgorithm::ChaCha20Poly1305
    }

    fn encrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag_out: &mut [u8]) -> Result<(), CryptoError> {
        seal_detached(&self.0, nonce, aad, buf, tag_out)
    }

    fn decrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag: &[u8]) -> Result<(), CryptoError> {
        open_detached(&self.0, nonce, aad, buf, tag)
    }
}

/// XChaCha20-Poly1305 (24-byte nonce) over an Argon2id-derived 32-byte key.
#[derive(Clone)]
pub struct XChaChaProvider(XChaCha20Poly1305);

impl XChaChaProvider {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        XChaCha20Poly1305::new_from_slice(key)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeySize {
                algorithm: CipherAlgorithm::XChaCha20Poly1305,
                actual: key.len(),
                accepted: CipherAlgorithm::XChaCha20Poly1305.accepted_key_sizes(),
            })
    }
}

impl BlockCipherProvider for XChaChaProvider {
    fn algorithm(&self) -> CipherAlgorithm {
        CipherAlgorithm::XChaCha20Poly1305
    }

    fn encrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag_out: &mut [u8]) -> Result<(), CryptoError> {
        seal_detached(&self.0, nonce, aad, buf, tag_out)
    }

    fn decrypt_block(&self, nonce: &[u8], aad: &[u8], buf: &mut [u8], tag: &[u8]) -> Result<(), CryptoError> {
        open_detached(&self.0, nonce, aad, buf, tag)
    }
}

impl CipherAlgorithm {
    /// Build the provider for this algorithm from final key bytes.
    pub fn provider(&self, key: &[u8]) -> Result<Box<dyn BlockCipherProvider>, CryptoError> {
        Ok(match self {
            CipherAlgorithm::AesGcm => Box::new(AesGcmProvider::new(key)?),
            CipherAlgorithm::ChaCha20Poly1305 => Box::new(ChaChaProvider::new(key)?),
            CipherAlgorithm::XChaCha20Poly1305 => Box::new(XChaChaProvider::new(key)?),
        })
    }
}
