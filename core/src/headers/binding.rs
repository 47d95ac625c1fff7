// ## 📂 File: `src/headers/binding.rs`

//! headers/binding.rs
//! Nonce-bound integrity salt.
//!
//! The header's `integritySalt` is BLAKE3 (derive-key mode, fixed context) over
//! the nonce, stretched to the configured width with the XOF. It is keyless: a
//! reader can recompute it from the header alone and reject a corrupted or
//! spliced header before paying for Argon2id.

use subtle::ConstantTimeEq;

use crate::constants::contexts;

/// Derive the integrity salt for `nonce`, `len` bytes wide.
pub fn bind_salt(nonce: &[u8], len: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new_derive_key(contexts::INTEGRITY_SALT);
    hasher.update(nonce);

    let mut out = vec![0u8; len];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// Constant-time check of a stored salt against the recomputed one.
pub fn verify_salt(nonce: &[u8], stored: &[u8]) -> Result<(), Vec<u8>> {
    let computed = bind_salt(nonce, stored.len());
    if bool::from(computed.as_slice().ct_eq(stored)) {
        Ok(())
    } else {
        Err(computed)
    }
}
