// ## 📂 File: `src/crypto/mod.rs`

//! crypto/mod.rs
//! AEAD providers, key establishment, and the per-block AAD/nonce schedule.

pub mod aad;
pub mod aead;
pub mod kdf;
pub mod keys;
pub mod nonce;
pub mod types;

pub use aad::*;
pub use aead::*;
pub use kdf::*;
pub use keys::*;
pub use nonce::*;
pub use types::*;
