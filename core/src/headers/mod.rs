// ## 📂 File: `src/headers/mod.rs`

//! headers/mod.rs
//! Container header: version prefix, fixed-offset fields, integrity binding.
//!
//! Industry notes:
//! - The header is not encrypted. Its fields are bound into every block through
//!   the AAD salt slot and the per-block nonce schedule.
//! - `integritySalt` is a keyless checksum of the nonce, so corruption is caught
//!   before the expensive key derivation.
//! - Little-endian across all multi-byte integers.

pub mod binding;
pub mod decode;
pub mod encode;
pub mod types;
pub mod version;

pub use binding::*;
pub use decode::*;
pub use encode::*;
pub use types::*;
pub use version::*;
