// ## 📂 File: `src/crypto/aad.rs`

//! Block associated data.
//!
//! ```text
//! 0                 64                72                76
//! | integritySalt   | block index     | processingSize  |
//! | (pad/truncate)  | i64 LE          | u32 LE          |
//! ```
//!
//! Binding the salt ties every block to its header; the index blocks
//! reordering; the processing size blocks truncation inside a block.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{AAD_INDEX_LEN, AAD_SALT_LEN, BLOCK_AAD_LEN};

/// Fill `out` with the 76-byte AAD for one block.
#[inline]
pub fn build_block_aad_into(
    out: &mut [u8; BLOCK_AAD_LEN],
    integrity_salt: &[u8],
    block_index: i64,
    processing_size: u32,
) {
    out.fill(0);

    // 1️⃣ Salt slot: copy what fits, the rest stays zero
    let n = integrity_salt.len().min(AAD_SALT_LEN);
    out[..n].copy_from_slice(&integrity_salt[..n]);

    // 2️⃣ Block index
    LittleEndian::write_i64(&mut out[AAD_SALT_LEN..AAD_SALT_LEN + AAD_INDEX_LEN], block_index);

    // 3️⃣ Processing size
    LittleEndian::write_u32(&mut out[AAD_SALT_LEN + AAD_INDEX_LEN..], processing_size);
}

#[inline]
pub fn build_block_aad(integrity_salt: &[u8], block_index: i64, processing_size: u32) -> [u8; BLOCK_AAD_LEN] {
    let mut out = [0u8; BLOCK_AAD_LEN];
    build_block_aad_into(&mut out, integrity_salt, block_index, processing_size);
    out
}
