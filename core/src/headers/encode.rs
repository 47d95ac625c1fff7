// ## 📂 File: `src/headers/encode.rs`
//! src/headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - Serializes a `ContainerHeader` into a caller-sized scratch buffer so the
//!   alignment policy decides the on-disk header size.
//! - The buffer is cleared first; bytes past the unaligned length stay zero.
//! - Field order must match `types.rs` layout exactly.

use byteorder::{ByteOrder, LittleEndian};

use crate::headers::types::{ContainerHeader, HeaderError};

/// Serialize `h` into `out`, zero-filling every byte not covered by a field.
///
/// # Returns
/// - `Ok(n)` with the number of meaningful (unpadded) bytes written.
/// - `Err(HeaderError::BufferTooShort)` if `out` cannot hold the layout.
/// - `Err(HeaderError::NegativeOriginalSize)` for a negative size.
pub fn encode_header_into(h: &ContainerHeader, out: &mut [u8]) -> Result<usize, HeaderError> {
    let layout = h.layout();
    let need = layout.unaligned_len();
    if out.len() < need {
        return Err(HeaderError::BufferTooShort { have: out.len(), need });
    }
    if h.original_size < 0 {
        return Err(HeaderError::NegativeOriginalSize { value: h.original_size });
    }

    out.fill(0);
    let mut i = 0usize;

    fn put_bytes(out: &mut [u8], i: &mut usize, b: &[u8]) {
        out[*i..*i + b.len()].copy_from_slice(b);
        *i += b.len();
    }
    fn put_i64(out: &mut [u8], i: &mut usize, v: i64) {
        LittleEndian::write_i64(&mut out[*i..*i + 8], v);
        *i += 8;
    }

    put_bytes(out, &mut i, &h.version.to_bytes()); // 0..2        major, minor
    put_bytes(out, &mut i, &h.nonce);              // 2..2+N      nonce
    put_i64(out, &mut i, h.original_size);         // ..+8        original size
    put_bytes(out, &mut i, &h.integrity_salt);     // ..+S        integrity salt
    put_bytes(out, &mut i, &h.kdf_salt);           // ..+16       kdf salt

    debug_assert_eq!(i, need, "encoding wrote incorrect length");
    Ok(i)
}

/// Serialize `h` into a fresh buffer of `metadata_size` bytes.
pub fn encode_header(h: &ContainerHeader, metadata_size: usize) -> Result<Vec<u8>, HeaderError> {
    let mut out = vec![0u8; metadata_size];
    encode_header_into(h, &mut out)?;
    Ok(out)
}
