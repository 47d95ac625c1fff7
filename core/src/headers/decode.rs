// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header decoding.
//!
//! Design notes:
//! - Decoding is split in two: the 2-byte version prefix is validated before
//!   the rest of the metadata is even read.
//! - The body parser recomputes the nonce-bound integrity salt and rejects a
//!   mismatch before any key material is derived.
//! - Padding bytes are ignored.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{KDF_SALT_LEN, VERSION_PREFIX_LEN};
use crate::headers::binding::verify_salt;
use crate::headers::types::{ContainerHeader, HeaderError, HeaderLayout};
use crate::headers::version::{validate_version, FormatVersion};

/// Parse and validate the version prefix.
pub fn decode_version(prefix: &[u8]) -> Result<FormatVersion, HeaderError> {
    if prefix.len() < VERSION_PREFIX_LEN {
        return Err(HeaderError::BufferTooShort { have: prefix.len(), need: VERSION_PREFIX_LEN });
    }
    let version = FormatVersion::from_bytes([prefix[0], prefix[1]]);
    validate_version(version)?;
    Ok(version)
}

/// Parse a full header buffer (version prefix included) for `layout`.
///
/// The version is validated again here so this function is safe to call on
/// its own; the streaming reader validates it earlier via `decode_version`.
pub fn decode_header(buf: &[u8], layout: HeaderLayout) -> Result<ContainerHeader, HeaderError> {
    let need = layout.unaligned_len();
    if buf.len() < need {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need });
    }

    let version = decode_version(buf)?;

    let mut i = layout.nonce_offset();
    fn get_vec(buf: &[u8], i: &mut usize, n: usize) -> Vec<u8> {
        let v = buf[*i..*i + n].to_vec();
        *i += n;
        v
    }
    fn get_i64(buf: &[u8], i: &mut usize) -> i64 {
        let v = LittleEndian::read_i64(&buf[*i..*i + 8]);
        *i += 8;
        v
    }

    let nonce = get_vec(buf, &mut i, layout.nonce_len);
    let original_size = get_i64(buf, &mut i);
    let integrity_salt = get_vec(buf, &mut i, layout.integrity_salt_len);
    let mut kdf_salt = [0u8; KDF_SALT_LEN];
    kdf_salt.copy_from_slice(&buf[i..i + KDF_SALT_LEN]);
    i += KDF_SALT_LEN;
    debug_assert_eq!(i, need);

    if original_size < 0 {
        return Err(HeaderError::NegativeOriginalSize { value: original_size });
    }

    if let Err(computed) = verify_salt(&nonce, &integrity_salt) {
        return Err(HeaderError::IntegrityMismatch { stored: integrity_salt, computed });
    }

    Ok(ContainerHeader { version, nonce, original_size, integrity_salt, kdf_salt })
}
