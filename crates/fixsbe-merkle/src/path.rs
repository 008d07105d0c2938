//! Canonical CBOR encoding of integer-only leaf paths.
//!
//! The encoding is the RFC 8949 deterministic subset restricted to the
//! unsigned-integer major type and definite-length arrays: every integer
//! in its smallest form, big-endian multi-byte arguments, no tags, no
//! indefinite lengths. It is the canonicalization point that defeats
//! path-substitution attacks, so it must stay byte-exact with the
//! verifier's expectations.
//!
//! A decoder is provided so the canonicity property
//! (`decode(encode(p)) == p`) is testable; production code only encodes.

use thiserror::Error;

/// Path element or decoding failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A negative integer can never appear in a leaf path.
    #[error("negative integer {0} in path")]
    Negative(i64),
    /// Path elements are capped at `u32::MAX` by the wire format.
    #[error("path element {0} exceeds u32::MAX")]
    TooLarge(i64),
    /// Decode: input ended before the declared content.
    #[error("truncated path encoding")]
    Truncated,
    /// Decode: byte sequence is valid CBOR but not the canonical subset.
    #[error("non-canonical or unsupported path encoding at byte {0}")]
    NonCanonical(usize),
}

const MAJOR_UINT: u8 = 0x00;
const MAJOR_ARRAY: u8 = 0x80;

/// Encode a path as canonical CBOR bytes.
///
/// Array header `0x80|len` below 24 elements, then `0x98 len:u8` up to
/// 255, then `0x99 len:u16`; each element in its smallest unsigned form.
#[must_use]
pub fn encode_path(path: &[u32]) -> Vec<u8> {
    // 1 header byte + up to 5 bytes per element covers every case below
    // the u16 length header.
    let mut out = Vec::with_capacity(3 + path.len() * 5);
    write_head(&mut out, MAJOR_ARRAY, path.len() as u64);
    for &elem in path {
        write_head(&mut out, MAJOR_UINT, u64::from(elem));
    }
    out
}

/// Convert caller-supplied signed integers (e.g. from JSON) into path
/// elements, rejecting negatives and out-of-range values.
pub fn path_from_signed(path: &[i64]) -> Result<Vec<u32>, PathError> {
    path.iter()
        .map(|&v| {
            if v < 0 {
                Err(PathError::Negative(v))
            } else {
                u32::try_from(v).map_err(|_| PathError::TooLarge(v))
            }
        })
        .collect()
}

/// Decode canonical path bytes back into integers.
///
/// Rejects anything outside the canonical subset, including oversized
/// argument forms (e.g. `0x18 17` for a value below 24).
pub fn decode_path(bytes: &[u8]) -> Result<Vec<u32>, PathError> {
    let mut pos = 0usize;
    let (len, major) = read_head(bytes, &mut pos)?;
    if major != MAJOR_ARRAY {
        return Err(PathError::NonCanonical(0));
    }
    let mut out = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let start = pos;
        let (value, major) = read_head(bytes, &mut pos)?;
        if major != MAJOR_UINT {
            return Err(PathError::NonCanonical(start));
        }
        let elem = u32::try_from(value).map_err(|_| PathError::NonCanonical(start))?;
        out.push(elem);
    }
    if pos != bytes.len() {
        return Err(PathError::NonCanonical(pos));
    }
    Ok(out)
}

fn write_head(out: &mut Vec<u8>, major: u8, arg: u64) {
    if arg < 24 {
        out.push(major | arg as u8);
    } else if arg < 0x100 {
        out.push(major | 24);
        out.push(arg as u8);
    } else if arg < 0x1_0000 {
        out.push(major | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else {
        // Leaf paths never exceed u32 on the wire.
        out.push(major | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    }
}

fn read_head(bytes: &[u8], pos: &mut usize) -> Result<(u64, u8), PathError> {
    let start = *pos;
    let first = *bytes.get(*pos).ok_or(PathError::Truncated)?;
    *pos += 1;
    let major = first & 0xE0;
    let info = first & 0x1F;
    let (value, min) = match info {
        n @ 0..=23 => (u64::from(n), 0u64),
        24 => (u64::from(take::<1>(bytes, pos)?[0]), 24),
        25 => (
            u64::from(u16::from_be_bytes(take::<2>(bytes, pos)?)),
            0x100,
        ),
        26 => (
            u64::from(u32::from_be_bytes(take::<4>(bytes, pos)?)),
            0x1_0000,
        ),
        _ => return Err(PathError::NonCanonical(start)),
    };
    // Smallest-form rule: an argument below the threshold of its form is
    // valid CBOR but not canonical.
    if value < min {
        return Err(PathError::NonCanonical(start));
    }
    Ok((value, major))
}

fn take<const N: usize>(bytes: &[u8], pos: &mut usize) -> Result<[u8; N], PathError> {
    let end = pos.checked_add(N).ok_or(PathError::Truncated)?;
    let slice = bytes.get(*pos..end).ok_or(PathError::Truncated)?;
    *pos = end;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_vectors() {
        assert_eq!(encode_path(&[55]), vec![0x81, 0x18, 0x37]);
        assert_eq!(
            encode_path(&[454, 0, 455]),
            vec![0x83, 0x19, 0x01, 0xC6, 0x00, 0x19, 0x01, 0xC7]
        );
        assert_eq!(encode_path(&[541]), vec![0x81, 0x19, 0x02, 0x1D]);
        assert_eq!(encode_path(&[223]), vec![0x81, 0x18, 0xDF]);
    }

    #[test]
    fn smallest_form_boundaries() {
        assert_eq!(encode_path(&[23]), vec![0x81, 0x17]);
        assert_eq!(encode_path(&[24]), vec![0x81, 0x18, 0x18]);
        assert_eq!(encode_path(&[255]), vec![0x81, 0x18, 0xFF]);
        assert_eq!(encode_path(&[256]), vec![0x81, 0x19, 0x01, 0x00]);
        assert_eq!(encode_path(&[65535]), vec![0x81, 0x19, 0xFF, 0xFF]);
        assert_eq!(encode_path(&[65536]), vec![0x81, 0x1A, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(
            encode_path(&[u32::MAX]),
            vec![0x81, 0x1A, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn long_array_headers() {
        let path: Vec<u32> = (0..24).collect();
        let bytes = encode_path(&path);
        assert_eq!(&bytes[..2], &[0x98, 24]);
        assert_eq!(decode_path(&bytes).unwrap(), path);

        let path: Vec<u32> = (0..300).collect();
        let bytes = encode_path(&path);
        assert_eq!(&bytes[..3], &[0x99, 0x01, 0x2C]);
        assert_eq!(decode_path(&bytes).unwrap(), path);
    }

    #[test]
    fn signed_conversion_rejects_negatives() {
        assert_eq!(path_from_signed(&[-1]), Err(PathError::Negative(-1)));
        assert_eq!(
            path_from_signed(&[i64::from(u32::MAX) + 1]),
            Err(PathError::TooLarge(i64::from(u32::MAX) + 1))
        );
        assert_eq!(path_from_signed(&[454, 0, 455]), Ok(vec![454, 0, 455]));
    }

    #[test]
    fn decoder_rejects_non_canonical_forms() {
        // 0x18 0x17 encodes 23 in the oversized one-byte-argument form.
        assert_eq!(
            decode_path(&[0x81, 0x18, 0x17]),
            Err(PathError::NonCanonical(1))
        );
        // Trailing garbage after the declared array.
        assert_eq!(
            decode_path(&[0x81, 0x05, 0x00]),
            Err(PathError::NonCanonical(2))
        );
        // Truncated element.
        assert_eq!(decode_path(&[0x82, 0x05]), Err(PathError::Truncated));
        // Text-string major type.
        assert_eq!(
            decode_path(&[0x81, 0x61, 0x41]),
            Err(PathError::NonCanonical(1))
        );
    }
}
