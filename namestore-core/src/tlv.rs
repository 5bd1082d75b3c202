//! NDN TLV primitives: variable-size numbers and TLV block parsing.
//!
//! Type and length fields use the 1/3/5/9-byte variable-size encoding.
//! Parsing rejects non-minimal encodings so that every value has exactly
//! one wire form.

use crate::error::CodecError;

/// A parsed TLV block borrowing its value from the input buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub typ: u64,
    pub value: &'a [u8],
    /// Total encoded size of the block, including type and length fields.
    pub span: usize,
}

/// Number of bytes the variable-size encoding of `value` occupies.
pub fn var_number_length(value: u64) -> usize {
    if value <= 252 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Append the variable-size encoding of `value` to `buf`.
pub fn write_var_number(buf: &mut Vec<u8>, value: u64) {
    if value <= 252 {
        buf.push(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.push(253);
        buf.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        buf.push(254);
        buf.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        buf.push(255);
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

/// Parse a variable-size number at `offset`, returning the value and the
/// number of bytes consumed.
pub fn parse_var_number(bytes: &[u8], offset: usize) -> Result<(u64, usize), CodecError> {
    let first = *bytes.get(offset).ok_or(CodecError::Truncated)?;
    match first {
        0..=252 => Ok((first as u64, 1)),
        253 => {
            let raw: [u8; 2] = bytes
                .get(offset + 1..offset + 3)
                .ok_or(CodecError::Truncated)?
                .try_into()
                .map_err(|_| CodecError::Truncated)?;
            let value = u16::from_be_bytes(raw) as u64;
            if value <= 252 {
                return Err(CodecError::NonMinimalNumber);
            }
            Ok((value, 3))
        }
        254 => {
            let raw: [u8; 4] = bytes
                .get(offset + 1..offset + 5)
                .ok_or(CodecError::Truncated)?
                .try_into()
                .map_err(|_| CodecError::Truncated)?;
            let value = u32::from_be_bytes(raw) as u64;
            if value <= u16::MAX as u64 {
                return Err(CodecError::NonMinimalNumber);
            }
            Ok((value, 5))
        }
        255 => {
            let raw: [u8; 8] = bytes
                .get(offset + 1..offset + 9)
                .ok_or(CodecError::Truncated)?
                .try_into()
                .map_err(|_| CodecError::Truncated)?;
            let value = u64::from_be_bytes(raw);
            if value <= u32::MAX as u64 {
                return Err(CodecError::NonMinimalNumber);
            }
            Ok((value, 9))
        }
    }
}

/// Parse one TLV block starting at `offset`.
pub fn parse_tlv(bytes: &[u8], offset: usize) -> Result<Tlv<'_>, CodecError> {
    let (typ, typ_len) = parse_var_number(bytes, offset)?;
    let (len, len_len) = parse_var_number(bytes, offset + typ_len)?;
    let len: usize = len.try_into().map_err(|_| CodecError::Truncated)?;
    let value_start = offset + typ_len + len_len;
    // the declared length comes off the wire and can exceed usize arithmetic
    let value_end = value_start.checked_add(len).ok_or(CodecError::Truncated)?;
    let value = bytes
        .get(value_start..value_end)
        .ok_or(CodecError::Truncated)?;
    Ok(Tlv {
        typ,
        value,
        span: typ_len + len_len + len,
    })
}

/// Append a complete TLV block with the given type and value to `buf`.
pub fn write_tlv(buf: &mut Vec<u8>, typ: u64, value: &[u8]) {
    write_var_number(buf, typ);
    write_var_number(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

/// Decode an NDN nonNegativeInteger field (1, 2, 4 or 8 bytes, big-endian).
pub fn parse_nonneg_integer(value: &[u8]) -> Result<u64, CodecError> {
    match value.len() {
        1 => Ok(value[0] as u64),
        2 => Ok(u16::from_be_bytes(value.try_into().unwrap()) as u64),
        4 => Ok(u32::from_be_bytes(value.try_into().unwrap()) as u64),
        8 => Ok(u64::from_be_bytes(value.try_into().unwrap())),
        n => Err(CodecError::InvalidIntegerLength(n)),
    }
}

/// Encode an NDN nonNegativeInteger in its shortest permitted width.
pub fn encode_nonneg_integer(value: u64) -> Vec<u8> {
    if value <= u8::MAX as u64 {
        vec![value as u8]
    } else if value <= u16::MAX as u64 {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= u32::MAX as u64 {
        (value as u32).to_be_bytes().to_vec()
    } else {
        value.to_be_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_number_lengths() {
        for v in 0u64..=252 {
            assert_eq!(var_number_length(v), 1);
        }
        assert_eq!(var_number_length(253), 3);
        assert_eq!(var_number_length(65535), 3);
        assert_eq!(var_number_length(65536), 5);
        assert_eq!(var_number_length(4294967295), 5);
        assert_eq!(var_number_length(4294967296), 9);
    }

    #[test]
    fn var_number_roundtrip() {
        for v in [0u64, 1, 252, 253, 254, 300, 65535, 65536, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_var_number(&mut buf, v);
            assert_eq!(buf.len(), var_number_length(v));
            let (parsed, consumed) = parse_var_number(&buf, 0).unwrap();
            assert_eq!(parsed, v);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn var_number_rejects_non_minimal() {
        // 1 encoded in the 3-byte form
        assert_eq!(
            parse_var_number(&[253, 0, 1], 0),
            Err(CodecError::NonMinimalNumber)
        );
        // 300 encoded in the 5-byte form
        assert_eq!(
            parse_var_number(&[254, 0, 0, 1, 44], 0),
            Err(CodecError::NonMinimalNumber)
        );
    }

    #[test]
    fn var_number_truncated() {
        assert_eq!(parse_var_number(&[], 0), Err(CodecError::Truncated));
        assert_eq!(parse_var_number(&[253, 1], 0), Err(CodecError::Truncated));
    }

    #[test]
    fn tlv_roundtrip() {
        let mut buf = Vec::new();
        write_tlv(&mut buf, 8, b"hello");
        let tlv = parse_tlv(&buf, 0).unwrap();
        assert_eq!(tlv.typ, 8);
        assert_eq!(tlv.value, b"hello");
        assert_eq!(tlv.span, buf.len());
    }

    #[test]
    fn tlv_truncated_value() {
        // declares 5 bytes of value but carries 2
        assert_eq!(parse_tlv(&[8, 5, 1, 2], 0), Err(CodecError::Truncated));
    }

    #[test]
    fn tlv_overlong_declared_length() {
        // a declared length near u64::MAX must error, never overflow
        let mut buf = vec![6, 255];
        buf.extend_from_slice(&u64::MAX.to_be_bytes());
        assert_eq!(parse_tlv(&buf, 0), Err(CodecError::Truncated));
    }

    #[test]
    fn nonneg_integer_widths() {
        assert_eq!(parse_nonneg_integer(&[7]).unwrap(), 7);
        assert_eq!(parse_nonneg_integer(&[1, 0]).unwrap(), 256);
        assert_eq!(parse_nonneg_integer(&[0, 0, 1, 0]).unwrap(), 256);
        assert_eq!(
            parse_nonneg_integer(&[0, 0, 0, 0, 0, 0, 1, 0]).unwrap(),
            256
        );
        assert_eq!(
            parse_nonneg_integer(&[1, 2, 3]),
            Err(CodecError::InvalidIntegerLength(3))
        );
        for v in [0u64, 255, 256, 65536, 1 << 40] {
            assert_eq!(parse_nonneg_integer(&encode_nonneg_integer(v)).unwrap(), v);
        }
    }
}
