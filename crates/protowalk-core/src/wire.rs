//! Low-level protobuf wire format reading.
//!
//! [`read_field`] decodes exactly one field (header + value) from the front of
//! a slice. Length-delimited values are returned as sub-slices of the input,
//! so nothing is copied at this layer.
//!
//! ## Wire Format Overview
//!
//! Each protobuf field is encoded as:
//! - A varint header containing the tag number and wire type
//! - The field data (format depends on wire type)
//!
//! Wire types:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields)
//! - 3, 4: SGROUP / EGROUP (deprecated, recognized but never decoded)
//! - 5: I32 (fixed32, sfixed32, float)

use crate::error::{DecodeErrorKind, WireError};

/// Protobuf wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Variable-length integer
    Varint = 0,
    /// 64-bit fixed-width
    I64 = 1,
    /// Length-delimited (strings, bytes, embedded messages)
    Len = 2,
    /// Start group (deprecated)
    StartGroup = 3,
    /// End group (deprecated)
    EndGroup = 4,
    /// 32-bit fixed-width
    I32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::I32),
            other => Err(other),
        }
    }
}

/// Varints are at most 10 bytes for a 64-bit value
const MAX_VARINT_LEN: usize = 10;

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    /// Wire type 0
    Varint(u64),
    /// Wire type 1, little-endian
    Fixed64(u64),
    /// Wire type 2, a view into the input buffer
    Len(&'a [u8]),
    /// Wire type 5, little-endian
    Fixed32(u32),
}

impl<'a> WireValue<'a> {
    /// Returns the integer carried by a varint or fixed-width value
    pub fn scalar(&self) -> Option<u64> {
        match *self {
            WireValue::Varint(v) | WireValue::Fixed64(v) => Some(v),
            WireValue::Fixed32(v) => Some(u64::from(v)),
            WireValue::Len(_) => None,
        }
    }

    /// Returns the payload of a length-delimited value
    pub fn bytes(&self) -> Option<&'a [u8]> {
        match *self {
            WireValue::Len(b) => Some(b),
            _ => None,
        }
    }

    /// The wire type this value was encoded with
    pub fn wire_type(&self) -> WireType {
        match self {
            WireValue::Varint(_) => WireType::Varint,
            WireValue::Fixed64(_) => WireType::I64,
            WireValue::Len(_) => WireType::Len,
            WireValue::Fixed32(_) => WireType::I32,
        }
    }
}

/// One decoded (tag, value) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField<'a> {
    /// Tag number, never 0
    pub tag: u32,
    /// The decoded value
    pub value: WireValue<'a>,
    /// Offset of the value (for `Len`, the payload) from the start of the field
    pub value_offset: usize,
    /// Total bytes consumed, always > 0
    pub len: usize,
}

/// Decode a varint from the given bytes.
///
/// Returns the decoded value and the number of bytes consumed. Errors are
/// positioned at the first byte of the varint.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(WireError::new(0, DecodeErrorKind::VarintOverflow));
        }

        result |= ((byte & 0x7F) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    if data.len() >= MAX_VARINT_LEN {
        Err(WireError::new(0, DecodeErrorKind::VarintOverflow))
    } else {
        Err(WireError::new(0, DecodeErrorKind::Truncated))
    }
}

/// Decode exactly one field from the front of `data`.
///
/// Error offsets are relative to `data`: 0 for a bad or truncated header, the
/// header length for a value that cannot be read.
pub fn read_field(data: &[u8]) -> Result<WireField<'_>, WireError> {
    let (header, header_len) = decode_varint(data)?;

    let wire_bits = (header & 0x07) as u8;
    let tag = header >> 3;
    if tag == 0 {
        return Err(WireError::new(
            0,
            DecodeErrorKind::InvalidTag {
                wire_type: wire_bits,
            },
        ));
    }
    // Out-of-range tags can never match a known field; saturate so they are skipped.
    let tag = u32::try_from(tag).unwrap_or(u32::MAX);

    let unsupported = WireError::new(
        0,
        DecodeErrorKind::UnsupportedWireType {
            tag,
            wire_type: wire_bits,
        },
    );
    let wire_type = WireType::try_from(wire_bits).map_err(|_| unsupported)?;

    let rest = &data[header_len..];
    let lift = |e: WireError| WireError::new(header_len + e.offset, e.kind);
    let truncated = WireError::new(header_len, DecodeErrorKind::Truncated);

    let (value, value_offset, len) = match wire_type {
        WireType::Varint => {
            let (v, n) = decode_varint(rest).map_err(lift)?;
            (WireValue::Varint(v), header_len, header_len + n)
        }
        WireType::I32 => {
            let bytes: [u8; 4] = rest
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or(truncated)?;
            (
                WireValue::Fixed32(u32::from_le_bytes(bytes)),
                header_len,
                header_len + 4,
            )
        }
        WireType::I64 => {
            let bytes: [u8; 8] = rest
                .get(..8)
                .and_then(|b| b.try_into().ok())
                .ok_or(truncated)?;
            (
                WireValue::Fixed64(u64::from_le_bytes(bytes)),
                header_len,
                header_len + 8,
            )
        }
        WireType::Len => {
            let (length, prefix_len) = decode_varint(rest).map_err(lift)?;
            let payload = usize::try_from(length)
                .ok()
                .and_then(|length| rest.get(prefix_len..prefix_len.checked_add(length)?))
                .ok_or(truncated)?;
            let start = header_len + prefix_len;
            (WireValue::Len(payload), start, start + payload.len())
        }
        WireType::StartGroup | WireType::EndGroup => return Err(unsupported),
    };

    Ok(WireField {
        tag,
        value,
        value_offset,
        len,
    })
}

/// Iterator over the fields of a slice, front to back.
///
/// Yields each field with its offset in the slice. The first error is yielded
/// with its offset translated to the slice, after which iteration stops.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    data: &'a [u8],
    position: usize,
    failed: bool,
}

/// Iterate over the wire fields of `data`
pub fn fields(data: &[u8]) -> Fields<'_> {
    Fields {
        data,
        position: 0,
        failed: false,
    }
}

impl<'a> Fields<'a> {
    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Result<(usize, WireField<'a>), WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }

        let start = self.position;
        match read_field(&self.data[start..]) {
            Ok(field) => {
                self.position += field.len;
                Some(Ok((start, field)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(WireError::new(start + e.offset, e.kind)))
            }
        }
    }
}

impl std::iter::FusedIterator for Fields<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_varint_single_byte() {
        let data = [0x08]; // Value 8
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 8);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_decode_varint_multi_byte() {
        let data = [0xAC, 0x02]; // Value 300
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, 300);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_decode_varint_max() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let (value, len) = decode_varint(&data).unwrap();
        assert_eq!(value, u64::MAX);
        assert_eq!(len, 10);
    }

    #[test]
    fn test_decode_varint_truncated() {
        let err = decode_varint(&[0x96]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Truncated);
        assert_eq!(decode_varint(&[]).unwrap_err().kind, DecodeErrorKind::Truncated);
    }

    #[test]
    fn test_decode_varint_overflow() {
        let err = decode_varint(&[0xFF; 11]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::VarintOverflow);
    }

    #[test]
    fn test_wire_type_conversion() {
        assert_eq!(WireType::try_from(0).unwrap(), WireType::Varint);
        assert_eq!(WireType::try_from(1).unwrap(), WireType::I64);
        assert_eq!(WireType::try_from(2).unwrap(), WireType::Len);
        assert_eq!(WireType::try_from(5).unwrap(), WireType::I32);
        assert_eq!(WireType::try_from(6), Err(6));
    }

    #[test]
    fn test_read_varint_field() {
        // Field 1, wire type 0 (varint), value 150
        let data = [0x08, 0x96, 0x01];
        let field = read_field(&data).unwrap();
        assert_eq!(field.tag, 1);
        assert_eq!(field.value, WireValue::Varint(150));
        assert_eq!(field.len, 3);
    }

    #[test]
    fn test_read_len_field() {
        // Field 1, wire type 2 (len), length 5, "hello"
        let data = [0x0A, 0x05, b'h', b'e', b'l', b'l', b'o', 0xFF];
        let field = read_field(&data).unwrap();
        assert_eq!(field.tag, 1);
        assert_eq!(field.value.bytes(), Some(&b"hello"[..]));
        assert_eq!(field.value_offset, 2);
        assert_eq!(field.len, 7);
    }

    #[test]
    fn test_read_len_field_is_a_view() {
        let data = [0x0A, 0x02, b'h', b'i'];
        let field = read_field(&data).unwrap();
        let payload = field.value.bytes().unwrap();
        assert!(std::ptr::eq(payload.as_ptr(), data[2..].as_ptr()));
    }

    #[test]
    fn test_read_fixed32_field() {
        // Field 1, wire type 5 (I32), 4 bytes
        let data = [0x0D, 0x01, 0x02, 0x03, 0x04];
        let field = read_field(&data).unwrap();
        assert_eq!(field.value, WireValue::Fixed32(0x0403_0201));
        assert_eq!(field.len, 5);
    }

    #[test]
    fn test_read_fixed64_field() {
        // Field 1, wire type 1 (I64), 8 bytes
        let data = [0x09, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let field = read_field(&data).unwrap();
        assert_eq!(field.value, WireValue::Fixed64(0x0807_0605_0403_0201));
        assert_eq!(field.value.scalar(), Some(0x0807_0605_0403_0201));
        assert_eq!(field.len, 9);
    }

    #[test]
    fn test_short_fixed_fields() {
        let err = read_field(&[0x0D, 0x01, 0x02]).unwrap_err();
        assert_eq!(err, WireError::new(1, DecodeErrorKind::Truncated));

        let err = read_field(&[0x09, 0x01, 0x02, 0x03, 0x04]).unwrap_err();
        assert_eq!(err, WireError::new(1, DecodeErrorKind::Truncated));
    }

    #[test]
    fn test_short_len_field() {
        // Declares 5 bytes, carries 2
        let err = read_field(&[0x0A, 0x05, b'h', b'i']).unwrap_err();
        assert_eq!(err, WireError::new(1, DecodeErrorKind::Truncated));

        // Length prefix itself cut off
        let err = read_field(&[0x12, 0x80]).unwrap_err();
        assert_eq!(err, WireError::new(1, DecodeErrorKind::Truncated));
    }

    #[test]
    fn test_huge_len_is_truncation() {
        let mut data = vec![0x0A];
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        let err = read_field(&data).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Truncated);
    }

    #[test]
    fn test_tag_zero_is_invalid() {
        // Header 0x02: tag 0, wire type 2. Must not be treated as a LEN field.
        let err = read_field(&[0x02, 0x01, 0x00]).unwrap_err();
        assert_eq!(err, WireError::new(0, DecodeErrorKind::InvalidTag { wire_type: 2 }));

        let err = read_field(&[0x00]).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::InvalidTag { wire_type: 0 });
    }

    #[test]
    fn test_group_wire_types_rejected() {
        for header in [0x0B_u8, 0x0C, 0x0E, 0x0F] {
            let err = read_field(&[header, 0x00]).unwrap_err();
            assert_eq!(err.offset, 0);
            assert!(matches!(
                err.kind,
                DecodeErrorKind::UnsupportedWireType { tag: 1, .. }
            ));
        }
    }

    #[test]
    fn test_fields_iterator() {
        let data = [0x08, 0x01, 0x12, 0x01, b'a', 0x18, 0x02];
        let offsets: Vec<usize> = fields(&data).map(|f| f.unwrap().0).collect();
        assert_eq!(offsets, vec![0, 2, 5]);
    }

    #[test]
    fn test_fields_iterator_stops_after_error() {
        let data = [0x08, 0x01, 0x00, 0x08, 0x01];
        let mut iter = fields(&data);
        assert!(iter.next().unwrap().is_ok());
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(iter.next().is_none());
        assert_eq!(iter.position(), 2);
    }
}
