//! Wire fixtures for unit tests, written with prost's own encoder.

use prost::encoding::{encode_key, encode_varint, WireType};

pub(crate) fn varint(tag: u32, value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(tag, WireType::Varint, &mut buf);
    encode_varint(value, &mut buf);
    buf
}

pub(crate) fn len(tag: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(tag, WireType::LengthDelimited, &mut buf);
    encode_varint(payload.len() as u64, &mut buf);
    buf.extend_from_slice(payload);
    buf
}

pub(crate) fn fixed32(tag: u32, value: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(tag, WireType::ThirtyTwoBit, &mut buf);
    buf.extend_from_slice(&value.to_le_bytes());
    buf
}

pub(crate) fn fixed64(tag: u32, value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(tag, WireType::SixtyFourBit, &mut buf);
    buf.extend_from_slice(&value.to_le_bytes());
    buf
}
