// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-describing type-tagged values.

use crate::cdr::{self, CdrDecoder, CdrEncoder, DecodeLimits};
use crate::error::CdrError;
use crate::types::TypeDescriptor;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A type descriptor paired with a standalone CDR encapsulation.
///
/// An `Any` may carry no value at all (the "no value yet" state). The
/// encoding is shared between clones; [`Any::deep_copy`] makes an
/// independent buffer.
#[derive(Clone)]
pub struct Any {
    type_desc: Arc<TypeDescriptor>,
    bytes: Option<Arc<[u8]>>,
}

impl Any {
    /// Encode `value` as an instance of `type_desc`.
    pub fn new(type_desc: Arc<TypeDescriptor>, value: &Value) -> Result<Self, CdrError> {
        let bytes = cdr::encode(value, &type_desc)?;
        Ok(Self {
            type_desc,
            bytes: Some(bytes.into()),
        })
    }

    /// An `Any` of `type_desc` with no value.
    pub fn empty(type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            type_desc,
            bytes: None,
        }
    }

    /// Wrap an existing encapsulation without validating it.
    pub fn from_encoded(type_desc: Arc<TypeDescriptor>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            type_desc,
            bytes: Some(bytes.into()),
        }
    }

    /// Read one value of `type_desc` out of a larger stream.
    pub fn read_from(
        decoder: &mut CdrDecoder<'_>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Result<Self, CdrError> {
        let value = decoder.decode_value(&type_desc)?;
        Self::new(type_desc, &value)
    }

    pub fn type_desc(&self) -> &Arc<TypeDescriptor> {
        &self.type_desc
    }

    pub fn has_value(&self) -> bool {
        self.bytes.is_some()
    }

    /// The raw encapsulation, if any.
    pub fn encoded(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Decode the carried value.
    pub fn value(&self) -> Result<Value, CdrError> {
        self.value_with_limits(DecodeLimits::default())
    }

    pub fn value_with_limits(&self, limits: DecodeLimits) -> Result<Value, CdrError> {
        let bytes = self
            .bytes
            .as_deref()
            .ok_or_else(|| CdrError::InvalidData("any carries no value".into()))?;
        cdr::decode_with_limits(bytes, &self.type_desc, limits)
    }

    /// Append the carried value to a larger stream.
    pub fn write_to(&self, encoder: &mut CdrEncoder) -> Result<(), CdrError> {
        let bytes = self
            .bytes
            .as_deref()
            .ok_or_else(|| CdrError::InvalidData("any carries no value".into()))?;
        encoder.write_encapsulated(bytes, &self.type_desc)
    }

    /// Copy with a private encoding buffer.
    pub fn deep_copy(&self) -> Self {
        Self {
            type_desc: Arc::clone(&self.type_desc),
            bytes: self.bytes.as_deref().map(Arc::from),
        }
    }

    /// Whether both carry the very same encoding buffer.
    pub fn shares_encoding_with(&self, other: &Any) -> bool {
        match (&self.bytes, &other.bytes) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        *self.type_desc == *other.type_desc && self.encoded() == other.encoded()
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Any")
            .field("type", &self.type_desc.name)
            .field("len", &self.bytes.as_ref().map(|b| b.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn long() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32))
    }

    #[test]
    fn test_value_round_trip() {
        let any = Any::new(long(), &Value::I32(-5)).expect("encode");
        assert!(any.has_value());
        assert_eq!(any.value().expect("decode"), Value::I32(-5));
    }

    #[test]
    fn test_empty_has_no_value() {
        let any = Any::empty(long());
        assert!(!any.has_value());
        assert!(any.value().is_err());
        assert_ne!(any, Any::new(long(), &Value::I32(0)).expect("encode"));
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        assert!(Any::new(long(), &Value::Bool(true)).is_err());
    }

    #[test]
    fn test_clone_shares_deep_copy_does_not() {
        let any = Any::new(long(), &Value::I32(1)).expect("encode");
        let shallow = any.clone();
        let deep = any.deep_copy();
        assert!(any.shares_encoding_with(&shallow));
        assert!(!any.shares_encoding_with(&deep));
        assert_eq!(any, deep);
    }

    #[test]
    fn test_read_from_stream() {
        let mut encoder = CdrEncoder::new();
        encoder
            .encode_value(&Value::U8(1), &Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U8)))
            .expect("u8");
        encoder.encode_value(&Value::I32(77), &long()).expect("i32");
        let bytes = encoder.into_bytes();

        let mut decoder = CdrDecoder::new(&bytes);
        let _ = decoder
            .decode_value(&Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U8)))
            .expect("u8");
        let any = Any::read_from(&mut decoder, long()).expect("read");
        assert_eq!(any.encoded(), Some(&77i32.to_le_bytes()[..]));
    }

    #[test]
    fn test_write_to_stream() {
        let octet = Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U8));
        let any = Any::new(long(), &Value::I32(77)).expect("encode");

        let mut encoder = CdrEncoder::new();
        encoder.encode_value(&Value::U8(1), &octet).expect("u8");
        any.write_to(&mut encoder).expect("write");
        let bytes = encoder.into_bytes();
        assert_eq!(bytes, [1, 0, 0, 0, 77, 0, 0, 0]);

        let mut decoder = CdrDecoder::new(&bytes);
        decoder.decode_value(&octet).expect("u8");
        assert_eq!(Any::read_from(&mut decoder, long()).expect("read"), any);

        let mut encoder = CdrEncoder::new();
        assert!(Any::empty(long()).write_to(&mut encoder).is_err());
        assert!(encoder.is_empty());
    }
}
