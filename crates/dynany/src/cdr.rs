// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian CDR encoding/decoding for dynamic values.
//!
//! Each encapsulation aligns relative to its own first byte. Nested values
//! written through [`CdrEncoder::write_encapsulated`] are re-aligned to the
//! enclosing stream.

use crate::error::CdrError;
use crate::types::{
    PrimitiveKind, TypeDescriptor, TypeKind, LONG_DOUBLE_ALIGN, LONG_DOUBLE_SIZE,
};
use crate::value::Value;
use std::sync::Arc;

/// Tag written before a non-null value type or value box.
pub const VALUE_TAG: u32 = 0x7fff_ff00;

/// Tag written for a null value type or value box.
pub const NULL_TAG: u32 = 0;

/// Bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum nesting of constructed values.
    pub max_depth: usize,
    /// Maximum element count of a single sequence.
    pub max_collection_length: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_collection_length: 1 << 20,
        }
    }
}

/// Encode a value of `type_desc` into a fresh encapsulation.
pub fn encode(value: &Value, type_desc: &Arc<TypeDescriptor>) -> Result<Vec<u8>, CdrError> {
    let mut encoder = CdrEncoder::new();
    encoder.encode_value(value, type_desc)?;
    Ok(encoder.into_bytes())
}

/// Decode an encapsulation of `type_desc` with default limits.
pub fn decode(bytes: &[u8], type_desc: &Arc<TypeDescriptor>) -> Result<Value, CdrError> {
    decode_with_limits(bytes, type_desc, DecodeLimits::default())
}

/// Decode an encapsulation of `type_desc`.
pub fn decode_with_limits(
    bytes: &[u8],
    type_desc: &Arc<TypeDescriptor>,
    limits: DecodeLimits,
) -> Result<Value, CdrError> {
    let mut decoder = CdrDecoder::with_limits(bytes, limits);
    decoder.decode_value(type_desc)
}

fn real_type(type_desc: &Arc<TypeDescriptor>) -> Result<Arc<TypeDescriptor>, CdrError> {
    type_desc
        .resolved()
        .ok_or_else(|| CdrError::UnsupportedType(format!("unresolved type {}", type_desc.name)))
}

fn mismatch(expected: &str, found: &Value) -> CdrError {
    CdrError::TypeMismatch {
        expected: expected.into(),
        found: found.kind_name().into(),
    }
}

/// CDR encoder for dynamic values.
#[derive(Debug, Default)]
pub struct CdrEncoder {
    buffer: Vec<u8>,
}

impl CdrEncoder {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat_n(0, padding));
    }

    /// Write an aligned u32.
    pub fn write_u32(&mut self, v: u32) {
        self.align(4);
        self.buffer.extend(&v.to_le_bytes());
    }

    fn write_length(&mut self, len: usize) -> Result<(), CdrError> {
        let len = u32::try_from(len)
            .map_err(|_| CdrError::LimitExceeded(format!("length {len} does not fit in u32")))?;
        self.write_u32(len);
        Ok(())
    }

    /// Append a standalone encapsulation of `type_desc`, re-aligned to this stream.
    pub fn write_encapsulated(
        &mut self,
        bytes: &[u8],
        type_desc: &Arc<TypeDescriptor>,
    ) -> Result<(), CdrError> {
        let value = decode(bytes, type_desc)?;
        self.encode_value(&value, type_desc)
    }

    /// Encode `value` as an instance of `type_desc`.
    pub fn encode_value(
        &mut self,
        value: &Value,
        type_desc: &Arc<TypeDescriptor>,
    ) -> Result<(), CdrError> {
        let real = real_type(type_desc)?;
        match &real.kind {
            TypeKind::Primitive(p) => self.encode_primitive(value, *p),
            TypeKind::Struct(fields) | TypeKind::Exception(fields) => {
                let Value::Struct(members) = value else {
                    return Err(mismatch("struct", value));
                };
                if members.len() != fields.len() {
                    return Err(CdrError::InvalidData(format!(
                        "{} expects {} members, got {}",
                        real.name,
                        fields.len(),
                        members.len()
                    )));
                }
                for (field, member) in fields.iter().zip(members) {
                    self.encode_value(member, &field.type_desc)?;
                }
                Ok(())
            }
            TypeKind::Sequence(seq) => {
                let Value::Sequence(items) = value else {
                    return Err(mismatch("sequence", value));
                };
                if !seq.admits(items.len()) {
                    return Err(CdrError::InvalidData(format!(
                        "sequence length {} exceeds bound {}",
                        items.len(),
                        seq.max_length.unwrap_or(0)
                    )));
                }
                self.write_length(items.len())?;
                for item in items {
                    self.encode_value(item, &seq.element_type)?;
                }
                Ok(())
            }
            TypeKind::Array(arr) => {
                let Value::Array(items) = value else {
                    return Err(mismatch("array", value));
                };
                if items.len() != arr.length {
                    return Err(CdrError::InvalidData(format!(
                        "Array length mismatch: expected {}, got {}",
                        arr.length,
                        items.len()
                    )));
                }
                for item in items {
                    self.encode_value(item, &arr.element_type)?;
                }
                Ok(())
            }
            TypeKind::Enum(e) => {
                let Value::Enum(ordinal) = value else {
                    return Err(mismatch("enum", value));
                };
                if e.name_of(*ordinal).is_none() {
                    return Err(CdrError::InvalidData(format!(
                        "ordinal {ordinal} out of range for {}",
                        real.name
                    )));
                }
                self.write_u32(*ordinal);
                Ok(())
            }
            TypeKind::Union(u) => {
                let Value::Union {
                    discriminator,
                    member,
                } = value
                else {
                    return Err(mismatch("union", value));
                };
                let label = discriminator.to_label().ok_or_else(|| {
                    CdrError::InvalidData(format!(
                        "{} cannot discriminate a union",
                        discriminator.kind_name()
                    ))
                })?;
                self.encode_value(discriminator, &u.discriminator)?;
                match (u.case_index_for(label).and_then(|i| u.cases.get(i)), member) {
                    (Some(case), Some(member)) => self.encode_value(member, &case.type_desc),
                    (None, None) => Ok(()),
                    (Some(case), None) => Err(CdrError::InvalidData(format!(
                        "discriminator {label} selects {} but no member is present",
                        case.name
                    ))),
                    (None, Some(_)) => Err(CdrError::InvalidData(format!(
                        "discriminator {label} selects no member"
                    ))),
                }
            }
            TypeKind::ValueType(fields) => {
                let Value::ValueType(members) = value else {
                    return Err(mismatch("valuetype", value));
                };
                let Some(members) = members else {
                    self.write_u32(NULL_TAG);
                    return Ok(());
                };
                if members.len() != fields.len() {
                    return Err(CdrError::InvalidData(format!(
                        "{} expects {} members, got {}",
                        real.name,
                        fields.len(),
                        members.len()
                    )));
                }
                self.write_u32(VALUE_TAG);
                for (field, member) in fields.iter().zip(members) {
                    self.encode_value(member, &field.type_desc)?;
                }
                Ok(())
            }
            TypeKind::ValueBox(boxed) => {
                let Value::ValueBox(inner) = value else {
                    return Err(mismatch("valuebox", value));
                };
                match inner {
                    Some(inner) => {
                        self.write_u32(VALUE_TAG);
                        self.encode_value(inner, boxed)
                    }
                    None => {
                        self.write_u32(NULL_TAG);
                        Ok(())
                    }
                }
            }
            TypeKind::Alias(_) | TypeKind::Recursive(_) => {
                Err(CdrError::UnsupportedType(real.name.clone()))
            }
        }
    }

    fn encode_primitive(&mut self, value: &Value, kind: PrimitiveKind) -> Result<(), CdrError> {
        match (value, kind) {
            (Value::Bool(v), PrimitiveKind::Bool) => {
                self.buffer.push(u8::from(*v));
            }
            (Value::U8(v), PrimitiveKind::U8) => {
                self.buffer.push(*v);
            }
            (Value::U16(v), PrimitiveKind::U16) => {
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::U32(v), PrimitiveKind::U32) => {
                self.write_u32(*v);
            }
            (Value::U64(v), PrimitiveKind::U64) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::I8(v), PrimitiveKind::I8) => {
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::I16(v), PrimitiveKind::I16) => {
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::I32(v), PrimitiveKind::I32) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::I64(v), PrimitiveKind::I64) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::F32(v), PrimitiveKind::F32) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::F64(v), PrimitiveKind::F64) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (Value::LongDouble(v), PrimitiveKind::LongDouble) => {
                self.align(LONG_DOUBLE_ALIGN);
                self.buffer.extend(v);
            }
            (Value::Char(c), PrimitiveKind::Char) => {
                let b = u8::try_from(u32::from(*c)).map_err(|_| {
                    CdrError::InvalidData(format!("char {c:?} does not fit in one byte"))
                })?;
                self.buffer.push(b);
            }
            (Value::WChar(c), PrimitiveKind::WChar) => {
                let unit = u16::try_from(u32::from(*c)).map_err(|_| {
                    CdrError::InvalidData(format!("wchar {c:?} does not fit in one code unit"))
                })?;
                self.align(2);
                self.buffer.extend(&unit.to_le_bytes());
            }
            (Value::String(s), PrimitiveKind::String { .. }) => {
                if value.exceeds_bound(kind) {
                    return Err(CdrError::InvalidData("string exceeds bound".into()));
                }
                let bytes = s.as_bytes();
                // Length includes null terminator
                self.write_length(bytes.len() + 1)?;
                self.buffer.extend(bytes);
                self.buffer.push(0);
            }
            (Value::WString(s), PrimitiveKind::WString { .. }) => {
                if value.exceeds_bound(kind) {
                    return Err(CdrError::InvalidData("wstring exceeds bound".into()));
                }
                let units: Vec<u16> = s.encode_utf16().collect();
                self.write_length(units.len() + 1)?;
                for unit in units {
                    self.buffer.extend(&unit.to_le_bytes());
                }
                self.buffer.extend(&0u16.to_le_bytes());
            }
            _ => {
                return Err(CdrError::TypeMismatch {
                    expected: kind.idl_name().into(),
                    found: value.kind_name().into(),
                });
            }
        }
        Ok(())
    }
}

/// Generate aligned little-endian read methods.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type, CdrError> {
            self.align($size);
            let bytes = self.read_bytes($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// CDR decoder for dynamic values.
#[derive(Debug)]
pub struct CdrDecoder<'a> {
    buffer: &'a [u8],
    offset: usize,
    limits: DecodeLimits,
    depth: usize,
}

impl<'a> CdrDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_limits(buffer, DecodeLimits::default())
    }

    pub fn with_limits(buffer: &'a [u8], limits: DecodeLimits) -> Self {
        Self {
            buffer,
            offset: 0,
            limits,
            depth: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn align(&mut self, alignment: usize) {
        if alignment > 1 {
            self.offset = (self.offset + alignment - 1) & !(alignment - 1);
        }
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], CdrError> {
        let end = self.offset.checked_add(count);
        match end {
            Some(end) if end <= self.buffer.len() => {
                let slice = &self.buffer[self.offset..end];
                self.offset = end;
                Ok(slice)
            }
            _ => Err(CdrError::BufferTooSmall {
                need: count,
                have: self.remaining(),
            }),
        }
    }

    fn read_u8(&mut self) -> Result<u8, CdrError> {
        Ok(self.read_bytes(1)?[0])
    }

    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    fn read_length(&mut self) -> Result<usize, CdrError> {
        let len = self.read_u32()? as usize;
        if len > self.limits.max_collection_length {
            return Err(CdrError::LimitExceeded(format!(
                "length {len} exceeds limit {}",
                self.limits.max_collection_length
            )));
        }
        Ok(len)
    }

    fn read_tag(&mut self) -> Result<bool, CdrError> {
        match self.read_u32()? {
            NULL_TAG => Ok(false),
            VALUE_TAG => Ok(true),
            other => Err(CdrError::InvalidData(format!("bad value tag {other:#x}"))),
        }
    }

    /// Decode one value of `type_desc` at the current offset.
    pub fn decode_value(&mut self, type_desc: &Arc<TypeDescriptor>) -> Result<Value, CdrError> {
        if self.depth >= self.limits.max_depth {
            return Err(CdrError::LimitExceeded(format!(
                "nesting deeper than {}",
                self.limits.max_depth
            )));
        }
        self.depth += 1;
        let result = self.decode_inner(type_desc);
        self.depth -= 1;
        result
    }

    fn decode_members(
        &mut self,
        fields: &[crate::types::FieldDescriptor],
    ) -> Result<Vec<Value>, CdrError> {
        fields
            .iter()
            .map(|f| self.decode_value(&f.type_desc))
            .collect()
    }

    fn decode_inner(&mut self, type_desc: &Arc<TypeDescriptor>) -> Result<Value, CdrError> {
        let real = real_type(type_desc)?;
        match &real.kind {
            TypeKind::Primitive(p) => self.decode_primitive(*p),
            TypeKind::Struct(fields) | TypeKind::Exception(fields) => {
                Ok(Value::Struct(self.decode_members(fields)?))
            }
            TypeKind::Sequence(seq) => {
                let len = self.read_length()?;
                if !seq.admits(len) {
                    return Err(CdrError::InvalidData(format!(
                        "sequence length {len} exceeds bound {}",
                        seq.max_length.unwrap_or(0)
                    )));
                }
                let mut items = Vec::with_capacity(len.min(self.remaining()));
                for _ in 0..len {
                    items.push(self.decode_value(&seq.element_type)?);
                }
                Ok(Value::Sequence(items))
            }
            TypeKind::Array(arr) => {
                let mut items = Vec::with_capacity(arr.length.min(self.remaining()));
                for _ in 0..arr.length {
                    items.push(self.decode_value(&arr.element_type)?);
                }
                Ok(Value::Array(items))
            }
            TypeKind::Enum(e) => {
                let ordinal = self.read_u32()?;
                if e.name_of(ordinal).is_none() {
                    return Err(CdrError::InvalidData(format!(
                        "ordinal {ordinal} out of range for {}",
                        real.name
                    )));
                }
                Ok(Value::Enum(ordinal))
            }
            TypeKind::Union(u) => {
                let discriminator = self.decode_value(&u.discriminator)?;
                let label = discriminator.to_label().ok_or_else(|| {
                    CdrError::UnsupportedType(format!(
                        "{} discriminator",
                        discriminator.kind_name()
                    ))
                })?;
                let member = match u.case_index_for(label).and_then(|i| u.cases.get(i)) {
                    Some(case) => Some(Box::new(self.decode_value(&case.type_desc)?)),
                    None => None,
                };
                Ok(Value::Union {
                    discriminator: Box::new(discriminator),
                    member,
                })
            }
            TypeKind::ValueType(fields) => {
                if self.read_tag()? {
                    Ok(Value::ValueType(Some(self.decode_members(fields)?)))
                } else {
                    Ok(Value::ValueType(None))
                }
            }
            TypeKind::ValueBox(boxed) => {
                if self.read_tag()? {
                    Ok(Value::ValueBox(Some(Box::new(self.decode_value(boxed)?))))
                } else {
                    Ok(Value::ValueBox(None))
                }
            }
            TypeKind::Alias(_) | TypeKind::Recursive(_) => {
                Err(CdrError::UnsupportedType(real.name.clone()))
            }
        }
    }

    fn decode_primitive(&mut self, kind: PrimitiveKind) -> Result<Value, CdrError> {
        let value = match kind {
            PrimitiveKind::Bool => Value::Bool(self.read_u8()? != 0),
            PrimitiveKind::U8 => Value::U8(self.read_u8()?),
            PrimitiveKind::U16 => Value::U16(self.read_u16()?),
            PrimitiveKind::U32 => Value::U32(self.read_u32()?),
            PrimitiveKind::U64 => Value::U64(self.read_u64()?),
            PrimitiveKind::I8 => Value::I8(i8::from_le_bytes([self.read_u8()?])),
            PrimitiveKind::I16 => Value::I16(self.read_i16()?),
            PrimitiveKind::I32 => Value::I32(self.read_i32()?),
            PrimitiveKind::I64 => Value::I64(self.read_i64()?),
            PrimitiveKind::F32 => Value::F32(self.read_f32()?),
            PrimitiveKind::F64 => Value::F64(self.read_f64()?),
            PrimitiveKind::LongDouble => {
                self.align(LONG_DOUBLE_ALIGN);
                let bytes = self.read_bytes(LONG_DOUBLE_SIZE)?;
                let mut storage = [0u8; LONG_DOUBLE_SIZE];
                storage.copy_from_slice(bytes);
                Value::LongDouble(storage)
            }
            PrimitiveKind::Char => Value::Char(char::from(self.read_u8()?)),
            PrimitiveKind::WChar => {
                let unit = self.read_u16()?;
                let c = char::from_u32(u32::from(unit))
                    .ok_or_else(|| CdrError::InvalidData(format!("bad wchar {unit:#06x}")))?;
                Value::WChar(c)
            }
            PrimitiveKind::String { max_length } => {
                let len = self.read_length()?;
                if let Some(max) = max_length.filter(|m| *m > 0) {
                    if len > max + 1 {
                        return Err(CdrError::InvalidData("string exceeds bound".into()));
                    }
                }
                if len == 0 {
                    return Ok(Value::String(String::new()));
                }
                let bytes = self.read_bytes(len)?;
                // Remove null terminator
                let actual = if bytes[len - 1] == 0 { len - 1 } else { len };
                Value::String(String::from_utf8(bytes[..actual].to_vec())?)
            }
            PrimitiveKind::WString { max_length } => {
                let len = self.read_length()?;
                if let Some(max) = max_length.filter(|m| *m > 0) {
                    if len > max + 1 {
                        return Err(CdrError::InvalidData("wstring exceeds bound".into()));
                    }
                }
                let mut units = Vec::with_capacity(len.min(self.remaining() / 2));
                for _ in 0..len {
                    let bytes = self.read_bytes(2)?;
                    units.push(u16::from_le_bytes([bytes[0], bytes[1]]));
                }
                if units.last() == Some(&0) {
                    units.pop();
                }
                let s = String::from_utf16(&units)
                    .map_err(|_| CdrError::InvalidData("Invalid UTF-16".into()))?;
                Value::WString(s)
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EnumBuilder, FieldDescriptor, TypeDescriptorBuilder, UnionBuilder,
    };

    fn prim(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", kind))
    }

    #[test]
    fn test_encode_decode_primitives() {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("Primitives")
                .field("b", PrimitiveKind::Bool)
                .field("u8", PrimitiveKind::U8)
                .field("u32", PrimitiveKind::U32)
                .field("f64", PrimitiveKind::F64)
                .build(),
        );
        let value = Value::Struct(vec![
            Value::Bool(true),
            Value::U8(42),
            Value::U32(12345),
            Value::F64(std::f64::consts::E),
        ]);

        let bytes = encode(&value, &desc).expect("encode");
        // bool, u8, pad(2), u32, f64 at 8
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode(&bytes, &desc).expect("decode"), value);
    }

    #[test]
    fn test_alignment_is_relative_to_stream_start() {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("Padded")
                .field("a", PrimitiveKind::U8)
                .field("b", PrimitiveKind::I64)
                .build(),
        );
        let bytes = encode(&Value::Struct(vec![Value::U8(1), Value::I64(-1)]), &desc)
            .expect("encode");
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[1..8], &[0; 7]);
    }

    #[test]
    fn test_write_encapsulated_realigns() {
        let i64_type = prim(PrimitiveKind::I64);
        let standalone = encode(&Value::I64(7), &i64_type).expect("encode");
        assert_eq!(standalone.len(), 8);

        let mut encoder = CdrEncoder::new();
        encoder
            .encode_value(&Value::U8(9), &prim(PrimitiveKind::U8))
            .expect("u8");
        encoder
            .write_encapsulated(&standalone, &i64_type)
            .expect("nested");
        let bytes = encoder.into_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[8..], &7i64.to_le_bytes());
    }

    #[test]
    fn test_string_null_terminated() {
        let s = prim(PrimitiveKind::String { max_length: None });
        let bytes = encode(&Value::from("hi"), &s).expect("encode");
        assert_eq!(bytes, vec![3, 0, 0, 0, b'h', b'i', 0]);
        assert_eq!(decode(&bytes, &s).expect("decode"), Value::from("hi"));
    }

    #[test]
    fn test_bounded_string_rejected() {
        let s = prim(PrimitiveKind::String {
            max_length: Some(2),
        });
        assert!(matches!(
            encode(&Value::from("abc"), &s),
            Err(CdrError::InvalidData(_))
        ));
    }

    #[test]
    fn test_wstring_and_wchar() {
        let desc = Arc::new(
            TypeDescriptorBuilder::new("Wide")
                .field("c", PrimitiveKind::WChar)
                .field("s", PrimitiveKind::WString { max_length: None })
                .build(),
        );
        let value = Value::Struct(vec![Value::WChar('é'), Value::WString("añb".into())]);
        let bytes = encode(&value, &desc).expect("encode");
        assert_eq!(decode(&bytes, &desc).expect("decode"), value);
    }

    #[test]
    fn test_union_without_active_member() {
        let u = Arc::new(
            UnionBuilder::with_i32_discriminator("U")
                .primitive_case("a", 1, PrimitiveKind::F32)
                .build(),
        );
        let empty = Value::Union {
            discriminator: Box::new(Value::I32(5)),
            member: None,
        };
        let bytes = encode(&empty, &u).expect("encode");
        assert_eq!(bytes.len(), 4);
        assert_eq!(decode(&bytes, &u).expect("decode"), empty);

        let wrong = Value::Union {
            discriminator: Box::new(Value::I32(1)),
            member: None,
        };
        assert!(encode(&wrong, &u).is_err());
    }

    #[test]
    fn test_enum_ordinal_range() {
        let e = Arc::new(EnumBuilder::new("E").variant("A").variant("B").build());
        assert!(encode(&Value::Enum(2), &e).is_err());
        let bytes = 5u32.to_le_bytes();
        assert!(matches!(decode(&bytes, &e), Err(CdrError::InvalidData(_))));
    }

    #[test]
    fn test_value_type_null_tag() {
        let vt = Arc::new(
            TypeDescriptorBuilder::value_type("V")
                .field("x", PrimitiveKind::I32)
                .build(),
        );
        let bytes = encode(&Value::ValueType(None), &vt).expect("encode");
        assert_eq!(bytes, NULL_TAG.to_le_bytes().to_vec());

        let present = Value::ValueType(Some(vec![Value::I32(3)]));
        let bytes = encode(&present, &vt).expect("encode");
        assert_eq!(&bytes[..4], &VALUE_TAG.to_le_bytes());
        assert_eq!(decode(&bytes, &vt).expect("decode"), present);

        assert!(decode(&[1, 2, 3, 4], &vt).is_err());
    }

    #[test]
    fn test_recursive_type_encodes() {
        let node = TypeDescriptor::recursive("Node", |node_ref| {
            TypeKind::Struct(vec![
                FieldDescriptor::new("v", prim(PrimitiveKind::I32)),
                FieldDescriptor::new("kids", Arc::new(TypeDescriptor::sequence(node_ref, 0))),
            ])
        });
        let leaf = Value::Struct(vec![Value::I32(2), Value::Sequence(vec![])]);
        let tree = Value::Struct(vec![Value::I32(1), Value::Sequence(vec![leaf])]);
        let bytes = encode(&tree, &node).expect("encode");
        assert_eq!(decode(&bytes, &node).expect("decode"), tree);
    }

    #[test]
    fn test_limits() {
        let seq = Arc::new(TypeDescriptor::sequence(prim(PrimitiveKind::U8), 0));
        let mut bytes = 1000u32.to_le_bytes().to_vec();
        bytes.extend(std::iter::repeat_n(0u8, 1000));
        let limits = DecodeLimits {
            max_depth: 8,
            max_collection_length: 10,
        };
        assert!(matches!(
            decode_with_limits(&bytes, &seq, limits),
            Err(CdrError::LimitExceeded(_))
        ));

        let nested = Arc::new(TypeDescriptor::sequence(seq.clone(), 0));
        let limits = DecodeLimits {
            max_depth: 1,
            max_collection_length: 10,
        };
        let bytes = encode(&Value::Sequence(vec![Value::Sequence(vec![])]), &nested)
            .expect("encode");
        assert!(matches!(
            decode_with_limits(&bytes, &nested, limits),
            Err(CdrError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_truncated_input() {
        let desc = prim(PrimitiveKind::U64);
        assert!(matches!(
            decode(&[1, 2, 3], &desc),
            Err(CdrError::BufferTooSmall { .. })
        ));
    }
}
