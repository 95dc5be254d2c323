// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plain decoded values.
//!
//! A [`Value`] is the fully materialized tree of a typed value. It is what
//! the CDR codec reads and writes and what basic dynamic values hold.

use crate::types::{PrimitiveKind, TypeDescriptor, TypeKind, LONG_DOUBLE_SIZE};
use std::fmt;
use std::sync::Arc;

/// A value of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Primitives
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    LongDouble([u8; LONG_DOUBLE_SIZE]),
    Char(char),
    WChar(char),
    String(String),
    WString(String),

    // Composites
    /// Struct or exception members in declaration order.
    Struct(Vec<Value>),
    Sequence(Vec<Value>),
    Array(Vec<Value>),
    /// Enumerator ordinal.
    Enum(u32),
    Union {
        discriminator: Box<Value>,
        /// None when no member is active.
        member: Option<Box<Value>>,
    },
    /// Value type members; None is the null value.
    ValueType(Option<Vec<Value>>),
    /// Boxed value; None is the null value.
    ValueBox(Option<Box<Value>>),
}

impl Value {
    /// Zero value of a primitive kind.
    pub fn default_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
            PrimitiveKind::LongDouble => Self::LongDouble([0; LONG_DOUBLE_SIZE]),
            PrimitiveKind::Char => Self::Char('\0'),
            PrimitiveKind::WChar => Self::WChar('\0'),
            PrimitiveKind::String { .. } => Self::String(String::new()),
            PrimitiveKind::WString { .. } => Self::WString(String::new()),
        }
    }

    /// Whether this value has the shape of a primitive kind and fits its bound.
    pub fn matches_primitive(&self, kind: PrimitiveKind) -> bool {
        match self {
            Self::Char(c) if (*c as u32) > 0xFF => return false,
            Self::WChar(c) if (*c as u32) > 0xFFFF => return false,
            _ => {}
        }
        self.same_kind(kind) && !self.exceeds_bound(kind)
    }

    /// Whether the same value variant as `kind`, ignoring string bounds.
    pub fn same_kind(&self, kind: PrimitiveKind) -> bool {
        matches!(
            (self, kind),
            (Self::Bool(_), PrimitiveKind::Bool)
                | (Self::U8(_), PrimitiveKind::U8)
                | (Self::U16(_), PrimitiveKind::U16)
                | (Self::U32(_), PrimitiveKind::U32)
                | (Self::U64(_), PrimitiveKind::U64)
                | (Self::I8(_), PrimitiveKind::I8)
                | (Self::I16(_), PrimitiveKind::I16)
                | (Self::I32(_), PrimitiveKind::I32)
                | (Self::I64(_), PrimitiveKind::I64)
                | (Self::F32(_), PrimitiveKind::F32)
                | (Self::F64(_), PrimitiveKind::F64)
                | (Self::LongDouble(_), PrimitiveKind::LongDouble)
                | (Self::Char(_), PrimitiveKind::Char)
                | (Self::WChar(_), PrimitiveKind::WChar)
                | (Self::String(_), PrimitiveKind::String { .. })
                | (Self::WString(_), PrimitiveKind::WString { .. })
        )
    }

    /// Whether a string value exceeds the bound of `kind`.
    pub fn exceeds_bound(&self, kind: PrimitiveKind) -> bool {
        let bound = kind.bound();
        match self {
            Self::String(s) if bound > 0 => s.len() > bound,
            Self::WString(s) if bound > 0 => s.encode_utf16().count() > bound,
            _ => false,
        }
    }

    /// Union label of a discriminator value.
    pub fn to_label(&self) -> Option<i64> {
        match self {
            Self::Bool(v) => Some(i64::from(*v)),
            Self::U8(v) => Some(i64::from(*v)),
            Self::U16(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::I8(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            Self::Char(c) | Self::WChar(c) => Some(i64::from(*c as u32)),
            Self::Enum(o) => Some(i64::from(*o)),
            _ => None,
        }
    }

    /// Discriminator value of type `discriminator` for a union label.
    pub fn from_label(discriminator: &Arc<TypeDescriptor>, label: i64) -> Option<Self> {
        let real = discriminator.resolved()?;
        if !real.label_range()?.contains(&label) {
            return None;
        }
        let value = match &real.kind {
            TypeKind::Primitive(p) => match p {
                PrimitiveKind::Bool => Self::Bool(label != 0),
                PrimitiveKind::U8 => Self::U8(u8::try_from(label).ok()?),
                PrimitiveKind::U16 => Self::U16(u16::try_from(label).ok()?),
                PrimitiveKind::U32 => Self::U32(u32::try_from(label).ok()?),
                PrimitiveKind::U64 => Self::U64(u64::try_from(label).ok()?),
                PrimitiveKind::I8 => Self::I8(i8::try_from(label).ok()?),
                PrimitiveKind::I16 => Self::I16(i16::try_from(label).ok()?),
                PrimitiveKind::I32 => Self::I32(i32::try_from(label).ok()?),
                PrimitiveKind::I64 => Self::I64(label),
                PrimitiveKind::Char => Self::Char(char::from_u32(u32::try_from(label).ok()?)?),
                PrimitiveKind::WChar => Self::WChar(char::from_u32(u32::try_from(label).ok()?)?),
                _ => return None,
            },
            TypeKind::Enum(_) => Self::Enum(u32::try_from(label).ok()?),
            _ => return None,
        };
        Some(value)
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::U8(_) => "octet",
            Self::U16(_) => "unsigned short",
            Self::U32(_) => "unsigned long",
            Self::U64(_) => "unsigned long long",
            Self::I8(_) => "int8",
            Self::I16(_) => "short",
            Self::I32(_) => "long",
            Self::I64(_) => "long long",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::LongDouble(_) => "long double",
            Self::Char(_) => "char",
            Self::WChar(_) => "wchar",
            Self::String(_) => "string",
            Self::WString(_) => "wstring",
            Self::Struct(_) => "struct",
            Self::Sequence(_) => "sequence",
            Self::Array(_) => "array",
            Self::Enum(_) => "enum",
            Self::Union { .. } => "union",
            Self::ValueType(_) => "valuetype",
            Self::ValueBox(_) => "valuebox",
        }
    }

    /// Check if this is a null value type or value box.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::ValueType(None) | Self::ValueBox(None))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str(close)
        }

        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::LongDouble(bytes) => {
                f.write_str("0x")?;
                for b in bytes.iter().rev() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Char(c) | Self::WChar(c) => write!(f, "{c:?}"),
            Self::String(s) | Self::WString(s) => write!(f, "{s:?}"),
            Self::Struct(members) => list(f, "{", members, "}"),
            Self::Sequence(items) | Self::Array(items) => list(f, "[", items, "]"),
            Self::Enum(o) => write!(f, "#{o}"),
            Self::Union {
                discriminator,
                member: Some(member),
            } => write!(f, "<{discriminator}: {member}>"),
            Self::Union {
                discriminator,
                member: None,
            } => write!(f, "<{discriminator}>"),
            Self::ValueType(Some(members)) => list(f, "{", members, "}"),
            Self::ValueBox(Some(inner)) => write!(f, "{inner}"),
            Self::ValueType(None) | Self::ValueBox(None) => f.write_str("null"),
        }
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumBuilder;

    fn prim(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", kind))
    }

    #[test]
    fn test_primitive_values() {
        assert_eq!(Value::from(42u32), Value::U32(42));
        assert_eq!(Value::from("hello"), Value::String("hello".into()));
        assert_eq!(
            Value::from(vec![1u32, 2, 3]),
            Value::Sequence(vec![Value::U32(1), Value::U32(2), Value::U32(3)])
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Value::Bool(true).to_label(), Some(1));
        assert_eq!(Value::Char('A').to_label(), Some(65));
        assert_eq!(Value::Enum(2).to_label(), Some(2));
        assert_eq!(Value::F32(1.0).to_label(), None);

        let color = Arc::new(
            EnumBuilder::new("Color")
                .variant("RED")
                .variant("GREEN")
                .build(),
        );
        assert_eq!(Value::from_label(&color, 1), Some(Value::Enum(1)));
        assert_eq!(Value::from_label(&color, 2), None);
        assert_eq!(
            Value::from_label(&prim(PrimitiveKind::U8), 300),
            None
        );
        assert_eq!(
            Value::from_label(&prim(PrimitiveKind::I16), -3),
            Some(Value::I16(-3))
        );
    }

    #[test]
    fn test_string_bounds() {
        let bounded = PrimitiveKind::String {
            max_length: Some(3),
        };
        assert!(!Value::from("abc").exceeds_bound(bounded));
        assert!(Value::from("abcd").exceeds_bound(bounded));
        assert!(Value::from("abcd").same_kind(bounded));
    }

    #[test]
    fn test_display() {
        let v = Value::Struct(vec![Value::I32(1), Value::Sequence(vec![Value::Bool(true)])]);
        assert_eq!(v.to_string(), "{1, [true]}");
        assert_eq!(Value::ValueBox(None).to_string(), "null");
    }
}
