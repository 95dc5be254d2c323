// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive and enum leaf access.
//!
//! On a basic value the accessors read and write the value itself. On a
//! constructed value they act on the component under the cursor, which
//! must itself be basic.

use super::factory::type_name;
use super::{Body, DynAny, Node};
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TypeKind, LONG_DOUBLE_SIZE};
use crate::value::Value;

impl Node {
    fn store_leaf(&mut self, value: Value) -> DynAnyResult<()> {
        match (&mut self.body, &self.real.kind) {
            (Body::Basic(current), TypeKind::Primitive(p)) => {
                if !value.same_kind(*p) {
                    return Err(DynAnyError::mismatch(format!(
                        "cannot store {} in {}",
                        value.kind_name(),
                        p.idl_name()
                    )));
                }
                if !value.matches_primitive(*p) {
                    return Err(DynAnyError::invalid(format!(
                        "{} out of range for {}",
                        value.kind_name(),
                        p.idl_name()
                    )));
                }
                *current = value;
            }
            (Body::Enum(ordinal), TypeKind::Enum(e)) => match value {
                Value::Enum(o) if e.name_of(o).is_some() => *ordinal = o,
                Value::Enum(o) => {
                    return Err(DynAnyError::invalid(format!(
                        "ordinal {o} out of range for {}",
                        self.type_desc.name
                    )))
                }
                other => {
                    return Err(DynAnyError::mismatch(format!(
                        "cannot store {} in an enum",
                        other.kind_name()
                    )))
                }
            },
            _ => {
                return Err(DynAnyError::mismatch(format!(
                    "{} is not a basic value",
                    type_name(&self.type_desc)
                )))
            }
        }
        self.tick();
        Ok(())
    }

    fn load_leaf(&self) -> Option<Value> {
        match &self.body {
            Body::Basic(v) => Some(v.clone()),
            Body::Enum(o) => Some(Value::Enum(*o)),
            _ => None,
        }
    }

    /// Component under the cursor, target of a delegated leaf access.
    fn leaf_target(&mut self) -> DynAnyResult<DynAny> {
        if !self.is_constructed() {
            return Err(DynAnyError::mismatch(format!(
                "{} is not a basic value",
                self.name()
            )));
        }
        self.sync_union()?;
        self.ensure_components()?;
        self.cursor_component()
            .ok_or_else(|| DynAnyError::invalid(format!("cursor of {} is unset", self.name())))
    }
}

impl DynAny {
    /// Store a primitive or enum value.
    ///
    /// Fails with `TypeMismatch` when the kind differs and `InvalidValue`
    /// when the value does not fit (a string over its bound, a char out of
    /// range, an unknown ordinal).
    pub fn insert_value(&self, value: Value) -> DynAnyResult<()> {
        self.insert_leaf(value, true)
    }

    fn insert_leaf(&self, value: Value, delegate: bool) -> DynAnyResult<()> {
        let target = {
            let mut node = self.lock()?;
            if node.load_leaf().is_some() {
                return node.store_leaf(value);
            }
            if !delegate {
                return Err(DynAnyError::mismatch(format!(
                    "component {} is not a basic value",
                    node.name()
                )));
            }
            node.leaf_target()?
        };
        target.insert_leaf(value, false)
    }

    /// Read a primitive or enum value.
    pub fn get_value(&self) -> DynAnyResult<Value> {
        self.get_leaf(true)
    }

    fn get_leaf(&self, delegate: bool) -> DynAnyResult<Value> {
        let target = {
            let mut node = self.lock()?;
            if let Some(value) = node.load_leaf() {
                return Ok(value);
            }
            if !delegate {
                return Err(DynAnyError::mismatch(format!(
                    "component {} is not a basic value",
                    node.name()
                )));
            }
            node.leaf_target()?
        };
        target.get_leaf(false)
    }

    /// Union label of a discriminator value.
    pub(crate) fn label(&self) -> DynAnyResult<i64> {
        let node = self.lock()?;
        node.load_leaf()
            .as_ref()
            .and_then(Value::to_label)
            .ok_or_else(|| DynAnyError::mismatch(format!("{} is not a discriminator", node.name())))
    }

    pub fn insert_string(&self, value: impl Into<String>) -> DynAnyResult<()> {
        self.insert_value(Value::String(value.into()))
    }

    pub fn get_string(&self) -> DynAnyResult<String> {
        match self.get_value()? {
            Value::String(s) => Ok(s),
            other => Err(unexpected("string", &other)),
        }
    }

    pub fn insert_wstring(&self, value: impl Into<String>) -> DynAnyResult<()> {
        self.insert_value(Value::WString(value.into()))
    }

    pub fn get_wstring(&self) -> DynAnyResult<String> {
        match self.get_value()? {
            Value::WString(s) => Ok(s),
            other => Err(unexpected("wstring", &other)),
        }
    }
}

fn unexpected(expected: &str, found: &Value) -> DynAnyError {
    DynAnyError::mismatch(format!("expected {expected}, found {}", found.kind_name()))
}

macro_rules! impl_primitive_access {
    ($($insert:ident, $get:ident, $ty:ty, $variant:ident, $idl:literal;)*) => {
        impl DynAny {
            $(
                #[doc = concat!("Store a `", $idl, "`.")]
                pub fn $insert(&self, value: $ty) -> DynAnyResult<()> {
                    self.insert_value(Value::$variant(value))
                }

                #[doc = concat!("Read a `", $idl, "`.")]
                pub fn $get(&self) -> DynAnyResult<$ty> {
                    match self.get_value()? {
                        Value::$variant(v) => Ok(v),
                        other => Err(unexpected($idl, &other)),
                    }
                }
            )*
        }
    };
}

impl_primitive_access! {
    insert_bool, get_bool, bool, Bool, "boolean";
    insert_u8, get_u8, u8, U8, "octet";
    insert_i8, get_i8, i8, I8, "int8";
    insert_i16, get_i16, i16, I16, "short";
    insert_u16, get_u16, u16, U16, "unsigned short";
    insert_i32, get_i32, i32, I32, "long";
    insert_u32, get_u32, u32, U32, "unsigned long";
    insert_i64, get_i64, i64, I64, "long long";
    insert_u64, get_u64, u64, U64, "unsigned long long";
    insert_f32, get_f32, f32, F32, "float";
    insert_f64, get_f64, f64, F64, "double";
    insert_long_double, get_long_double, [u8; LONG_DOUBLE_SIZE], LongDouble, "long double";
    insert_char, get_char, char, Char, "char";
    insert_wchar, get_wchar, char, WChar, "wchar";
}

#[cfg(test)]
mod tests {
    use super::super::DynAnyFactory;
    use crate::error::DynAnyError;
    use crate::types::{EnumBuilder, PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder};
    use std::sync::Arc;

    fn primitive(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", kind))
    }

    #[test]
    fn test_basic_roundtrip() {
        let factory = DynAnyFactory::new();
        let v = factory
            .create_from_type(&primitive(PrimitiveKind::I32))
            .expect("create");
        assert_eq!(v.get_i32().expect("get"), 0);
        v.insert_i32(-7).expect("insert");
        assert_eq!(v.get_i32().expect("get"), -7);
    }

    #[test]
    fn test_wrong_kind_is_mismatch() {
        let factory = DynAnyFactory::new();
        let v = factory
            .create_from_type(&primitive(PrimitiveKind::I32))
            .expect("create");
        assert!(matches!(v.insert_i16(1), Err(DynAnyError::TypeMismatch(_))));
        assert!(matches!(v.get_string(), Err(DynAnyError::TypeMismatch(_))));
    }

    #[test]
    fn test_bounded_string_overflow_is_invalid() {
        let factory = DynAnyFactory::new();
        let v = factory
            .create_from_type(&primitive(PrimitiveKind::String {
                max_length: Some(3),
            }))
            .expect("create");
        v.insert_string("abc").expect("fits");
        assert!(matches!(
            v.insert_string("abcd"),
            Err(DynAnyError::InvalidValue(_))
        ));
        assert_eq!(v.get_string().expect("unchanged"), "abc");
    }

    #[test]
    fn test_char_out_of_range_is_invalid() {
        let factory = DynAnyFactory::new();
        let v = factory
            .create_from_type(&primitive(PrimitiveKind::Char))
            .expect("create");
        v.insert_char('x').expect("latin");
        assert!(matches!(
            v.insert_char('\u{263a}'),
            Err(DynAnyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_delegates_to_cursor_component() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::new("Pair")
                .field("flag", PrimitiveKind::Bool)
                .field("count", PrimitiveKind::I32)
                .build(),
        );
        let v = factory.create_from_type(&desc).expect("create");
        v.insert_bool(true).expect("flag");
        assert!(v.next().expect("next"));
        v.insert_i32(5).expect("count");
        v.rewind().expect("rewind");
        assert!(v.get_bool().expect("flag"));

        assert!(!v.seek(-1).expect("unset"));
        assert!(matches!(v.get_i32(), Err(DynAnyError::InvalidValue(_))));
    }

    #[test]
    fn test_nested_constructed_component_is_mismatch() {
        let factory = DynAnyFactory::new();
        let inner = Arc::new(
            TypeDescriptorBuilder::new("Inner")
                .field("x", PrimitiveKind::I32)
                .build(),
        );
        let outer = Arc::new(
            TypeDescriptorBuilder::new("Outer")
                .field_with_type("inner", inner)
                .build(),
        );
        let v = factory.create_from_type(&outer).expect("create");
        assert!(matches!(v.insert_i32(1), Err(DynAnyError::TypeMismatch(_))));
    }

    #[test]
    fn test_enum_leaf_accepts_ordinals() {
        let factory = DynAnyFactory::new();
        let color = Arc::new(
            EnumBuilder::new("Color")
                .variant("Red")
                .variant("Green")
                .build(),
        );
        let v = factory.create_from_type(&color).expect("create");
        v.insert_value(crate::value::Value::Enum(1)).expect("green");
        assert_eq!(v.get_value().expect("get"), crate::value::Value::Enum(1));
        assert!(matches!(
            v.insert_value(crate::value::Value::Enum(2)),
            Err(DynAnyError::InvalidValue(_))
        ));
    }
}
