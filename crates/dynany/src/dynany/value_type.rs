// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nullable value types and value boxes.

use super::constructed::Constructed;
use super::factory::type_name;
use super::{Body, DynAny, Node};
use crate::any::Any;
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TypeDescriptor, TypeKind};
use std::sync::Arc;

pub(crate) struct ValueState {
    pub(crate) base: Constructed,
    pub(crate) is_null: bool,
}

impl ValueState {
    pub(crate) fn new(base: Constructed, is_null: bool) -> Self {
        Self { base, is_null }
    }
}

impl Node {
    pub(crate) fn is_null_value(&self) -> bool {
        match &self.body {
            Body::ValueType(state) | Body::ValueBox(state) => state.is_null,
            _ => false,
        }
    }

    fn value_state(&mut self) -> DynAnyResult<&mut ValueState> {
        match &mut self.body {
            Body::ValueType(state) | Body::ValueBox(state) => Ok(state),
            _ => Err(DynAnyError::mismatch(format!(
                "{} is not a value type",
                type_name(&self.type_desc)
            ))),
        }
    }

    fn boxed_type(&self) -> DynAnyResult<Arc<TypeDescriptor>> {
        match (&self.body, &self.real.kind) {
            (Body::ValueBox(_), TypeKind::ValueBox(boxed)) => Ok(Arc::clone(boxed)),
            _ => Err(DynAnyError::mismatch(format!(
                "{} is not a value box",
                self.name()
            ))),
        }
    }
}

impl DynAny {
    pub fn is_null(&self) -> DynAnyResult<bool> {
        let mut node = self.lock()?;
        node.value_state()?;
        Ok(node.is_null_value())
    }

    /// Make the value null, dropping its members.
    pub fn set_to_null(&self) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        let state = node.value_state()?;
        state.is_null = true;
        state.base.reset_to_type();
        state.base.cursor = None;
        node.tick();
        Ok(())
    }

    /// Make a null value non-null with default members. A non-null value
    /// is left as is.
    pub fn set_to_value(&self) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        let state = node.value_state()?;
        if !state.is_null {
            return Ok(());
        }
        state.is_null = false;
        state.base.reset_to_type();
        node.tick();
        Ok(())
    }

    /// The boxed value, encoded.
    pub fn get_boxed_value(&self) -> DynAnyResult<Any> {
        self.boxed_component()?.snapshot()
    }

    /// The boxed value as a live component.
    pub fn get_boxed_value_as_dyn_any(&self) -> DynAnyResult<DynAny> {
        self.boxed_component()
    }

    fn boxed_component(&self) -> DynAnyResult<DynAny> {
        let mut node = self.lock()?;
        node.boxed_type()?;
        if node.is_null_value() {
            return Err(DynAnyError::invalid(format!("{} is null", node.name())));
        }
        node.ensure_components()?;
        node.components()
            .first()
            .cloned()
            .ok_or_else(|| DynAnyError::invalid(format!("{} holds no value", node.name())))
    }

    /// Box a copy of `value`, making the box non-null.
    pub fn set_boxed_value(&self, value: &Any) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        node.set_boxed(value, true)
    }

    pub fn set_boxed_value_as_dyn_any(&self, value: &DynAny) -> DynAnyResult<()> {
        let any = value.snapshot()?;
        let mut node = self.lock()?;
        node.set_boxed(&any, false)
    }
}

impl Node {
    fn set_boxed(&mut self, value: &Any, copy: bool) -> DynAnyResult<()> {
        let boxed = self.boxed_type()?;
        if **value.type_desc() != *boxed {
            return Err(DynAnyError::mismatch(format!(
                "{} boxes {}, got {}",
                self.name(),
                type_name(&boxed),
                type_name(value.type_desc())
            )));
        }
        let components = self.build_components(std::slice::from_ref(value), copy)?;
        self.commit_components(components);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::any::Any;
    use crate::dynany::DynAnyFactory;
    use crate::error::DynAnyError;
    use crate::types::{
        FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder, TypeKind,
    };
    use crate::value::Value;
    use std::sync::Arc;

    fn long() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32))
    }

    /// `valuetype LNode { long v; LNode next; }`
    fn linked_node() -> Arc<TypeDescriptor> {
        TypeDescriptor::recursive("LNode", |next| {
            TypeKind::ValueType(vec![
                FieldDescriptor::new("v", long()),
                FieldDescriptor::new("next", next),
            ])
        })
    }

    #[test]
    fn test_value_type_starts_null() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::value_type("Node")
                .field("id", PrimitiveKind::I32)
                .build(),
        );
        let v = factory.create_from_type(&desc).expect("create");
        assert!(v.is_null().expect("null"));
        assert_eq!(v.component_count().expect("count"), 0);
        assert!(matches!(v.get_members(), Err(DynAnyError::InvalidValue(_))));

        v.set_to_value().expect("value");
        assert!(!v.is_null().expect("null"));
        assert_eq!(v.component_count().expect("count"), 1);
        v.insert_i32(8).expect("id");
        assert_eq!(v.to_value().expect("value"), Value::ValueType(Some(vec![Value::I32(8)])));

        v.set_to_null().expect("null");
        assert_eq!(v.to_value().expect("value"), Value::ValueType(None));
        assert!(v.current_component().expect("cursor").is_none());
    }

    #[test]
    fn test_null_recursive_value_type_encodes() {
        let factory = DynAnyFactory::new();
        let desc = linked_node();
        let two = Value::ValueType(Some(vec![
            Value::I32(1),
            Value::ValueType(Some(vec![Value::I32(2), Value::ValueType(None)])),
        ]));
        let v = factory
            .create_from_any(&Any::new(Arc::clone(&desc), &two).expect("encode"), false)
            .expect("decode");

        v.seek(1).expect("next");
        let next = v.current_component().expect("current").expect("next");
        assert!(next.type_desc().expect("type").is_recursive());
        next.set_to_null().expect("null");
        let any = next.to_any().expect("encode");
        assert!(any.has_value());
        assert_eq!(any.value().expect("value"), Value::ValueType(None));

        v.set_to_null().expect("null");
        let any = v.to_any().expect("encode");
        assert_eq!(any.value().expect("value"), Value::ValueType(None));
    }

    #[test]
    fn test_fresh_back_reference_value_type_is_null_and_encodes() {
        let factory = DynAnyFactory::new();
        let desc = linked_node();
        let next = desc.member_type(1).cloned().expect("next type");
        let v = factory.create_from_type(&next).expect("create");
        assert!(v.is_null().expect("null"));
        let any = v.to_any().expect("encode");
        assert_eq!(any.value().expect("value"), Value::ValueType(None));
    }

    #[test]
    fn test_value_box() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(TypeDescriptor::value_box("LongBox", long()));
        let v = factory.create_from_type(&desc).expect("create");
        assert!(matches!(v.get_boxed_value(), Err(DynAnyError::InvalidValue(_))));

        let five = Any::new(long(), &Value::I32(5)).expect("encode");
        v.set_boxed_value(&five).expect("box");
        assert!(!v.is_null().expect("null"));
        assert_eq!(v.get_boxed_value().expect("boxed"), five);
        assert_eq!(v.get_i32().expect("through cursor"), 5);

        let short = Any::new(
            Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I16)),
            &Value::I16(1),
        )
        .expect("encode");
        assert!(matches!(
            v.set_boxed_value(&short),
            Err(DynAnyError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_set_boxed_value_as_dyn_any() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(TypeDescriptor::value_box("LongBox", long()));
        let v = factory.create_from_type(&desc).expect("create");

        let source = factory
            .create_from_any(&Any::new(long(), &Value::I32(11)).expect("encode"), true)
            .expect("source");
        v.set_boxed_value_as_dyn_any(&source).expect("box");
        assert!(!v.is_null().expect("null"));
        let boxed = v.get_boxed_value_as_dyn_any().expect("boxed");
        assert!(boxed.equal(&source).expect("equal"));

        source.insert_i32(12).expect("source");
        assert_eq!(boxed.get_i32().expect("boxed"), 11);

        let flag = factory
            .create_from_type(&Arc::new(TypeDescriptor::primitive("", PrimitiveKind::Bool)))
            .expect("flag");
        assert!(matches!(
            v.set_boxed_value_as_dyn_any(&flag),
            Err(DynAnyError::TypeMismatch(_))
        ));
        assert_eq!(v.get_i32().expect("unchanged"), 11);
    }

    #[test]
    fn test_value_ops_on_struct_are_mismatch() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::new("S")
                .field("a", PrimitiveKind::I32)
                .build(),
        );
        let v = factory.create_from_type(&desc).expect("create");
        assert!(matches!(v.is_null(), Err(DynAnyError::TypeMismatch(_))));
        assert!(matches!(v.set_to_null(), Err(DynAnyError::TypeMismatch(_))));
    }
}
