// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequences and arrays.

use super::factory::type_name;
use super::repr::Representation;
use super::{Body, DynAny, Node};
use crate::any::Any;
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{SequenceDescriptor, TypeDescriptor, TypeKind};
use std::sync::Arc;

impl Node {
    fn element_type(&self) -> DynAnyResult<Arc<TypeDescriptor>> {
        match (&self.body, &self.real.kind) {
            (Body::Sequence(_), TypeKind::Sequence(s)) => Ok(Arc::clone(&s.element_type)),
            (Body::Array(_), TypeKind::Array(a)) => Ok(Arc::clone(&a.element_type)),
            _ => Err(DynAnyError::mismatch(format!(
                "{} is not a sequence or array",
                self.name()
            ))),
        }
    }

    fn sequence_descriptor(&self) -> DynAnyResult<SequenceDescriptor> {
        match &self.real.kind {
            TypeKind::Sequence(s) => Ok(s.clone()),
            _ => Err(DynAnyError::mismatch(format!(
                "{} is not a sequence",
                self.name()
            ))),
        }
    }

    /// Check a replacement element list. Elements are checked in index
    /// order, each for a value first and then for its type.
    fn check_elements(&self, elements: &[Any]) -> DynAnyResult<()> {
        let element_type = self.element_type()?;
        let len = elements.len();
        let fits = match &self.real.kind {
            TypeKind::Array(a) => len == a.length,
            TypeKind::Sequence(s) => {
                s.admits(len) && len <= self.ctx.factory.config().max_collection_length
            }
            _ => false,
        };
        if !fits {
            return Err(DynAnyError::invalid(format!(
                "{len} elements do not fit {}",
                self.name()
            )));
        }
        for (i, element) in elements.iter().enumerate() {
            if !element.has_value() {
                return Err(DynAnyError::invalid(format!("element {i} carries no value")));
            }
            if **element.type_desc() != *element_type {
                return Err(DynAnyError::mismatch(format!(
                    "element {i} is {}, expected {}",
                    type_name(element.type_desc()),
                    type_name(&element_type)
                )));
            }
        }
        Ok(())
    }
}

impl DynAny {
    /// Elements as encoded values.
    pub fn get_elements(&self) -> DynAnyResult<Vec<Any>> {
        self.element_components()?
            .iter()
            .map(DynAny::snapshot)
            .collect()
    }

    /// The live element components.
    pub fn get_elements_as_dyn_any(&self) -> DynAnyResult<Vec<DynAny>> {
        self.element_components()
    }

    fn element_components(&self) -> DynAnyResult<Vec<DynAny>> {
        let mut node = self.lock()?;
        node.element_type()?;
        node.ensure_components()?;
        Ok(node.components().to_vec())
    }

    /// Replace every element.
    ///
    /// An array needs exactly its length; a sequence at most its bound.
    /// On error the value is left unchanged.
    pub fn set_elements(&self, elements: &[Any]) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        node.check_elements(elements)?;
        let components = node.build_components(elements, true)?;
        node.commit_components(components);
        Ok(())
    }

    /// Replace every element with copies of the given values.
    pub fn set_elements_as_dyn_any(&self, elements: &[DynAny]) -> DynAnyResult<()> {
        let snapshots = elements
            .iter()
            .map(DynAny::snapshot)
            .collect::<DynAnyResult<Vec<_>>>()?;
        let mut node = self.lock()?;
        node.check_elements(&snapshots)?;
        let components = node.build_components(&snapshots, false)?;
        node.commit_components(components);
        Ok(())
    }

    /// Current length of a sequence.
    pub fn get_length(&self) -> DynAnyResult<usize> {
        let mut node = self.lock()?;
        node.sequence_descriptor()?;
        node.ensure_components()?;
        Ok(node.components().len())
    }

    /// Resize a sequence.
    ///
    /// New elements take their type's default. When growing with the cursor
    /// unset it moves to the first new element; when shrinking past the
    /// cursor it becomes unset.
    pub fn set_length(&self, length: usize) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        let descriptor = node.sequence_descriptor()?;
        let limit = node.ctx.factory.config().max_collection_length;
        if !descriptor.admits(length) || length > limit {
            return Err(DynAnyError::invalid(format!(
                "length {length} exceeds the bound of {}",
                node.name()
            )));
        }
        node.ensure_components()?;
        let old = node.components().len();
        let added = (old..length)
            .map(|_| {
                node.ctx
                    .factory
                    .component_from_type(&node.ctx, &descriptor.element_type)
            })
            .collect::<DynAnyResult<Vec<_>>>()?;

        node.tick();
        let Some(base) = node.body.base_mut() else {
            return Ok(());
        };
        if length >= old {
            base.components.extend(added);
            if base.cursor.is_none() && length > old {
                base.cursor = Some(old);
            }
        } else {
            for component in base.components.drain(length..) {
                component.force_destroy();
            }
            if base.cursor.is_some_and(|c| c >= length) {
                base.cursor = None;
            }
        }
        if length == 0 {
            base.cursor = None;
        }
        base.repr = Representation::COMPONENTS;
        base.encoded = None;
        log::trace!("[DYNANY] sequence resized {old} -> {length}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynany::DynAnyFactory;
    use crate::types::{ArrayBuilder, PrimitiveKind, SequenceBuilder, TypeDescriptorBuilder};
    use crate::value::Value;

    fn long(v: i32) -> Any {
        Any::new(
            Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32)),
            &Value::I32(v),
        )
        .expect("encode")
    }

    #[test]
    fn test_sequence_length_grows_and_shrinks() {
        let factory = DynAnyFactory::new();
        let seq = Arc::new(SequenceBuilder::of_primitive("Longs", PrimitiveKind::I32).build());
        let v = factory.create_from_type(&seq).expect("create");
        assert_eq!(v.get_length().expect("len"), 0);
        assert!(v.current_component().expect("cursor").is_none());

        v.set_length(3).expect("grow");
        assert_eq!(v.get_length().expect("len"), 3);
        assert!(v.current_component().expect("cursor").is_some());

        v.seek(2).expect("seek");
        v.set_length(1).expect("shrink");
        assert!(v.current_component().expect("cursor").is_none());
        assert!(v.rewind().is_ok());
        assert!(v.current_component().expect("cursor").is_some());
    }

    #[test]
    fn test_bounded_sequence_rejects_long_length() {
        let factory = DynAnyFactory::new();
        let seq = Arc::new(
            SequenceBuilder::of_primitive("Short", PrimitiveKind::I32)
                .max_length(2)
                .build(),
        );
        let v = factory.create_from_type(&seq).expect("create");
        assert!(matches!(v.set_length(3), Err(DynAnyError::InvalidValue(_))));
        assert!(matches!(
            v.set_elements(&[long(1), long(2), long(3)]),
            Err(DynAnyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_length_on_array_is_mismatch() {
        let factory = DynAnyFactory::new();
        let arr = Arc::new(ArrayBuilder::of_primitive("Three", PrimitiveKind::I32, 3).build());
        let v = factory.create_from_type(&arr).expect("create");
        assert!(matches!(v.get_length(), Err(DynAnyError::TypeMismatch(_))));
        assert!(matches!(v.set_length(1), Err(DynAnyError::TypeMismatch(_))));
        assert_eq!(v.get_elements().expect("elements").len(), 3);
    }

    #[test]
    fn test_element_type_mismatch() {
        let factory = DynAnyFactory::new();
        let seq = Arc::new(SequenceBuilder::of_primitive("Longs", PrimitiveKind::I32).build());
        let v = factory.create_from_type(&seq).expect("create");
        let short = Any::new(
            Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I16)),
            &Value::I16(1),
        )
        .expect("encode");
        assert!(matches!(
            v.set_elements(&[long(1), short]),
            Err(DynAnyError::TypeMismatch(_))
        ));
        assert_eq!(v.get_length().expect("len"), 0);
    }

    #[test]
    fn test_empty_element_reported_before_later_type_mismatch() {
        let factory = DynAnyFactory::new();
        let seq = Arc::new(SequenceBuilder::of_primitive("Longs", PrimitiveKind::I32).build());
        let v = factory.create_from_type(&seq).expect("create");
        let empty = Any::empty(Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32)));
        let short = Any::new(
            Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I16)),
            &Value::I16(1),
        )
        .expect("encode");
        assert!(matches!(
            v.set_elements(&[empty, short]),
            Err(DynAnyError::InvalidValue(_))
        ));
        assert_eq!(v.get_length().expect("len"), 0);
    }

    fn pair() -> Arc<TypeDescriptor> {
        Arc::new(
            TypeDescriptorBuilder::new("Pair")
                .field("a", PrimitiveKind::I32)
                .field("b", PrimitiveKind::I32)
                .build(),
        )
    }

    #[test]
    fn test_set_elements_as_dyn_any_shares_encodings() {
        let factory = DynAnyFactory::new();
        let pairs = Arc::new(SequenceBuilder::of_type("Pairs", pair()).build());
        let v = factory.create_from_type(&pairs).expect("create");

        let encoded = Any::new(pair(), &Value::Struct(vec![Value::I32(1), Value::I32(2)]))
            .expect("encode");
        let source = factory.create_from_any(&encoded, false).expect("source");
        v.set_elements_as_dyn_any(&[source.clone(), source.clone()])
            .expect("set");

        let elements = v.get_elements_as_dyn_any().expect("elements");
        assert_eq!(elements.len(), 2);
        let first = elements[0].to_any().expect("encode");
        assert!(first.shares_encoding_with(&encoded));
        assert!(elements[1].equal(&source).expect("equal"));

        // Elements are independent of the source handle.
        elements[0].insert_i32(7).expect("a");
        assert_eq!(source.get_i32().expect("source a"), 1);
    }

    #[test]
    fn test_set_elements_as_dyn_any_rolls_back_on_wrong_type() {
        let factory = DynAnyFactory::new();
        let seq = Arc::new(SequenceBuilder::of_primitive("Longs", PrimitiveKind::I32).build());
        let v = factory.create_from_type(&seq).expect("create");
        v.set_elements(&[long(4), long(5)]).expect("set");

        let good = factory.create_from_any(&long(9), true).expect("good");
        let wrong = factory
            .create_from_type(&Arc::new(TypeDescriptor::primitive("", PrimitiveKind::F64)))
            .expect("wrong");
        assert!(matches!(
            v.set_elements_as_dyn_any(&[good, wrong]),
            Err(DynAnyError::TypeMismatch(_))
        ));
        assert_eq!(
            v.to_value().expect("value"),
            Value::Sequence(vec![Value::I32(4), Value::I32(5)])
        );
    }
}
