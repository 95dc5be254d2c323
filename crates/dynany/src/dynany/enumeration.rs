// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerated values.

use super::{Body, DynAny, Node};
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{EnumDescriptor, TypeKind};
use parking_lot::MutexGuard;

impl DynAny {
    fn lock_enum(&self) -> DynAnyResult<(MutexGuard<'_, Node>, EnumDescriptor)> {
        let node = self.lock()?;
        let e = match (&node.body, &node.real.kind) {
            (Body::Enum(_), TypeKind::Enum(e)) => e.clone(),
            _ => {
                return Err(DynAnyError::mismatch(format!(
                    "{} is not an enum",
                    node.name()
                )))
            }
        };
        Ok((node, e))
    }

    fn ordinal(node: &Node) -> u32 {
        match node.body {
            Body::Enum(o) => o,
            _ => 0,
        }
    }

    /// Name of the current enumerator.
    pub fn get_as_string(&self) -> DynAnyResult<String> {
        let (node, e) = self.lock_enum()?;
        let ordinal = Self::ordinal(&node);
        e.name_of(ordinal)
            .map(str::to_owned)
            .ok_or_else(|| DynAnyError::invalid(format!("ordinal {ordinal} has no name")))
    }

    /// Select an enumerator by name.
    pub fn set_as_string(&self, name: &str) -> DynAnyResult<()> {
        let (mut node, e) = self.lock_enum()?;
        let ordinal = e.ordinal_of(name).ok_or_else(|| {
            DynAnyError::invalid(format!("{} has no enumerator {name}", node.name()))
        })?;
        node.body = Body::Enum(ordinal);
        node.tick();
        Ok(())
    }

    pub fn get_as_ordinal(&self) -> DynAnyResult<u32> {
        let (node, _) = self.lock_enum()?;
        Ok(Self::ordinal(&node))
    }

    /// Select an enumerator by position.
    pub fn set_as_ordinal(&self, ordinal: u32) -> DynAnyResult<()> {
        let (mut node, e) = self.lock_enum()?;
        if e.name_of(ordinal).is_none() {
            return Err(DynAnyError::invalid(format!(
                "ordinal {ordinal} out of range for {}",
                node.name()
            )));
        }
        node.body = Body::Enum(ordinal);
        node.tick();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::dynany::DynAnyFactory;
    use crate::error::DynAnyError;
    use crate::types::{EnumBuilder, PrimitiveKind, TypeDescriptor};
    use std::sync::Arc;

    fn color() -> Arc<TypeDescriptor> {
        Arc::new(
            EnumBuilder::new("Color")
                .variant("Red")
                .variant("Green")
                .variant("Blue")
                .build(),
        )
    }

    #[test]
    fn test_name_and_ordinal_stay_in_sync() {
        let factory = DynAnyFactory::new();
        let v = factory.create_from_type(&color()).expect("create");
        assert_eq!(v.get_as_string().expect("name"), "Red");

        v.set_as_string("Blue").expect("by name");
        assert_eq!(v.get_as_ordinal().expect("ordinal"), 2);

        v.set_as_ordinal(1).expect("by ordinal");
        assert_eq!(v.get_as_string().expect("name"), "Green");
    }

    #[test]
    fn test_unknown_enumerator_is_invalid() {
        let factory = DynAnyFactory::new();
        let v = factory.create_from_type(&color()).expect("create");
        assert!(matches!(
            v.set_as_string("Purple"),
            Err(DynAnyError::InvalidValue(_))
        ));
        assert!(matches!(
            v.set_as_ordinal(3),
            Err(DynAnyError::InvalidValue(_))
        ));
        assert_eq!(v.get_as_ordinal().expect("unchanged"), 0);
    }

    #[test]
    fn test_enum_ops_on_other_kinds() {
        let factory = DynAnyFactory::new();
        let v = factory
            .create_from_type(&Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32)))
            .expect("create");
        assert!(matches!(v.get_as_string(), Err(DynAnyError::TypeMismatch(_))));
    }
}
