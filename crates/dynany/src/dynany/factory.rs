// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Construction of dynamic values.

use super::constructed::Constructed;
use super::repr::MutationClock;
use super::union::UnionState;
use super::value_type::ValueState;
use super::{Body, Context, DynAny, Node, Status};
use crate::any::Any;
use crate::config::{ConfigError, DynAnyConfig};
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TypeDescriptor, TypeKind};
use crate::value::Value;
use std::sync::Arc;

/// What a new node is built from.
enum Seed<'a> {
    /// Defaults of the type.
    Type,
    /// An already decoded value.
    Value(&'a Value),
    /// An encoding, together with its decoded value.
    Encoded(Any, &'a Value),
}

/// Creates dynamic values from types or encoded values.
///
/// Every value created by a factory, and every component of it, shares
/// the factory configuration.
#[derive(Debug, Clone, Default)]
pub struct DynAnyFactory {
    config: Arc<DynAnyConfig>,
}

impl DynAnyFactory {
    /// Factory with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with a validated configuration.
    pub fn with_config(config: DynAnyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DynAnyConfig {
        &self.config
    }

    /// Create a default-initialized value of `type_desc`.
    ///
    /// Constructed values start with only their type; components are
    /// synthesized on first access.
    pub fn create_from_type(&self, type_desc: &Arc<TypeDescriptor>) -> DynAnyResult<DynAny> {
        let ctx = self.root_context();
        let node = self.build(&ctx, type_desc, Status::Destroyable, Seed::Type)?;
        log::debug!("[DYNANY] created {} from type", type_name(type_desc));
        Ok(DynAny::from_node(node))
    }

    /// Create a value holding the contents of `any`.
    ///
    /// With `copy` the encoding is duplicated; otherwise the new value
    /// references the same immutable buffer. The encoding is decoded once
    /// to validate it; components are still decoded lazily.
    pub fn create_from_any(&self, any: &Any, copy: bool) -> DynAnyResult<DynAny> {
        let ctx = self.root_context();
        let node = self.node_from_any(&ctx, any, copy, Status::Destroyable)?;
        log::debug!(
            "[DYNANY] created {} from encoded value (copy={copy})",
            type_name(any.type_desc())
        );
        Ok(DynAny::from_node(node))
    }

    fn root_context(&self) -> Context {
        Context {
            factory: self.clone(),
            clock: MutationClock::new(),
        }
    }

    pub(crate) fn component_from_type(
        &self,
        ctx: &Context,
        type_desc: &Arc<TypeDescriptor>,
    ) -> DynAnyResult<DynAny> {
        self.build(ctx, type_desc, Status::Undestroyable, Seed::Type)
            .map(DynAny::from_node)
    }

    pub(crate) fn component_from_any(
        &self,
        ctx: &Context,
        any: &Any,
        copy: bool,
    ) -> DynAnyResult<DynAny> {
        self.node_from_any(ctx, any, copy, Status::Undestroyable)
            .map(DynAny::from_node)
    }

    pub(crate) fn component_from_value(
        &self,
        ctx: &Context,
        type_desc: &Arc<TypeDescriptor>,
        value: &Value,
    ) -> DynAnyResult<DynAny> {
        self.build(ctx, type_desc, Status::Undestroyable, Seed::Value(value))
            .map(DynAny::from_node)
    }

    fn node_from_any(
        &self,
        ctx: &Context,
        any: &Any,
        copy: bool,
        status: Status,
    ) -> DynAnyResult<Node> {
        if !any.has_value() {
            return Err(DynAnyError::invalid("any carries no value"));
        }
        let value = any.value_with_limits(self.config.decode_limits())?;
        let encoded = if copy { any.deep_copy() } else { any.clone() };
        self.build(ctx, any.type_desc(), status, Seed::Encoded(encoded, &value))
    }

    fn build(
        &self,
        ctx: &Context,
        type_desc: &Arc<TypeDescriptor>,
        status: Status,
        seed: Seed<'_>,
    ) -> DynAnyResult<Node> {
        let real = type_desc.resolved().ok_or_else(|| {
            DynAnyError::InconsistentTypeCode(format!(
                "{} does not resolve to a concrete type",
                type_name(type_desc)
            ))
        })?;

        let constructed = |seed: &Seed<'_>| -> DynAnyResult<Constructed> {
            match seed {
                Seed::Type => Ok(Constructed::type_only()),
                Seed::Value(v) => Ok(Constructed::encoded(
                    Any::new(Arc::clone(type_desc), v)?,
                    ctx.clock.now(),
                )),
                Seed::Encoded(any, _) => Ok(Constructed::encoded(any.clone(), ctx.clock.now())),
            }
        };
        let seeded = match &seed {
            Seed::Type => None,
            Seed::Value(v) | Seed::Encoded(_, v) => Some(*v),
        };

        let body = match &real.kind {
            TypeKind::Primitive(p) => match seeded {
                None => Body::Basic(Value::default_primitive(*p)),
                Some(v) if v.matches_primitive(*p) => Body::Basic(v.clone()),
                Some(v) => {
                    return Err(DynAnyError::mismatch(format!(
                        "{} is not a {}",
                        v.kind_name(),
                        p.idl_name()
                    )))
                }
            },
            TypeKind::Enum(e) => match seeded {
                None => Body::Enum(0),
                Some(Value::Enum(o)) if e.name_of(*o).is_some() => Body::Enum(*o),
                Some(v) => return Err(DynAnyError::invalid(format!("bad enum value {v}"))),
            },
            TypeKind::Struct(_) | TypeKind::Exception(_) => Body::Struct(constructed(&seed)?),
            TypeKind::Sequence(_) => Body::Sequence(constructed(&seed)?),
            TypeKind::Array(_) => Body::Array(constructed(&seed)?),
            TypeKind::Union(u) => {
                if u.discriminator.label_range().is_none() {
                    return Err(DynAnyError::InconsistentTypeCode(format!(
                        "{} has a discriminator that cannot select a member",
                        type_name(type_desc)
                    )));
                }
                Body::Union(UnionState::new(constructed(&seed)?))
            }
            TypeKind::ValueType(_) => {
                let is_null = seeded.map_or(true, Value::is_null);
                Body::ValueType(ValueState::new(constructed(&seed)?, is_null))
            }
            TypeKind::ValueBox(_) => {
                let is_null = seeded.map_or(true, Value::is_null);
                Body::ValueBox(ValueState::new(constructed(&seed)?, is_null))
            }
            TypeKind::Alias(_) | TypeKind::Recursive(_) => {
                return Err(DynAnyError::InconsistentTypeCode(format!(
                    "{} is an unresolved reference",
                    type_name(type_desc)
                )))
            }
        };

        Ok(Node {
            type_desc: Arc::clone(type_desc),
            real,
            status,
            ctx: ctx.clone(),
            body,
        })
    }
}

pub(crate) fn type_name(type_desc: &TypeDescriptor) -> String {
    if type_desc.name.is_empty() {
        type_desc.tc_kind().to_string()
    } else {
        type_desc.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeDescriptorBuilder, UnionBuilder};

    #[test]
    fn test_rejects_invalid_config() {
        let config = DynAnyConfig {
            max_decode_depth: 0,
            ..Default::default()
        };
        assert!(DynAnyFactory::with_config(config).is_err());
    }

    #[test]
    fn test_create_from_empty_any_is_invalid() {
        let factory = DynAnyFactory::new();
        let any = Any::empty(Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32)));
        assert!(matches!(
            factory.create_from_any(&any, true),
            Err(DynAnyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_union_with_float_discriminator_is_inconsistent() {
        let factory = DynAnyFactory::new();
        let u = Arc::new(
            UnionBuilder::new(
                "Bad",
                Arc::new(TypeDescriptor::primitive("", PrimitiveKind::F32)),
            )
            .primitive_case("a", 1, PrimitiveKind::I32)
            .build(),
        );
        assert!(matches!(
            factory.create_from_type(&u),
            Err(DynAnyError::InconsistentTypeCode(_))
        ));
    }

    #[test]
    fn test_created_values_are_destroyable() {
        let factory = DynAnyFactory::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::new("P")
                .field("x", PrimitiveKind::I32)
                .build(),
        );
        let dyn_any = factory.create_from_type(&desc).expect("create");
        assert_eq!(dyn_any.status(), Status::Destroyable);
        let member = dyn_any
            .current_component()
            .expect("component")
            .expect("present");
        assert_eq!(member.status(), Status::Undestroyable);
    }
}
