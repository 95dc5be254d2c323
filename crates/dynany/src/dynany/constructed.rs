// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lazy representation management shared by all constructed values.

use super::repr::Representation;
use super::{Body, DynAny, Node};
use crate::any::Any;
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TypeDescriptor, TypeKind};
use crate::value::Value;
use std::sync::Arc;

/// State common to structs, unions, collections and value types.
pub(crate) struct Constructed {
    pub(crate) repr: Representation,
    /// Valid while `repr` has `ENCODED`.
    pub(crate) encoded: Option<Any>,
    /// Clock reading at which `encoded` was taken.
    pub(crate) encoded_at: u64,
    /// Valid while `repr` has `COMPONENTS`.
    pub(crate) components: Vec<DynAny>,
    /// None is the unset cursor.
    pub(crate) cursor: Option<usize>,
    recursive: Option<bool>,
}

impl Constructed {
    pub(crate) fn type_only() -> Self {
        Self {
            repr: Representation::TYPE_ONLY,
            encoded: None,
            encoded_at: 0,
            components: Vec::new(),
            cursor: Some(0),
            recursive: None,
        }
    }

    pub(crate) fn encoded(any: Any, now: u64) -> Self {
        Self {
            repr: Representation::ENCODED,
            encoded: Some(any),
            encoded_at: now,
            ..Self::type_only()
        }
    }

    /// Drop the current components and forget every representation.
    fn clear(&mut self) {
        self.encoded = None;
        for component in self.components.drain(..) {
            component.force_destroy();
        }
    }

    /// Install freshly built components as the only representation.
    pub(crate) fn replace_components(&mut self, components: Vec<DynAny>) {
        self.clear();
        self.cursor = if components.is_empty() { None } else { Some(0) };
        self.components = components;
        self.repr = Representation::COMPONENTS;
    }

    /// Forget everything but the type; defaults are synthesized on next access.
    pub(crate) fn reset_to_type(&mut self) {
        self.clear();
        self.repr = Representation::TYPE_ONLY;
        self.cursor = Some(0);
    }
}

/// Components plus, for unions, the active member index.
pub(crate) type Decomposed = (Vec<DynAny>, Option<usize>);

impl Node {
    pub(crate) fn components(&self) -> &[DynAny] {
        self.body.base().map_or(&[], |b| b.components.as_slice())
    }

    pub(crate) fn cursor_component(&self) -> Option<DynAny> {
        let base = self.body.base()?;
        base.components.get(base.cursor?).cloned()
    }

    pub(crate) fn limits_depth(&self) -> usize {
        self.ctx.factory.config().max_decode_depth
    }

    /// Whether the declared type is a back reference to an enclosing type.
    fn is_recursive(&mut self) -> bool {
        let back_reference = self.type_desc.is_recursive();
        match self.body.base_mut() {
            Some(base) => *base.recursive.get_or_insert(back_reference),
            None => false,
        }
    }

    /// The encoding, when it still matches the components.
    fn trusted_encoded(&self) -> Option<Any> {
        let base = self.body.base()?;
        if !base.repr.contains(Representation::ENCODED) {
            return None;
        }
        if base.repr.contains(Representation::COMPONENTS)
            && base.encoded_at != self.ctx.clock.now()
        {
            return None;
        }
        base.encoded.clone()
    }

    /// Make sure components are populated, decoding or synthesizing them.
    pub(crate) fn ensure_components(&mut self) -> DynAnyResult<()> {
        let Some(base) = self.body.base() else {
            return Ok(());
        };
        if base.repr.contains(Representation::COMPONENTS) {
            return Ok(());
        }
        let from_encoding = match (&base.encoded, base.repr.contains(Representation::ENCODED)) {
            (Some(any), true) => Some(any.clone()),
            _ => None,
        };
        let (components, member_index) = match &from_encoding {
            Some(any) => {
                let value = any.value_with_limits(self.ctx.factory.config().decode_limits())?;
                self.decompose(&value)?
            }
            None => self.default_components()?,
        };
        log::trace!(
            "[DYNANY] materialized {} components of {} ({})",
            components.len(),
            self.name(),
            if from_encoding.is_some() { "decoded" } else { "defaults" }
        );

        let now = self.ctx.clock.now();
        if let Body::Union(state) = &mut self.body {
            state.member_index = member_index;
        }
        if let Some(base) = self.body.base_mut() {
            let len = components.len();
            base.components = components;
            base.repr.insert(Representation::COMPONENTS);
            if from_encoding.is_some() {
                base.encoded_at = now;
            }
            if base.cursor.is_some_and(|c| c >= len) {
                base.cursor = None;
            }
        }
        Ok(())
    }

    /// Components holding the parts of a decoded value.
    fn decompose(&self, value: &Value) -> DynAnyResult<Decomposed> {
        let factory = &self.ctx.factory;
        let ctx = &self.ctx;
        let part = |t: &Arc<TypeDescriptor>, v: &Value| factory.component_from_value(ctx, t, v);
        let shape_error = || {
            DynAnyError::invalid(format!(
                "{} value does not fit {}",
                value.kind_name(),
                self.name()
            ))
        };

        match (&self.real.kind, value) {
            (TypeKind::Struct(fields) | TypeKind::Exception(fields), Value::Struct(members))
            | (TypeKind::ValueType(fields), Value::ValueType(Some(members)))
                if fields.len() == members.len() =>
            {
                let components = fields
                    .iter()
                    .zip(members)
                    .map(|(f, m)| part(&f.type_desc, m))
                    .collect::<DynAnyResult<Vec<_>>>()?;
                Ok((components, None))
            }
            (TypeKind::ValueType(_), Value::ValueType(None))
            | (TypeKind::ValueBox(_), Value::ValueBox(None)) => Ok((Vec::new(), None)),
            (TypeKind::ValueBox(boxed), Value::ValueBox(Some(inner))) => {
                Ok((vec![part(boxed, inner)?], None))
            }
            (TypeKind::Sequence(s), Value::Sequence(items)) => Ok((
                items
                    .iter()
                    .map(|item| part(&s.element_type, item))
                    .collect::<DynAnyResult<Vec<_>>>()?,
                None,
            )),
            (TypeKind::Array(a), Value::Array(items)) => Ok((
                items
                    .iter()
                    .map(|item| part(&a.element_type, item))
                    .collect::<DynAnyResult<Vec<_>>>()?,
                None,
            )),
            (
                TypeKind::Union(u),
                Value::Union {
                    discriminator,
                    member,
                },
            ) => {
                let label = discriminator.to_label().ok_or_else(shape_error)?;
                let index = u.case_index_for(label);
                let mut components = vec![part(&u.discriminator, discriminator)?];
                match (index.and_then(|i| u.cases.get(i)), member) {
                    (Some(case), Some(member)) => {
                        components.push(part(&case.type_desc, member)?);
                        Ok((components, index))
                    }
                    (None, None) => Ok((components, None)),
                    _ => Err(shape_error()),
                }
            }
            _ => Err(shape_error()),
        }
    }

    /// Default-valued components synthesized from the type.
    fn default_components(&self) -> DynAnyResult<Decomposed> {
        let factory = &self.ctx.factory;
        let ctx = &self.ctx;
        let fresh = |t: &Arc<TypeDescriptor>| factory.component_from_type(ctx, t);

        if self.is_null_value() {
            return Ok((Vec::new(), None));
        }
        match &self.real.kind {
            TypeKind::Struct(fields) | TypeKind::Exception(fields) | TypeKind::ValueType(fields) => {
                let components = fields
                    .iter()
                    .map(|f| fresh(&f.type_desc))
                    .collect::<DynAnyResult<Vec<_>>>()?;
                Ok((components, None))
            }
            TypeKind::ValueBox(boxed) => Ok((vec![fresh(boxed)?], None)),
            TypeKind::Sequence(s) => {
                let wanted = factory.config().default_sequence_length;
                let len = match s.max_length {
                    Some(max) if max > 0 => wanted.min(max),
                    _ => wanted,
                };
                let components = (0..len)
                    .map(|_| fresh(&s.element_type))
                    .collect::<DynAnyResult<Vec<_>>>()?;
                Ok((components, None))
            }
            TypeKind::Array(a) => {
                let components = (0..a.length)
                    .map(|_| fresh(&a.element_type))
                    .collect::<DynAnyResult<Vec<_>>>()?;
                Ok((components, None))
            }
            TypeKind::Union(u) => {
                let (label, index) = super::union::initial_selection(u);
                let discriminator = Value::from_label(&u.discriminator, label)
                    .map(|v| factory.component_from_value(ctx, &u.discriminator, &v))
                    .unwrap_or_else(|| fresh(&u.discriminator))?;
                let mut components = vec![discriminator];
                if let Some(case) = index.and_then(|i| u.cases.get(i)) {
                    components.push(fresh(&case.type_desc)?);
                }
                Ok((components, index))
            }
            _ => Err(DynAnyError::mismatch(format!(
                "{} has no components",
                self.name()
            ))),
        }
    }

    /// Value assembled from the components.
    fn compose(&self, depth: usize) -> DynAnyResult<Value> {
        let parts = self
            .components()
            .iter()
            .map(|c| c.value_at(depth + 1))
            .collect::<DynAnyResult<Vec<_>>>()?;
        let value = match &self.body {
            Body::Struct(_) => Value::Struct(parts),
            Body::Sequence(_) => Value::Sequence(parts),
            Body::Array(_) => Value::Array(parts),
            Body::Union(state) => {
                let mut parts = parts.into_iter();
                let discriminator = parts
                    .next()
                    .ok_or_else(|| super::union::broken("union without discriminator"))?;
                let member = match state.member_index {
                    Some(_) => parts.next().map(Box::new),
                    None => None,
                };
                Value::Union {
                    discriminator: Box::new(discriminator),
                    member,
                }
            }
            Body::ValueType(state) if state.is_null => Value::ValueType(None),
            Body::ValueType(_) => Value::ValueType(Some(parts)),
            Body::ValueBox(state) if state.is_null => Value::ValueBox(None),
            Body::ValueBox(_) => Value::ValueBox(parts.into_iter().next().map(Box::new)),
            Body::Basic(v) => v.clone(),
            Body::Enum(o) => Value::Enum(*o),
        };
        Ok(value)
    }

    /// Fully decoded value of this node.
    pub(crate) fn to_value(&mut self, depth: usize) -> DynAnyResult<Value> {
        if depth > self.limits_depth() {
            return Err(DynAnyError::invalid(format!(
                "{} nests deeper than {}",
                self.name(),
                self.limits_depth()
            )));
        }
        match &self.body {
            Body::Basic(v) => return Ok(v.clone()),
            Body::Enum(o) => return Ok(Value::Enum(*o)),
            _ => {}
        }
        self.sync_union()?;
        if let Some(any) = self.trusted_encoded() {
            return Ok(any.value_with_limits(self.ctx.factory.config().decode_limits())?);
        }
        self.ensure_components()?;
        self.compose(depth)
    }

    /// Make sure an encoding matching the components is held.
    ///
    /// Returns None for a non-null value whose declared type is a back
    /// reference and that only has its type.
    fn ensure_encoded(&mut self) -> DynAnyResult<Option<Any>> {
        self.sync_union()?;
        if let Some(any) = self.trusted_encoded() {
            return Ok(Some(any));
        }
        let type_only = self
            .body
            .base()
            .is_some_and(|b| b.repr == Representation::TYPE_ONLY);
        if type_only && !self.is_null_value() && self.is_recursive() {
            log::debug!(
                "[DYNANY] {} is self-referential and only has its type, not encoding",
                self.name()
            );
            return Ok(None);
        }
        let value = self.to_value(0)?;
        let any = Any::new(Arc::clone(&self.type_desc), &value)?;
        let now = self.ctx.clock.now();
        if let Some(base) = self.body.base_mut() {
            base.encoded = Some(any.clone());
            base.encoded_at = now;
            base.repr.insert(Representation::ENCODED);
        }
        log::trace!("[DYNANY] encoded {}", self.name());
        Ok(Some(any))
    }

    pub(crate) fn to_any(&mut self) -> DynAnyResult<Any> {
        match &self.body {
            Body::Basic(v) => Ok(Any::new(Arc::clone(&self.type_desc), v)?),
            Body::Enum(o) => Ok(Any::new(Arc::clone(&self.type_desc), &Value::Enum(*o))?),
            _ => Ok(self
                .ensure_encoded()?
                .unwrap_or_else(|| Any::empty(Arc::clone(&self.type_desc)))),
        }
    }

    /// Like `to_any`, but always carries a value.
    pub(crate) fn snapshot(&mut self) -> DynAnyResult<Any> {
        let any = self.to_any()?;
        if any.has_value() {
            return Ok(any);
        }
        let value = self.to_value(0)?;
        Ok(Any::new(Arc::clone(&self.type_desc), &value)?)
    }

    /// Replace the whole value. The type was already checked.
    pub(crate) fn set_from_any(&mut self, any: &Any, copy: bool) -> DynAnyResult<()> {
        let value = any.value_with_limits(self.ctx.factory.config().decode_limits())?;
        let now = self.ctx.clock.tick();
        match &mut self.body {
            Body::Basic(current) => match &self.real.kind {
                TypeKind::Primitive(p) if value.matches_primitive(*p) => *current = value,
                _ => {
                    return Err(DynAnyError::invalid(format!(
                        "{} does not fit {}",
                        value.kind_name(),
                        self.real.tc_kind()
                    )))
                }
            },
            Body::Enum(ordinal) => match (&self.real.kind, value) {
                (TypeKind::Enum(e), Value::Enum(o)) if e.name_of(o).is_some() => *ordinal = o,
                (_, other) => return Err(DynAnyError::invalid(format!("bad enum value {other}"))),
            },
            body => {
                if let Body::ValueType(state) | Body::ValueBox(state) = &mut *body {
                    state.is_null = value.is_null();
                }
                if let Some(base) = body.base_mut() {
                    base.clear();
                    base.encoded = Some(if copy { any.deep_copy() } else { any.clone() });
                    base.encoded_at = now;
                    base.repr = Representation::ENCODED;
                    base.cursor = Some(0);
                }
            }
        }
        log::trace!("[DYNANY] {} replaced from encoded value", self.name());
        Ok(())
    }
}
