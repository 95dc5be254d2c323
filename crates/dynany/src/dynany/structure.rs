// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named members of structs, exceptions and value types.

use super::factory::type_name;
use super::{Body, DynAny, Node};
use crate::any::Any;
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{FieldDescriptor, TcKind, TypeDescriptor};
use std::sync::Arc;

/// A member name with its encoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct NameValuePair {
    pub id: String,
    pub value: Any,
}

impl NameValuePair {
    pub fn new(id: impl Into<String>, value: Any) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// A member name with its live component.
#[derive(Debug, Clone)]
pub struct NameDynAnyPair {
    pub id: String,
    pub value: DynAny,
}

impl Node {
    fn member_fields(&self) -> DynAnyResult<Vec<FieldDescriptor>> {
        match &self.body {
            Body::Struct(_) | Body::ValueType(_) => {}
            _ => {
                return Err(DynAnyError::mismatch(format!(
                    "{} has no named members",
                    self.name()
                )))
            }
        }
        Ok(self.real.fields().map(<[_]>::to_vec).unwrap_or_default())
    }

    fn reject_null(&self) -> DynAnyResult<()> {
        if self.is_null_value() {
            return Err(DynAnyError::invalid(format!("{} is null", self.name())));
        }
        Ok(())
    }

    /// Check a replacement member list against the declared fields.
    fn check_members<'a>(
        &self,
        fields: &[FieldDescriptor],
        members: impl ExactSizeIterator<Item = (&'a str, &'a Arc<TypeDescriptor>)>,
    ) -> DynAnyResult<()> {
        if members.len() != fields.len() {
            return Err(DynAnyError::invalid(format!(
                "{} has {} members, got {}",
                self.name(),
                fields.len(),
                members.len()
            )));
        }
        for (field, (id, type_desc)) in fields.iter().zip(members) {
            if !id.is_empty() && id != field.name {
                return Err(DynAnyError::mismatch(format!(
                    "expected member {}, got {id}",
                    field.name
                )));
            }
            if **type_desc != *field.type_desc {
                return Err(DynAnyError::mismatch(format!(
                    "member {} is {}, got {}",
                    field.name,
                    type_name(&field.type_desc),
                    type_name(type_desc)
                )));
            }
        }
        Ok(())
    }

    /// Build components from encoded members, all or nothing.
    pub(crate) fn build_components(&self, values: &[Any], copy: bool) -> DynAnyResult<Vec<DynAny>> {
        let mut built = Vec::with_capacity(values.len());
        for any in values {
            let component = if any.has_value() {
                self.ctx.factory.component_from_any(&self.ctx, any, copy)
            } else {
                Err(DynAnyError::invalid("any carries no value"))
            };
            match component {
                Ok(c) => built.push(c),
                Err(e) => {
                    log::debug!(
                        "[DYNANY] rolling back {} of {} new components of {}: {e}",
                        built.len(),
                        values.len(),
                        self.name()
                    );
                    for c in built {
                        c.force_destroy();
                    }
                    return Err(e);
                }
            }
        }
        Ok(built)
    }

    /// Install components as the sole representation of a non-null value.
    pub(crate) fn commit_components(&mut self, components: Vec<DynAny>) {
        if let Body::ValueType(state) | Body::ValueBox(state) = &mut self.body {
            state.is_null = false;
        }
        if let Some(base) = self.body.base_mut() {
            base.replace_components(components);
        }
        self.tick();
    }

    fn current_field(&mut self) -> DynAnyResult<FieldDescriptor> {
        let fields = self.member_fields()?;
        self.ensure_components()?;
        let cursor = self.body.base().and_then(|b| b.cursor);
        cursor
            .and_then(|i| fields.get(i).cloned())
            .ok_or_else(|| DynAnyError::invalid(format!("cursor of {} is unset", self.name())))
    }
}

impl DynAny {
    /// Members with encoded values, in declaration order.
    pub fn get_members(&self) -> DynAnyResult<Vec<NameValuePair>> {
        let components = self.member_components()?;
        components
            .into_iter()
            .map(|(id, c)| Ok(NameValuePair::new(id, c.snapshot()?)))
            .collect()
    }

    /// Members with their live components, in declaration order.
    pub fn get_members_as_dyn_any(&self) -> DynAnyResult<Vec<NameDynAnyPair>> {
        Ok(self
            .member_components()?
            .into_iter()
            .map(|(id, value)| NameDynAnyPair { id, value })
            .collect())
    }

    fn member_components(&self) -> DynAnyResult<Vec<(String, DynAny)>> {
        let mut node = self.lock()?;
        let fields = node.member_fields()?;
        node.reject_null()?;
        node.ensure_components()?;
        Ok(fields
            .into_iter()
            .map(|f| f.name)
            .zip(node.components().iter().cloned())
            .collect())
    }

    /// Replace every member.
    ///
    /// Names may be empty; non-empty names must match the declaration.
    /// On error the value is left unchanged.
    pub fn set_members(&self, members: &[NameValuePair]) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        let fields = node.member_fields()?;
        node.check_members(
            &fields,
            members.iter().map(|m| (m.id.as_str(), m.value.type_desc())),
        )?;
        let values: Vec<Any> = members.iter().map(|m| m.value.clone()).collect();
        let components = node.build_components(&values, true)?;
        node.commit_components(components);
        Ok(())
    }

    /// Replace every member with copies of the given values.
    pub fn set_members_as_dyn_any(&self, members: &[NameDynAnyPair]) -> DynAnyResult<()> {
        let snapshots = members
            .iter()
            .map(|m| Ok(NameValuePair::new(m.id.clone(), m.value.snapshot()?)))
            .collect::<DynAnyResult<Vec<_>>>()?;
        let mut node = self.lock()?;
        let fields = node.member_fields()?;
        node.check_members(
            &fields,
            snapshots.iter().map(|m| (m.id.as_str(), m.value.type_desc())),
        )?;
        let values: Vec<Any> = snapshots.into_iter().map(|m| m.value).collect();
        let components = node.build_components(&values, false)?;
        node.commit_components(components);
        Ok(())
    }

    /// Name of the member under the cursor.
    pub fn current_member_name(&self) -> DynAnyResult<String> {
        Ok(self.lock()?.current_field()?.name)
    }

    /// Kind of the member under the cursor.
    pub fn current_member_kind(&self) -> DynAnyResult<TcKind> {
        Ok(self.lock()?.current_field()?.type_desc.tc_kind())
    }
}
