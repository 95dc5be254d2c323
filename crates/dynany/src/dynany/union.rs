// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discriminated unions.
//!
//! Components are the discriminator followed by the active member, if any.
//! The active member always follows the discriminator: changing the
//! discriminator through its handle switches the member on the next access.

use super::constructed::Constructed;
use super::repr::Representation;
use super::{Body, DynAny, Node};
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TcKind, TypeDescriptor, TypeKind, UnionDescriptor};
use crate::value::Value;
use parking_lot::MutexGuard;
use std::sync::Arc;

pub(crate) struct UnionState {
    pub(crate) base: Constructed,
    /// Case index of the active member. Valid while components are held.
    pub(crate) member_index: Option<usize>,
}

impl UnionState {
    pub(crate) fn new(base: Constructed) -> Self {
        Self {
            base,
            member_index: None,
        }
    }
}

/// Discriminator label and active case of a default-initialized union.
pub(crate) fn initial_selection(u: &UnionDescriptor) -> (i64, Option<usize>) {
    let Some(first) = u.cases.first() else {
        return (u.unused_label().unwrap_or(0), None);
    };
    let label = if u.default_index == Some(0) {
        u.unused_label()
    } else {
        first.labels.first().copied()
    };
    match label {
        Some(label) => (label, Some(0)),
        None => (0, u.case_index_for(0)),
    }
}

/// A union whose components lost their shape.
pub(crate) fn broken(what: &str) -> DynAnyError {
    log::error!("[DYNANY] invariant violated: {what}");
    DynAnyError::invalid(what)
}

fn descriptor(real: &TypeDescriptor) -> DynAnyResult<&UnionDescriptor> {
    match &real.kind {
        TypeKind::Union(u) => Ok(u),
        _ => Err(DynAnyError::mismatch(format!(
            "{} is not a union",
            real.tc_kind()
        ))),
    }
}

impl Node {
    /// Switch the active member when the discriminator no longer selects it.
    pub(crate) fn sync_union(&mut self) -> DynAnyResult<()> {
        let Body::Union(state) = &self.body else {
            return Ok(());
        };
        if !state.base.repr.contains(Representation::COMPONENTS) {
            return Ok(());
        }
        let Some(discriminator) = state.base.components.first().cloned() else {
            return Ok(());
        };
        let current = state.member_index;
        let real = Arc::clone(&self.real);
        let u = descriptor(&real)?;
        let want = u.case_index_for(discriminator.label()?);
        if want == current {
            return Ok(());
        }
        self.switch_member(u, want)
    }

    /// Replace the member with a default one for case `want`.
    fn switch_member(&mut self, u: &UnionDescriptor, want: Option<usize>) -> DynAnyResult<()> {
        let member = match want.and_then(|i| u.cases.get(i)) {
            Some(case) => Some(
                self.ctx
                    .factory
                    .component_from_type(&self.ctx, &case.type_desc)?,
            ),
            None => None,
        };
        log::debug!(
            "[DYNANY] {} active member {:?} -> {:?}",
            self.name(),
            self.member_name(),
            want.and_then(|i| u.cases.get(i)).map(|c| c.name.as_str())
        );
        self.tick();
        let Body::Union(state) = &mut self.body else {
            return Ok(());
        };
        state.member_index = want;
        let base = &mut state.base;
        for old in base.components.drain(1..) {
            old.force_destroy();
        }
        base.components.extend(member);
        base.repr = Representation::COMPONENTS;
        base.encoded = None;
        let last = base.components.len().saturating_sub(1);
        if base.cursor.is_some_and(|c| c > last) {
            base.cursor = Some(last);
        }
        Ok(())
    }

    fn member_name(&self) -> Option<String> {
        let Body::Union(state) = &self.body else {
            return None;
        };
        let u = descriptor(&self.real).ok()?;
        state
            .member_index
            .and_then(|i| u.cases.get(i))
            .map(|c| c.name.clone())
    }

    fn member_index(&self) -> Option<usize> {
        match &self.body {
            Body::Union(state) => state.member_index,
            _ => None,
        }
    }

    fn set_union_cursor(&mut self, cursor: usize) {
        if let Some(base) = self.body.base_mut() {
            base.cursor = Some(cursor);
            base.repr = Representation::COMPONENTS;
            base.encoded = None;
        }
    }
}

impl DynAny {
    /// Lock a union with its components materialized and in sync.
    fn lock_union(&self) -> DynAnyResult<(MutexGuard<'_, Node>, Arc<TypeDescriptor>)> {
        let mut node = self.lock()?;
        descriptor(&node.real)?;
        node.sync_union()?;
        node.ensure_components()?;
        let real = Arc::clone(&node.real);
        Ok((node, real))
    }

    /// The discriminator component.
    ///
    /// Changing it through the returned handle selects the matching member.
    pub fn get_discriminator(&self) -> DynAnyResult<DynAny> {
        let (node, _) = self.lock_union()?;
        node.components()
            .first()
            .cloned()
            .ok_or_else(|| broken("union without discriminator"))
    }

    /// Set the discriminator to the value of `discriminator`.
    ///
    /// When the new value selects another member, the member is replaced
    /// by a default one; otherwise it is kept. The cursor moves to the
    /// member, or to the discriminator when no member is active.
    pub fn set_discriminator(&self, discriminator: &DynAny) -> DynAnyResult<()> {
        let any = discriminator.snapshot()?;
        let (mut node, real) = self.lock_union()?;
        let u = descriptor(&real)?;
        if **any.type_desc() != *u.discriminator {
            return Err(DynAnyError::mismatch(format!(
                "discriminator of {} is not {}",
                node.name(),
                super::factory::type_name(any.type_desc())
            )));
        }
        let current = node
            .components()
            .first()
            .cloned()
            .ok_or_else(|| broken("union without discriminator"))?;
        current.lock()?.set_from_any(&any, true)?;
        node.sync_union()?;
        let cursor = if node.member_index().is_some() { 1 } else { 0 };
        node.set_union_cursor(cursor);
        node.tick();
        Ok(())
    }

    /// Kind of the discriminator type.
    pub fn discriminator_kind(&self) -> DynAnyResult<TcKind> {
        let node = self.lock()?;
        Ok(descriptor(&node.real)?.discriminator.tc_kind())
    }

    /// Select the default case with a default-valued member.
    ///
    /// Fails with `TypeMismatch` when the union has no default case.
    pub fn set_to_default_member(&self) -> DynAnyResult<()> {
        let (mut node, real) = self.lock_union()?;
        let u = descriptor(&real)?;
        let Some(default) = u.default_index else {
            return Err(DynAnyError::mismatch(format!(
                "{} has no default member",
                node.name()
            )));
        };
        let label = Self::free_label(&node, u)?;
        node.set_discriminator_label(u, label)?;
        node.switch_member(u, Some(default))?;
        node.set_union_cursor(1);
        Ok(())
    }

    /// Deactivate the member.
    ///
    /// Fails with `TypeMismatch` when the union has a default case, since
    /// every label then selects a member.
    pub fn set_to_no_active_member(&self) -> DynAnyResult<()> {
        let (mut node, real) = self.lock_union()?;
        let u = descriptor(&real)?;
        if u.default_index.is_some() {
            return Err(DynAnyError::mismatch(format!(
                "{} has a default member",
                node.name()
            )));
        }
        let label = Self::free_label(&node, u)?;
        node.set_discriminator_label(u, label)?;
        if node.member_index().is_some() {
            node.switch_member(u, None)?;
        }
        node.set_union_cursor(0);
        node.tick();
        Ok(())
    }

    fn free_label(node: &Node, u: &UnionDescriptor) -> DynAnyResult<i64> {
        u.unused_label().ok_or_else(|| {
            DynAnyError::invalid(format!("every label of {} is used", node.name()))
        })
    }

    /// Whether the discriminator selects no member.
    pub fn has_no_active_member(&self) -> DynAnyResult<bool> {
        let (node, real) = self.lock_union()?;
        if descriptor(&real)?.default_index.is_some() {
            return Ok(false);
        }
        Ok(node.member_index().is_none())
    }

    /// Whether the active member is the default case.
    pub fn is_set_to_default_member(&self) -> DynAnyResult<bool> {
        let (node, real) = self.lock_union()?;
        let default = descriptor(&real)?.default_index;
        Ok(default.is_some() && node.member_index() == default)
    }

    /// The active member component.
    pub fn member(&self) -> DynAnyResult<DynAny> {
        let (node, _) = self.lock_union()?;
        if node.member_index().is_none() {
            return Err(DynAnyError::invalid(format!(
                "{} has no active member",
                node.name()
            )));
        }
        node.components()
            .get(1)
            .cloned()
            .ok_or_else(|| broken("active member missing"))
    }

    /// Name of the active member.
    pub fn member_name(&self) -> DynAnyResult<String> {
        let (node, _) = self.lock_union()?;
        node.member_name().ok_or_else(|| {
            DynAnyError::invalid(format!("{} has no active member", node.name()))
        })
    }

    /// Kind of the active member type.
    pub fn member_kind(&self) -> DynAnyResult<TcKind> {
        let (node, real) = self.lock_union()?;
        let u = descriptor(&real)?;
        node.member_index()
            .and_then(|i| u.cases.get(i))
            .map(|c| c.type_desc.tc_kind())
            .ok_or_else(|| DynAnyError::invalid(format!("{} has no active member", node.name())))
    }
}

impl Node {
    fn set_discriminator_label(&mut self, u: &UnionDescriptor, label: i64) -> DynAnyResult<()> {
        let value = Value::from_label(&u.discriminator, label).ok_or_else(|| {
            DynAnyError::invalid(format!("label {label} does not fit the discriminator"))
        })?;
        let discriminator = self
            .components()
            .first()
            .cloned()
            .ok_or_else(|| broken("union without discriminator"))?;
        discriminator.insert_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, UnionBuilder, UnionCase};

    fn long() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32))
    }

    #[test]
    fn test_initial_selection_uses_first_label() {
        let u = UnionDescriptor::new(
            long(),
            vec![
                UnionCase::new("a", vec![4, 5], long()),
                UnionCase::single("b", 7, long()),
            ],
        );
        assert_eq!(initial_selection(&u), (4, Some(0)));
    }

    #[test]
    fn test_initial_selection_default_first() {
        let u = UnionDescriptor {
            discriminator: long(),
            cases: vec![
                UnionCase::new("d", vec![], long()),
                UnionCase::single("a", 0, long()),
            ],
            default_index: Some(0),
        };
        let (label, index) = initial_selection(&u);
        assert_eq!(index, Some(0));
        assert!(!u.is_label_used(label));
    }

    #[test]
    fn test_initial_selection_without_cases() {
        let u = UnionDescriptor::new(long(), vec![]);
        assert_eq!(initial_selection(&u), (0, None));
        let built = UnionBuilder::new("Empty", long()).build();
        assert!(matches!(built.kind, TypeKind::Union(_)));
    }
}
