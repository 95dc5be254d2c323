// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values.
//!
//! A [`DynAny`] is a handle to a value of any type described by a
//! [`TypeDescriptor`]. Values are built by a [`DynAnyFactory`] either from a
//! type (default-initialized) or from an [`Any`] (an encoded value), and can
//! be inspected and mutated without static knowledge of the type.
//!
//! # Representation
//!
//! Constructed values (structs, unions, sequences, arrays, value types)
//! hold up to three interchangeable representations: the type alone, an
//! encoded snapshot, and decoded component values. Components are only
//! decoded or synthesized when a traversal or member operation needs them,
//! and the encoding is only rebuilt when [`DynAny::to_any`] asks for it.
//!
//! # Traversal
//!
//! Each constructed value has a cursor over its components. `seek`, `next`
//! and `rewind` move it; `current_component` returns the component under
//! it; the primitive accessors (`insert_i32`, `get_string`, ...) read and
//! write the component under the cursor.
//!
//! # Example
//!
//! ```rust
//! use dynany::{DynAnyFactory, TypeDescriptorBuilder, PrimitiveKind};
//! use std::sync::Arc;
//!
//! let point = Arc::new(TypeDescriptorBuilder::new("Point")
//!     .field("x", PrimitiveKind::I32)
//!     .field("y", PrimitiveKind::I32)
//!     .build());
//!
//! let factory = DynAnyFactory::new();
//! let value = factory.create_from_type(&point).unwrap();
//! value.insert_i32(3).unwrap();
//! value.next().unwrap();
//! value.insert_i32(4).unwrap();
//!
//! let any = value.to_any().unwrap();
//! let copy = factory.create_from_any(&any, true).unwrap();
//! assert!(copy.equal(&value).unwrap());
//! ```
//!
//! # Handles
//!
//! Handles are cheap to clone and refer to the same value. Components
//! returned by a parent belong to it: destroying them is a no-op, and they
//! are destroyed with the parent or when the parent replaces them.

mod basic;
mod collection;
mod constructed;
mod enumeration;
mod factory;
mod repr;
mod structure;
mod union;
mod value_type;


pub use factory::DynAnyFactory;
pub use structure::{NameDynAnyPair, NameValuePair};

use crate::any::Any;
use crate::error::{DynAnyError, DynAnyResult};
use crate::types::{TcKind, TypeDescriptor};
use crate::value::Value;
use constructed::Constructed;
use factory::type_name;
use parking_lot::{Mutex, MutexGuard};
use repr::MutationClock;
use std::fmt;
use std::sync::Arc;
use union::UnionState;
use value_type::ValueState;

/// Lifecycle state of a dynamic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A top-level value; `destroy` releases it.
    Destroyable,
    /// A component owned by another value; `destroy` is a no-op.
    Undestroyable,
    /// Destroyed; every operation fails.
    Destroyed,
}

/// Shared by a root value and all of its components.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub(crate) factory: DynAnyFactory,
    pub(crate) clock: MutationClock,
}

pub(crate) enum Body {
    Basic(Value),
    Enum(u32),
    /// Structs and exceptions.
    Struct(Constructed),
    Sequence(Constructed),
    Array(Constructed),
    Union(UnionState),
    ValueType(ValueState),
    ValueBox(ValueState),
}

impl Body {
    pub(crate) fn base(&self) -> Option<&Constructed> {
        match self {
            Self::Struct(c) | Self::Sequence(c) | Self::Array(c) => Some(c),
            Self::Union(u) => Some(&u.base),
            Self::ValueType(v) | Self::ValueBox(v) => Some(&v.base),
            Self::Basic(_) | Self::Enum(_) => None,
        }
    }

    pub(crate) fn base_mut(&mut self) -> Option<&mut Constructed> {
        match self {
            Self::Struct(c) | Self::Sequence(c) | Self::Array(c) => Some(c),
            Self::Union(u) => Some(&mut u.base),
            Self::ValueType(v) | Self::ValueBox(v) => Some(&mut v.base),
            Self::Basic(_) | Self::Enum(_) => None,
        }
    }
}

pub(crate) struct Node {
    /// The type as given at creation.
    pub(crate) type_desc: Arc<TypeDescriptor>,
    /// `type_desc` with aliases and back references resolved.
    pub(crate) real: Arc<TypeDescriptor>,
    pub(crate) status: Status,
    pub(crate) ctx: Context,
    pub(crate) body: Body,
}

impl Node {
    pub(crate) fn check_alive(&self) -> DynAnyResult<()> {
        match self.status {
            Status::Destroyed => Err(DynAnyError::Destroyed),
            _ => Ok(()),
        }
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.body.base().is_some()
    }

    pub(crate) fn tick(&self) {
        self.ctx.clock.tick();
    }

    pub(crate) fn name(&self) -> String {
        type_name(&self.type_desc)
    }
}

/// Handle to a dynamic value.
#[derive(Clone)]
pub struct DynAny {
    node: Arc<Mutex<Node>>,
}

impl DynAny {
    pub(crate) fn from_node(node: Node) -> Self {
        Self {
            node: Arc::new(Mutex::new(node)),
        }
    }

    /// Lock the node, failing if it was destroyed.
    pub(crate) fn lock(&self) -> DynAnyResult<MutexGuard<'_, Node>> {
        let node = self.node.lock();
        node.check_alive()?;
        Ok(node)
    }

    /// Whether two handles refer to the same value.
    pub fn ptr_eq(&self, other: &DynAny) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub fn status(&self) -> Status {
        self.node.lock().status
    }

    /// The type this value was created with.
    pub fn type_desc(&self) -> DynAnyResult<Arc<TypeDescriptor>> {
        Ok(Arc::clone(&self.lock()?.type_desc))
    }

    /// Kind of the type this value was created with.
    pub fn kind(&self) -> DynAnyResult<TcKind> {
        Ok(self.lock()?.type_desc.tc_kind())
    }

    /// Destroy this value and all of its components.
    ///
    /// A component owned by another value is left untouched.
    pub fn destroy(&self) -> DynAnyResult<()> {
        let status = self.lock()?.status;
        if status == Status::Destroyable {
            self.force_destroy();
        }
        Ok(())
    }

    pub(crate) fn force_destroy(&self) {
        let mut node = self.node.lock();
        node.status = Status::Destroyed;
        if let Some(base) = node.body.base_mut() {
            base.encoded = None;
            for component in base.components.drain(..) {
                component.force_destroy();
            }
        }
    }

    /// An independent deep copy, owned by the caller.
    pub fn copy(&self) -> DynAnyResult<DynAny> {
        let (factory, type_desc, any) = {
            let mut node = self.lock()?;
            let any = node.to_any()?;
            (node.ctx.factory.clone(), Arc::clone(&node.type_desc), any)
        };
        if any.has_value() {
            factory.create_from_any(&any, true)
        } else {
            factory.create_from_type(&type_desc)
        }
    }

    /// Replace this value with the value of `other`.
    ///
    /// Fails with `TypeMismatch` when the types differ. The cursor returns
    /// to the first component.
    pub fn assign(&self, other: &DynAny) -> DynAnyResult<()> {
        if self.ptr_eq(other) {
            let _guard = self.lock()?;
            return Ok(());
        }
        let any = other.snapshot()?;
        let mut node = self.lock()?;
        if *node.type_desc != **any.type_desc() {
            return Err(DynAnyError::mismatch(format!(
                "cannot assign {} to {}",
                type_name(any.type_desc()),
                node.name()
            )));
        }
        node.set_from_any(&any, false)
    }

    /// Replace this value with the contents of `any`.
    pub fn from_any(&self, any: &Any) -> DynAnyResult<()> {
        let mut node = self.lock()?;
        if *node.type_desc != **any.type_desc() {
            return Err(DynAnyError::mismatch(format!(
                "cannot assign {} to {}",
                type_name(any.type_desc()),
                node.name()
            )));
        }
        if !any.has_value() {
            return Err(DynAnyError::invalid("any carries no value"));
        }
        node.set_from_any(any, true)
    }

    /// Encode this value.
    ///
    /// A value typed by a back reference to an enclosing type that was never
    /// materialized beyond its type yields an `Any` without a value.
    pub fn to_any(&self) -> DynAnyResult<Any> {
        self.lock()?.to_any()
    }

    /// Encoding of this value, materializing components when needed.
    pub(crate) fn snapshot(&self) -> DynAnyResult<Any> {
        self.lock()?.snapshot()
    }

    /// Fully decoded value.
    pub fn to_value(&self) -> DynAnyResult<Value> {
        self.value_at(0)
    }

    pub(crate) fn value_at(&self, depth: usize) -> DynAnyResult<Value> {
        self.lock()?.to_value(depth)
    }

    /// Structural equality. Neither value's cursor moves.
    pub fn equal(&self, other: &DynAny) -> DynAnyResult<bool> {
        if self.ptr_eq(other) {
            let _guard = self.lock()?;
            return Ok(true);
        }
        let mine = self.comparison_view()?;
        let theirs = other.comparison_view()?;
        if *mine.type_desc != *theirs.type_desc || mine.null != theirs.null {
            return Ok(false);
        }
        match (mine.leaf, theirs.leaf) {
            (Some(a), Some(b)) => return Ok(a == b),
            (None, None) => {}
            _ => return Ok(false),
        }
        if mine.children.len() != theirs.children.len() {
            return Ok(false);
        }
        for (a, b) in mine.children.iter().zip(&theirs.children) {
            if !a.equal(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn comparison_view(&self) -> DynAnyResult<ComparisonView> {
        let mut node = self.lock()?;
        let type_desc = Arc::clone(&node.type_desc);
        let leaf = match &node.body {
            Body::Basic(v) => Some(v.clone()),
            Body::Enum(o) => Some(Value::Enum(*o)),
            _ => None,
        };
        let null = node.is_null_value();
        let children = if leaf.is_none() {
            node.sync_union()?;
            node.ensure_components()?;
            node.components().to_vec()
        } else {
            Vec::new()
        };
        Ok(ComparisonView {
            type_desc,
            leaf,
            null,
            children,
        })
    }

    /// The component under the cursor, or None when the cursor is unset.
    ///
    /// Fails with `TypeMismatch` on values that never have components.
    pub fn current_component(&self) -> DynAnyResult<Option<DynAny>> {
        let mut node = self.lock()?;
        if !node.is_constructed() {
            return Err(DynAnyError::mismatch(format!(
                "{} has no components",
                node.name()
            )));
        }
        node.sync_union()?;
        if node.ensure_components().is_err() {
            return Ok(None);
        }
        Ok(node.cursor_component())
    }

    /// Number of components, 0 when they cannot be produced.
    pub fn component_count(&self) -> DynAnyResult<usize> {
        let mut node = self.lock()?;
        if !node.is_constructed() {
            return Ok(0);
        }
        node.sync_union()?;
        if node.ensure_components().is_err() {
            return Ok(0);
        }
        Ok(node.components().len())
    }

    /// Advance the cursor. Past the last component the cursor becomes
    /// unset and this returns false until the next `rewind` or `seek`.
    pub fn next(&self) -> DynAnyResult<bool> {
        let mut node = self.lock()?;
        if !node.is_constructed() {
            return Ok(false);
        }
        node.sync_union()?;
        if node.ensure_components().is_err() {
            return Ok(false);
        }
        let len = node.components().len();
        let Some(base) = node.body.base_mut() else {
            return Ok(false);
        };
        match base.cursor {
            Some(i) if i + 1 < len => {
                base.cursor = Some(i + 1);
                Ok(true)
            }
            Some(_) => {
                base.cursor = None;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Move the cursor to `index`.
    ///
    /// A negative index unsets the cursor and returns false. An index past
    /// the end returns false and leaves the cursor where it was.
    pub fn seek(&self, index: i64) -> DynAnyResult<bool> {
        let mut node = self.lock()?;
        if !node.is_constructed() {
            return Ok(false);
        }
        if index < 0 {
            if let Some(base) = node.body.base_mut() {
                base.cursor = None;
            }
            return Ok(false);
        }
        node.sync_union()?;
        if node.ensure_components().is_err() {
            return Ok(false);
        }
        let len = node.components().len();
        let Ok(index) = usize::try_from(index) else {
            return Ok(false);
        };
        match node.body.base_mut() {
            Some(base) if index < len => {
                base.cursor = Some(index);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Move the cursor to the first component.
    pub fn rewind(&self) -> DynAnyResult<()> {
        self.seek(0).map(|_| ())
    }
}

struct ComparisonView {
    type_desc: Arc<TypeDescriptor>,
    leaf: Option<Value>,
    null: bool,
    children: Vec<DynAny>,
}

impl fmt::Debug for DynAny {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.try_lock() {
            Some(node) => f
                .debug_struct("DynAny")
                .field("type", &node.name())
                .field("status", &node.status)
                .finish(),
            None => f.write_str("DynAny(<locked>)"),
        }
    }
}
