// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, Weak};

/// Upper bound on alias/recursive indirections followed by [`TypeDescriptor::resolved`].
const MAX_INDIRECTIONS: usize = 32;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    LongDouble,
    Char,
    WChar,
    String { max_length: Option<usize> },
    WString { max_length: Option<usize> },
}

impl PrimitiveKind {
    /// Declared length bound for strings (0 = unbounded).
    pub fn bound(&self) -> usize {
        match self {
            Self::String { max_length } | Self::WString { max_length } => {
                max_length.unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// IDL spelling, used in diagnostics.
    pub fn idl_name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::U8 => "octet",
            Self::U16 => "unsigned short",
            Self::U32 => "unsigned long",
            Self::U64 => "unsigned long long",
            Self::I8 => "int8",
            Self::I16 => "short",
            Self::I32 => "long",
            Self::I64 => "long long",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::LongDouble => "long double",
            Self::Char => "char",
            Self::WChar => "wchar",
            Self::String { .. } => "string",
            Self::WString { .. } => "wstring",
        }
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// Struct with named fields.
    Struct(Vec<FieldDescriptor>),
    /// Exception: struct-shaped, distinct kind.
    Exception(Vec<FieldDescriptor>),
    /// Sequence (dynamic length).
    Sequence(SequenceDescriptor),
    /// Array (fixed length).
    Array(ArrayDescriptor),
    /// Enumeration.
    Enum(EnumDescriptor),
    /// Union with discriminator.
    Union(UnionDescriptor),
    /// Alias (typedef) of another type.
    Alias(Arc<TypeDescriptor>),
    /// Nullable aggregate (valuetype).
    ValueType(Vec<FieldDescriptor>),
    /// Nullable box around a single value.
    ValueBox(Arc<TypeDescriptor>),
    /// Back reference to an enclosing type (self-referential types).
    Recursive(RecursiveRef),
}

/// Kind tag of a type, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcKind {
    Primitive(PrimitiveKind),
    Struct,
    Exception,
    Sequence,
    Array,
    Enum,
    Union,
    Alias,
    ValueType,
    ValueBox,
}

impl fmt::Display for TcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.idl_name()),
            Self::Struct => f.write_str("struct"),
            Self::Exception => f.write_str("exception"),
            Self::Sequence => f.write_str("sequence"),
            Self::Array => f.write_str("array"),
            Self::Enum => f.write_str("enum"),
            Self::Union => f.write_str("union"),
            Self::Alias => f.write_str("alias"),
            Self::ValueType => f.write_str("valuetype"),
            Self::ValueBox => f.write_str("valuebox"),
        }
    }
}

/// Non-owning handle to an enclosing type.
///
/// Built by [`TypeDescriptor::recursive`]; the handle points back into the
/// `Arc` allocation of the type being defined, so no reference cycle is
/// created. Two references compare equal when they name the same type.
#[derive(Clone)]
pub struct RecursiveRef {
    name: String,
    target: Weak<TypeDescriptor>,
}

impl RecursiveRef {
    /// Name of the referenced type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the reference (None once the enclosing type is dropped).
    pub fn resolve(&self) -> Option<Arc<TypeDescriptor>> {
        self.target.upgrade()
    }
}

impl PartialEq for RecursiveRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for RecursiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecursiveRef({})", self.name)
    }
}

/// A complete type descriptor.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (&self.kind, &other.kind) {
            // Repository-id rule: a back reference equals any type of that name.
            (TypeKind::Recursive(_), _) | (_, TypeKind::Recursive(_)) => self.name == other.name,
            // Anonymous kinds compare by shape only.
            (TypeKind::Primitive(a), TypeKind::Primitive(b)) => a == b,
            (TypeKind::Sequence(a), TypeKind::Sequence(b)) => a == b,
            (TypeKind::Array(a), TypeKind::Array(b)) => a == b,
            (a, b) => self.name == other.name && a == b,
        }
    }
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    /// Create a struct type descriptor.
    pub fn struct_type(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Struct(fields))
    }

    /// Create an exception type descriptor.
    pub fn exception(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Exception(fields))
    }

    /// Create an anonymous sequence type (`bound` 0 = unbounded).
    pub fn sequence(element_type: Arc<TypeDescriptor>, bound: usize) -> Self {
        let desc = if bound == 0 {
            SequenceDescriptor::unbounded(element_type)
        } else {
            SequenceDescriptor::bounded(element_type, bound)
        };
        Self::new("", TypeKind::Sequence(desc))
    }

    /// Create an anonymous array type.
    pub fn array(element_type: Arc<TypeDescriptor>, length: usize) -> Self {
        Self::new("", TypeKind::Array(ArrayDescriptor::new(element_type, length)))
    }

    /// Create an alias (typedef).
    pub fn alias(name: impl Into<String>, target: Arc<TypeDescriptor>) -> Self {
        Self::new(name, TypeKind::Alias(target))
    }

    /// Create a value box.
    pub fn value_box(name: impl Into<String>, boxed: Arc<TypeDescriptor>) -> Self {
        Self::new(name, TypeKind::ValueBox(boxed))
    }

    /// Define a self-referential type.
    ///
    /// `build` receives a descriptor standing in for the type being defined
    /// and returns its kind. The stand-in resolves to the finished type.
    ///
    /// ```rust
    /// use dynany::types::{TypeDescriptor, TypeKind, FieldDescriptor, PrimitiveKind};
    /// use std::sync::Arc;
    ///
    /// let node = TypeDescriptor::recursive("Node", |node_ref| {
    ///     TypeKind::Struct(vec![
    ///         FieldDescriptor::new("value", Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32))),
    ///         FieldDescriptor::new("children", Arc::new(TypeDescriptor::sequence(node_ref, 0))),
    ///     ])
    /// });
    /// assert_eq!(node.member_count(), 2);
    /// ```
    pub fn recursive<F>(name: impl Into<String>, build: F) -> Arc<Self>
    where
        F: FnOnce(Arc<TypeDescriptor>) -> TypeKind,
    {
        let name = name.into();
        Arc::new_cyclic(|weak| {
            let self_ref = Arc::new(TypeDescriptor::new(
                name.clone(),
                TypeKind::Recursive(RecursiveRef {
                    name: name.clone(),
                    target: weak.clone(),
                }),
            ));
            TypeDescriptor::new(name, build(self_ref))
        })
    }

    /// Follow aliases and back references to the real type.
    ///
    /// Returns None for an unresolved back reference.
    pub fn resolved(self: &Arc<Self>) -> Option<Arc<TypeDescriptor>> {
        let mut current = Arc::clone(self);
        for _ in 0..MAX_INDIRECTIONS {
            let next = match &current.kind {
                TypeKind::Alias(target) => Arc::clone(target),
                TypeKind::Recursive(r) => r.resolve()?,
                _ => return Some(current),
            };
            current = next;
        }
        None
    }

    /// Kind tag. Back references report the kind of the referenced type.
    pub fn tc_kind(&self) -> TcKind {
        match &self.kind {
            TypeKind::Primitive(p) => TcKind::Primitive(*p),
            TypeKind::Struct(_) => TcKind::Struct,
            TypeKind::Exception(_) => TcKind::Exception,
            TypeKind::Sequence(_) => TcKind::Sequence,
            TypeKind::Array(_) => TcKind::Array,
            TypeKind::Enum(_) => TcKind::Enum,
            TypeKind::Union(_) => TcKind::Union,
            TypeKind::Alias(_) => TcKind::Alias,
            TypeKind::ValueType(_) => TcKind::ValueType,
            TypeKind::ValueBox(_) => TcKind::ValueBox,
            TypeKind::Recursive(r) => r
                .resolve()
                .map(|t| t.tc_kind())
                .unwrap_or(TcKind::Struct),
        }
    }

    /// Check if this descriptor is a back reference to an enclosing type.
    pub fn is_recursive(&self) -> bool {
        matches!(self.kind, TypeKind::Recursive(_))
    }

    /// Get fields if this is a struct, exception or value type.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            TypeKind::Struct(fields) | TypeKind::Exception(fields) | TypeKind::ValueType(fields) => {
                Some(fields)
            }
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Number of members (fields, union cases or enumerators).
    pub fn member_count(&self) -> usize {
        match &self.kind {
            TypeKind::Struct(f) | TypeKind::Exception(f) | TypeKind::ValueType(f) => f.len(),
            TypeKind::Union(u) => u.cases.len(),
            TypeKind::Enum(e) => e.members.len(),
            _ => 0,
        }
    }

    /// Name of member `index`.
    pub fn member_name(&self, index: usize) -> Option<&str> {
        match &self.kind {
            TypeKind::Struct(f) | TypeKind::Exception(f) | TypeKind::ValueType(f) => {
                f.get(index).map(|f| f.name.as_str())
            }
            TypeKind::Union(u) => u.cases.get(index).map(|c| c.name.as_str()),
            TypeKind::Enum(e) => e.members.get(index).map(String::as_str),
            _ => None,
        }
    }

    /// Type of member `index`.
    pub fn member_type(&self, index: usize) -> Option<&Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Struct(f) | TypeKind::Exception(f) | TypeKind::ValueType(f) => {
                f.get(index).map(|f| &f.type_desc)
            }
            TypeKind::Union(u) => u.cases.get(index).map(|c| &c.type_desc),
            _ => None,
        }
    }

    /// Case labels of union member `index`.
    pub fn member_labels(&self, index: usize) -> Option<&[i64]> {
        match &self.kind {
            TypeKind::Union(u) => u.cases.get(index).map(|c| c.labels.as_slice()),
            _ => None,
        }
    }

    /// Element type (sequence, array), aliased type or boxed type.
    pub fn content_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Sequence(s) => Some(&s.element_type),
            TypeKind::Array(a) => Some(&a.element_type),
            TypeKind::Alias(t) | TypeKind::ValueBox(t) => Some(t),
            _ => None,
        }
    }

    /// Union discriminator type.
    pub fn discriminator_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Union(u) => Some(&u.discriminator),
            _ => None,
        }
    }

    /// Union default case index.
    pub fn default_index(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Union(u) => u.default_index,
            _ => None,
        }
    }

    /// Array length, sequence/string bound (0 = unbounded).
    pub fn bound(&self) -> usize {
        match &self.kind {
            TypeKind::Array(a) => a.length,
            TypeKind::Sequence(s) => s.max_length.unwrap_or(0),
            TypeKind::Primitive(p) => p.bound(),
            _ => 0,
        }
    }

    /// Range of label values a union discriminator of this type can take.
    ///
    /// None when the type cannot discriminate a union.
    pub fn label_range(&self) -> Option<RangeInclusive<i64>> {
        match &self.kind {
            TypeKind::Primitive(p) => match p {
                PrimitiveKind::Bool => Some(0..=1),
                PrimitiveKind::U8 | PrimitiveKind::Char => Some(0..=i64::from(u8::MAX)),
                PrimitiveKind::I8 => Some(i64::from(i8::MIN)..=i64::from(i8::MAX)),
                PrimitiveKind::U16 | PrimitiveKind::WChar => Some(0..=i64::from(u16::MAX)),
                PrimitiveKind::I16 => Some(i64::from(i16::MIN)..=i64::from(i16::MAX)),
                PrimitiveKind::U32 => Some(0..=i64::from(u32::MAX)),
                PrimitiveKind::I32 => Some(i64::from(i32::MIN)..=i64::from(i32::MAX)),
                // u64 labels above i64::MAX are not representable.
                PrimitiveKind::U64 => Some(0..=i64::MAX),
                PrimitiveKind::I64 => Some(i64::MIN..=i64::MAX),
                _ => None,
            },
            TypeKind::Enum(e) if !e.members.is_empty() => {
                Some(0..=i64::try_from(e.members.len() - 1).ok()?)
            }
            TypeKind::Alias(t) => t.label_range(),
            TypeKind::Recursive(r) => r.resolve()?.label_range(),
            _ => None,
        }
    }

}

/// Field descriptor for struct, exception and value type members.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type.
    pub type_desc: Arc<TypeDescriptor>,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
        }
    }
}

/// Sequence type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDescriptor {
    /// Element type.
    pub element_type: Arc<TypeDescriptor>,
    /// Maximum length (None = unbounded).
    pub max_length: Option<usize>,
}

impl SequenceDescriptor {
    /// Create unbounded sequence.
    pub fn unbounded(element_type: Arc<TypeDescriptor>) -> Self {
        Self {
            element_type,
            max_length: None,
        }
    }

    /// Create bounded sequence.
    pub fn bounded(element_type: Arc<TypeDescriptor>, max_length: usize) -> Self {
        Self {
            element_type,
            max_length: Some(max_length),
        }
    }

    /// Check a prospective length against the bound.
    pub fn admits(&self, length: usize) -> bool {
        match self.max_length {
            Some(max) if max > 0 => length <= max,
            _ => true,
        }
    }
}

/// Array type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    /// Element type.
    pub element_type: Arc<TypeDescriptor>,
    /// Fixed length.
    pub length: usize,
}

impl ArrayDescriptor {
    /// Create array descriptor.
    pub fn new(element_type: Arc<TypeDescriptor>, length: usize) -> Self {
        Self {
            element_type,
            length,
        }
    }
}

/// Enumeration type descriptor. Ordinals are member positions.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    /// Enumerator names in declaration order.
    pub members: Vec<String>,
}

impl EnumDescriptor {
    /// Create enum descriptor.
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    /// Ordinal of an enumerator (case-sensitive).
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.members
            .iter()
            .position(|m| m == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Enumerator name for an ordinal.
    pub fn name_of(&self, ordinal: u32) -> Option<&str> {
        self.members.get(ordinal as usize).map(String::as_str)
    }
}

/// Union type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    /// Discriminator type.
    pub discriminator: Arc<TypeDescriptor>,
    /// Union cases (the default case, if any, has no labels).
    pub cases: Vec<UnionCase>,
    /// Index of the default case in `cases`.
    pub default_index: Option<usize>,
}

impl UnionDescriptor {
    /// Create union descriptor.
    pub fn new(discriminator: Arc<TypeDescriptor>, cases: Vec<UnionCase>) -> Self {
        Self {
            discriminator,
            cases,
            default_index: None,
        }
    }

    /// Append the default case.
    pub fn with_default(mut self, case: UnionCase) -> Self {
        self.default_index = Some(self.cases.len());
        self.cases.push(case);
        self
    }

    /// Case index selected by a discriminator label: exact label first,
    /// then the default case.
    pub fn case_index_for(&self, label: i64) -> Option<usize> {
        self.cases
            .iter()
            .position(|c| c.labels.contains(&label))
            .or(self.default_index)
    }

    /// Get case by discriminator value.
    pub fn case_by_discriminator(&self, label: i64) -> Option<&UnionCase> {
        self.case_index_for(label).and_then(|i| self.cases.get(i))
    }

    /// Whether any explicit case uses `label`.
    pub fn is_label_used(&self, label: i64) -> bool {
        self.cases.iter().any(|c| c.labels.contains(&label))
    }

    /// Total number of explicit labels.
    pub fn label_count(&self) -> usize {
        self.cases.iter().map(|c| c.labels.len()).sum()
    }

    /// A discriminator value no explicit case uses.
    ///
    /// Candidates are tried from 0 upwards, then downwards from -1. With `n`
    /// labels in use, one of the first `n + 1` candidates in range is free
    /// unless the discriminator domain itself is exhausted.
    pub fn unused_label(&self) -> Option<i64> {
        let range = self.discriminator.label_range()?;
        let limit = i64::try_from(self.label_count()).ok()?;
        let upward = (0..=limit).filter(|l| range.contains(l));
        let downward = (1..=limit).map(|l| -l).filter(|l| range.contains(l));
        upward.chain(downward).find(|l| !self.is_label_used(*l))
    }
}

/// Union case.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    /// Case name.
    pub name: String,
    /// Discriminator labels for this case.
    pub labels: Vec<i64>,
    /// Case type.
    pub type_desc: Arc<TypeDescriptor>,
}

impl UnionCase {
    /// Create union case.
    pub fn new(name: impl Into<String>, labels: Vec<i64>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            labels,
            type_desc,
        }
    }

    /// Create single-label case.
    pub fn single(name: impl Into<String>, label: i64, type_desc: Arc<TypeDescriptor>) -> Self {
        Self::new(name, vec![label], type_desc)
    }
}
