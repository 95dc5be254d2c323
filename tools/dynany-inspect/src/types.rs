// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON type definitions.
//!
//! ```json
//! { "types": [
//!   { "kind": "enum", "name": "Color", "members": ["Red", "Green"] },
//!   { "kind": "struct", "name": "Node", "fields": [
//!       { "name": "color", "type": "Color" },
//!       { "name": "children", "type": "sequence<Node>" } ] }
//! ] }
//! ```
//!
//! Type references are primitive names (`long`, `unsigned short`,
//! `string<16>`, ...), `sequence<T>` / `sequence<T, N>`, or names defined
//! earlier in the document. A definition that mentions its own name becomes
//! self-referential.

use anyhow::{anyhow, bail, Context, Result};
use dynany::types::{
    ArrayDescriptor, EnumDescriptor, FieldDescriptor, SequenceDescriptor, UnionCase,
    UnionDescriptor,
};
use dynany::{PrimitiveKind, TypeDescriptor, TypeKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TypeFile {
    pub types: Vec<TypeDef>,
}

#[derive(Debug, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct CaseDef {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<i64>,
    #[serde(rename = "type")]
    pub type_ref: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDef {
    Struct {
        name: String,
        fields: Vec<FieldDef>,
    },
    Exception {
        name: String,
        fields: Vec<FieldDef>,
    },
    Enum {
        name: String,
        members: Vec<String>,
    },
    Union {
        name: String,
        discriminator: String,
        cases: Vec<CaseDef>,
        #[serde(default)]
        default: Option<CaseDef>,
    },
    Sequence {
        name: String,
        element: String,
        #[serde(default)]
        bound: usize,
    },
    Array {
        name: String,
        element: String,
        length: usize,
    },
    Alias {
        name: String,
        target: String,
    },
    Value {
        name: String,
        fields: Vec<FieldDef>,
    },
    ValueBox {
        name: String,
        boxed: String,
    },
}

impl TypeDef {
    fn name(&self) -> &str {
        match self {
            Self::Struct { name, .. }
            | Self::Exception { name, .. }
            | Self::Enum { name, .. }
            | Self::Union { name, .. }
            | Self::Sequence { name, .. }
            | Self::Array { name, .. }
            | Self::Alias { name, .. }
            | Self::Value { name, .. }
            | Self::ValueBox { name, .. } => name,
        }
    }

    fn references(&self) -> Vec<&str> {
        match self {
            Self::Struct { fields, .. }
            | Self::Exception { fields, .. }
            | Self::Value { fields, .. } => fields.iter().map(|f| f.type_ref.as_str()).collect(),
            Self::Enum { .. } => Vec::new(),
            Self::Union {
                discriminator,
                cases,
                default,
                ..
            } => std::iter::once(discriminator.as_str())
                .chain(cases.iter().chain(default).map(|c| c.type_ref.as_str()))
                .collect(),
            Self::Sequence { element, .. } | Self::Array { element, .. } => vec![element.as_str()],
            Self::Alias { target, .. } => vec![target.as_str()],
            Self::ValueBox { boxed, .. } => vec![boxed.as_str()],
        }
    }

    fn refers_to_itself(&self) -> bool {
        let name = self.name();
        self.references().iter().any(|r| {
            r.split(|c: char| c == '<' || c == '>' || c == ',')
                .any(|token| token.trim() == name)
        })
    }
}

/// Named types defined so far.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading type definitions {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let file: TypeFile = serde_json::from_str(text).context("parsing type definitions")?;
        let mut registry = Self::default();
        for def in &file.types {
            let desc = registry
                .define(def)
                .with_context(|| format!("defining {}", def.name()))?;
            tracing::debug!("defined type {}", def.name());
            registry.types.insert(def.name().to_owned(), desc);
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no type named {name}"))
    }

    fn define(&self, def: &TypeDef) -> Result<Arc<TypeDescriptor>> {
        if !def.refers_to_itself() {
            return Ok(Arc::new(TypeDescriptor::new(def.name(), self.kind(def, None)?)));
        }
        if matches!(def, TypeDef::Alias { .. } | TypeDef::Enum { .. }) {
            bail!("{} cannot refer to itself", def.name());
        }
        let mut failure = None;
        let desc = TypeDescriptor::recursive(def.name(), |me| match self.kind(def, Some(&me)) {
            Ok(kind) => kind,
            Err(e) => {
                failure = Some(e);
                TypeKind::Struct(Vec::new())
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(desc),
        }
    }

    fn kind(&self, def: &TypeDef, me: Option<&Arc<TypeDescriptor>>) -> Result<TypeKind> {
        let fields = |fields: &[FieldDef]| -> Result<Vec<FieldDescriptor>> {
            fields
                .iter()
                .map(|f| Ok(FieldDescriptor::new(&f.name, self.resolve(&f.type_ref, me)?)))
                .collect()
        };
        let kind = match def {
            TypeDef::Struct { fields: f, .. } => TypeKind::Struct(fields(f)?),
            TypeDef::Exception { fields: f, .. } => TypeKind::Exception(fields(f)?),
            TypeDef::Value { fields: f, .. } => TypeKind::ValueType(fields(f)?),
            TypeDef::Enum { members, .. } => {
                if members.is_empty() {
                    bail!("enum without members");
                }
                TypeKind::Enum(EnumDescriptor::new(members.clone()))
            }
            TypeDef::Union {
                discriminator,
                cases,
                default,
                ..
            } => {
                let case = |c: &CaseDef| -> Result<UnionCase> {
                    Ok(UnionCase::new(
                        &c.name,
                        c.labels.clone(),
                        self.resolve(&c.type_ref, me)?,
                    ))
                };
                let mut union = UnionDescriptor::new(
                    self.resolve(discriminator, me)?,
                    cases.iter().map(case).collect::<Result<_>>()?,
                );
                if let Some(d) = default {
                    union = union.with_default(case(d)?);
                }
                TypeKind::Union(union)
            }
            TypeDef::Sequence { element, bound, .. } => {
                let element = self.resolve(element, me)?;
                TypeKind::Sequence(match bound {
                    0 => SequenceDescriptor::unbounded(element),
                    n => SequenceDescriptor::bounded(element, *n),
                })
            }
            TypeDef::Array {
                element, length, ..
            } => TypeKind::Array(ArrayDescriptor::new(self.resolve(element, me)?, *length)),
            TypeDef::Alias { target, .. } => TypeKind::Alias(self.resolve(target, me)?),
            TypeDef::ValueBox { boxed, .. } => TypeKind::ValueBox(self.resolve(boxed, me)?),
        };
        Ok(kind)
    }

    fn resolve(&self, text: &str, me: Option<&Arc<TypeDescriptor>>) -> Result<Arc<TypeDescriptor>> {
        let text = text.trim();
        if let Some(inner) = text
            .strip_prefix("sequence<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let (element, bound) = match inner.rsplit_once(',') {
                Some((element, bound)) if !bound.contains('>') => (
                    element,
                    bound
                        .trim()
                        .parse::<usize>()
                        .with_context(|| format!("bad sequence bound in {text}"))?,
                ),
                _ => (inner, 0),
            };
            let element = self.resolve(element, me)?;
            return Ok(Arc::new(TypeDescriptor::sequence(element, bound)));
        }
        if let Some(kind) = primitive(text)? {
            return Ok(Arc::new(TypeDescriptor::primitive("", kind)));
        }
        if let Some(me) = me.filter(|me| me.name == text) {
            return Ok(Arc::clone(me));
        }
        self.get(text)
    }
}

fn bounded(text: &str, prefix: &str) -> Result<Option<Option<usize>>> {
    if text == prefix {
        return Ok(Some(None));
    }
    match text
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(bound) => Ok(Some(Some(
            bound
                .trim()
                .parse()
                .with_context(|| format!("bad bound in {text}"))?,
        ))),
        None => Ok(None),
    }
}

fn primitive(text: &str) -> Result<Option<PrimitiveKind>> {
    let kind = match text {
        "boolean" => PrimitiveKind::Bool,
        "octet" => PrimitiveKind::U8,
        "int8" => PrimitiveKind::I8,
        "short" => PrimitiveKind::I16,
        "unsigned short" => PrimitiveKind::U16,
        "long" => PrimitiveKind::I32,
        "unsigned long" => PrimitiveKind::U32,
        "long long" => PrimitiveKind::I64,
        "unsigned long long" => PrimitiveKind::U64,
        "float" => PrimitiveKind::F32,
        "double" => PrimitiveKind::F64,
        "long double" => PrimitiveKind::LongDouble,
        "char" => PrimitiveKind::Char,
        "wchar" => PrimitiveKind::WChar,
        _ => {
            if let Some(max_length) = bounded(text, "wstring")? {
                return Ok(Some(PrimitiveKind::WString { max_length }));
            }
            if let Some(max_length) = bounded(text, "string")? {
                return Ok(Some(PrimitiveKind::String { max_length }));
            }
            return Ok(None);
        }
    };
    Ok(Some(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{ "types": [
        { "kind": "enum", "name": "Color", "members": ["Red", "Green", "Blue"] },
        { "kind": "struct", "name": "Point", "fields": [
            { "name": "x", "type": "long" },
            { "name": "label", "type": "string<8>" } ] },
        { "kind": "union", "name": "Shape", "discriminator": "long",
          "cases": [ { "name": "point", "labels": [1, 2], "type": "Point" } ],
          "default": { "name": "color", "type": "Color" } },
        { "kind": "struct", "name": "Tree", "fields": [
            { "name": "shape", "type": "Shape" },
            { "name": "children", "type": "sequence<Tree, 4>" } ] }
    ] }"#;

    #[test]
    fn test_loads_named_types() {
        let registry = TypeRegistry::from_json(SCENE).expect("load");
        let point = registry.get("Point").expect("point");
        assert_eq!(point.member_count(), 2);
        assert_eq!(
            point.member_type(1).expect("label").kind,
            TypeKind::Primitive(PrimitiveKind::String {
                max_length: Some(8)
            })
        );
        let shape = registry.get("Shape").expect("shape");
        assert_eq!(shape.default_index(), Some(1));
    }

    #[test]
    fn test_self_reference_becomes_recursive() {
        let registry = TypeRegistry::from_json(SCENE).expect("load");
        let tree = registry.get("Tree").expect("tree");
        assert!(!tree.is_recursive());
        let children = tree.member_type(1).expect("children");
        assert_eq!(children.bound(), 4);
        let element = children.content_type().expect("element");
        assert!(element.is_recursive());
        assert!(Arc::ptr_eq(&element.resolved().expect("resolves"), &tree));
    }

    #[test]
    fn test_unknown_reference_fails() {
        let err = TypeRegistry::from_json(
            r#"{ "types": [ { "kind": "alias", "name": "A", "target": "Missing" } ] }"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Missing"));
    }
}
