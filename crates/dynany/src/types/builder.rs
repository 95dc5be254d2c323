// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use crate::types::{
    ArrayDescriptor, EnumDescriptor, FieldDescriptor, PrimitiveKind, SequenceDescriptor,
    TypeDescriptor, TypeKind, UnionCase, UnionDescriptor,
};
use std::sync::Arc;

/// Shape of the aggregate produced by [`TypeDescriptorBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Struct,
    Exception,
    ValueType,
}

/// Builder for struct, exception and value types.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    shape: Aggregate,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    /// Create a new builder for a struct type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: Aggregate::Struct,
            fields: Vec::new(),
        }
    }

    /// Create a builder for an exception type.
    pub fn exception(name: impl Into<String>) -> Self {
        Self {
            shape: Aggregate::Exception,
            ..Self::new(name)
        }
    }

    /// Create a builder for a value type.
    pub fn value_type(name: impl Into<String>) -> Self {
        Self {
            shape: Aggregate::ValueType,
            ..Self::new(name)
        }
    }

    /// Add a primitive field.
    pub fn field(mut self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        let type_desc = Arc::new(TypeDescriptor::primitive("", kind));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a field with a type descriptor.
    pub fn field_with_type(
        mut self,
        name: impl Into<String>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::String { max_length: None })
    }

    pub fn bounded_string_field(self, name: impl Into<String>, max_length: usize) -> Self {
        self.field(
            name,
            PrimitiveKind::String {
                max_length: Some(max_length),
            },
        )
    }

    /// Add a sequence field.
    pub fn sequence_field(mut self, name: impl Into<String>, element_kind: PrimitiveKind) -> Self {
        let element_type = Arc::new(TypeDescriptor::primitive("", element_kind));
        let seq_desc = SequenceDescriptor::unbounded(element_type);
        let type_desc = Arc::new(TypeDescriptor::new("", TypeKind::Sequence(seq_desc)));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Add an array field.
    pub fn array_field(
        mut self,
        name: impl Into<String>,
        element_kind: PrimitiveKind,
        length: usize,
    ) -> Self {
        let element_type = Arc::new(TypeDescriptor::primitive("", element_kind));
        let arr_desc = ArrayDescriptor::new(element_type, length);
        let type_desc = Arc::new(TypeDescriptor::new("", TypeKind::Array(arr_desc)));
        self.fields.push(FieldDescriptor::new(name, type_desc));
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        match self.shape {
            Aggregate::Struct => TypeDescriptor::struct_type(self.name, self.fields),
            Aggregate::Exception => TypeDescriptor::exception(self.name, self.fields),
            Aggregate::ValueType => TypeDescriptor::new(self.name, TypeKind::ValueType(self.fields)),
        }
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    members: Vec<String>,
}

impl EnumBuilder {
    /// Create a new enum builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add an enumerator; its ordinal is its position.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.members.push(name.into());
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, TypeKind::Enum(EnumDescriptor::new(self.members)))
    }
}

/// Builder for union types.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    discriminator: Arc<TypeDescriptor>,
    cases: Vec<UnionCase>,
    default_case: Option<UnionCase>,
}

impl UnionBuilder {
    /// Create a new union builder with discriminator type.
    pub fn new(name: impl Into<String>, discriminator: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            discriminator,
            cases: Vec::new(),
            default_case: None,
        }
    }

    /// Create with i32 discriminator.
    pub fn with_i32_discriminator(name: impl Into<String>) -> Self {
        let disc = Arc::new(TypeDescriptor::primitive("", PrimitiveKind::I32));
        Self::new(name, disc)
    }

    /// Add a case with single label.
    pub fn case(
        mut self,
        name: impl Into<String>,
        label: i64,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::single(name, label, type_desc));
        self
    }

    /// Add a case with multiple labels.
    pub fn case_labels(
        mut self,
        name: impl Into<String>,
        labels: Vec<i64>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::new(name, labels, type_desc));
        self
    }

    /// Add a primitive case.
    pub fn primitive_case(self, name: impl Into<String>, label: i64, kind: PrimitiveKind) -> Self {
        let type_desc = Arc::new(TypeDescriptor::primitive("", kind));
        self.case(name, label, type_desc)
    }

    /// Set default case.
    pub fn default_case(mut self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        self.default_case = Some(UnionCase::new(name, vec![], type_desc));
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        let mut union_desc = UnionDescriptor::new(self.discriminator, self.cases);
        if let Some(default) = self.default_case {
            union_desc = union_desc.with_default(default);
        }
        TypeDescriptor::new(self.name, TypeKind::Union(union_desc))
    }
}

/// Builder for sequence types.
pub struct SequenceBuilder {
    name: String,
    element_type: Arc<TypeDescriptor>,
    max_length: Option<usize>,
}

impl SequenceBuilder {
    /// Create unbounded sequence of primitives.
    pub fn of_primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            element_type: Arc::new(TypeDescriptor::primitive("", kind)),
            max_length: None,
        }
    }

    /// Create sequence of custom type.
    pub fn of_type(name: impl Into<String>, element_type: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            element_type,
            max_length: None,
        }
    }

    /// Set maximum length.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        let seq_desc = match self.max_length {
            Some(max) => SequenceDescriptor::bounded(self.element_type, max),
            None => SequenceDescriptor::unbounded(self.element_type),
        };
        TypeDescriptor::new(self.name, TypeKind::Sequence(seq_desc))
    }
}

/// Builder for array types.
pub struct ArrayBuilder {
    name: String,
    element_type: Arc<TypeDescriptor>,
    length: usize,
}

impl ArrayBuilder {
    /// Create array of primitives.
    pub fn of_primitive(name: impl Into<String>, kind: PrimitiveKind, length: usize) -> Self {
        Self {
            name: name.into(),
            element_type: Arc::new(TypeDescriptor::primitive("", kind)),
            length,
        }
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        let arr_desc = ArrayDescriptor::new(self.element_type, self.length);
        TypeDescriptor::new(self.name, TypeKind::Array(arr_desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TcKind;

    #[test]
    fn test_struct_builder() {
        let desc = TypeDescriptorBuilder::new("Point3D")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .field("z", PrimitiveKind::F64)
            .build();

        assert_eq!(desc.name, "Point3D");
        assert_eq!(desc.tc_kind(), TcKind::Struct);
        assert_eq!(desc.fields().map(|f| f.len()), Some(3));
    }

    #[test]
    fn test_struct_with_sequences() {
        let desc = TypeDescriptorBuilder::new("DataPacket")
            .field("id", PrimitiveKind::U32)
            .sequence_field("data", PrimitiveKind::U8)
            .string_field("label")
            .build();

        assert_eq!(desc.fields().map(|f| f.len()), Some(3));
    }

    #[test]
    fn test_struct_with_arrays() {
        let desc = TypeDescriptorBuilder::new("Matrix3x3")
            .array_field("values", PrimitiveKind::F64, 9)
            .build();

        let field = desc.field("values").expect("field");
        match &field.type_desc.kind {
            TypeKind::Array(arr) => assert_eq!(arr.length, 9),
            _ => panic!("Expected array"),
        }
    }

    #[test]
    fn test_exception_and_value_type_shapes() {
        let exc = TypeDescriptorBuilder::exception("NotFound")
            .string_field("reason")
            .build();
        assert_eq!(exc.tc_kind(), TcKind::Exception);

        let vt = TypeDescriptorBuilder::value_type("Account")
            .field("balance", PrimitiveKind::F64)
            .build();
        assert_eq!(vt.tc_kind(), TcKind::ValueType);
        assert_eq!(vt.member_count(), 1);
    }

    #[test]
    fn test_enum_builder() {
        let desc = EnumBuilder::new("Color")
            .variant("RED")
            .variant("GREEN")
            .variant("BLUE")
            .build();

        match &desc.kind {
            TypeKind::Enum(e) => {
                assert_eq!(e.members.len(), 3);
                assert_eq!(e.ordinal_of("GREEN"), Some(1));
            }
            _ => panic!("Expected enum"),
        }
    }

    #[test]
    fn test_union_builder() {
        let desc = UnionBuilder::with_i32_discriminator("Shape")
            .primitive_case("radius", 1, PrimitiveKind::F64)
            .case_labels(
                "side",
                vec![2, 3],
                Arc::new(TypeDescriptor::primitive("", PrimitiveKind::F32)),
            )
            .default_case(
                "raw",
                Arc::new(TypeDescriptor::primitive("", PrimitiveKind::U8)),
            )
            .build();

        assert_eq!(desc.member_count(), 3);
        assert_eq!(desc.default_index(), Some(2));
        assert_eq!(desc.member_labels(1), Some(&[2i64, 3][..]));

        let discriminator = desc.discriminator_type().expect("discriminator");
        assert_eq!(discriminator.tc_kind(), TcKind::Primitive(PrimitiveKind::I32));
        assert!(TypeDescriptorBuilder::new("Plain")
            .build()
            .discriminator_type()
            .is_none());
    }

    #[test]
    fn test_sequence_builder() {
        let desc = SequenceBuilder::of_primitive("Bytes", PrimitiveKind::U8)
            .max_length(16)
            .build();
        assert_eq!(desc.bound(), 16);
    }

    #[test]
    fn test_array_builder() {
        let desc = ArrayBuilder::of_primitive("Vec3", PrimitiveKind::F32, 3).build();
        assert_eq!(desc.bound(), 3);
        assert_eq!(desc.tc_kind(), TcKind::Array);
    }
}
