// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type descriptions.
//!
//! A [`TypeDescriptor`] is the "type code" every dynamic value carries.
//! Descriptors are immutable and shared through `Arc`.

mod builder;
mod type_descriptor;

pub use builder::{ArrayBuilder, EnumBuilder, SequenceBuilder, TypeDescriptorBuilder, UnionBuilder};
pub use type_descriptor::{
    ArrayDescriptor, EnumDescriptor, FieldDescriptor, PrimitiveKind, RecursiveRef,
    SequenceDescriptor, TcKind, TypeDescriptor, TypeKind, UnionCase, UnionDescriptor,
};

/// Size of an extended-precision float on the wire.
pub const LONG_DOUBLE_SIZE: usize = 16;

/// Alignment of an extended-precision float on the wire.
pub const LONG_DOUBLE_ALIGN: usize = 8;
