// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dynany - dynamic values for IDL-described types
//!
//! Create, traverse, mutate and encode values whose type is only known at
//! runtime, in the manner of the CORBA `DynAny` interfaces.
//!
//! ## Quick Start
//!
//! ```rust
//! use dynany::{DynAnyFactory, PrimitiveKind, TypeDescriptorBuilder, Value};
//! use std::sync::Arc;
//!
//! let reading = Arc::new(TypeDescriptorBuilder::new("Reading")
//!     .field("sensor_id", PrimitiveKind::U32)
//!     .string_field("location")
//!     .build());
//!
//! let factory = DynAnyFactory::new();
//! let value = factory.create_from_type(&reading)?;
//! value.insert_u32(42)?;
//! value.next()?;
//! value.insert_string("Building A")?;
//!
//! let any = value.to_any()?;
//! assert_eq!(
//!     any.value()?,
//!     Value::Struct(vec![Value::U32(42), Value::String("Building A".into())])
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDescriptor`] | Immutable description of a type |
//! | [`Any`] | A type plus an encoded value |
//! | [`DynAnyFactory`] | Creates dynamic values from types or `Any`s |
//! | [`DynAny`] | Handle to a dynamic value |
//! | [`Value`] | A fully decoded value tree |
//!
//! ## Modules Overview
//!
//! - [`types`] - Type descriptors and builders
//! - [`dynany`] - Dynamic values
//! - [`cdr`] - Little-endian CDR codec
//! - [`config`] - Factory limits and defaults

pub mod any;
pub mod cdr;
pub mod config;
pub mod dynany;
pub mod error;
pub mod types;
pub mod value;

pub use any::Any;
pub use cdr::{CdrDecoder, CdrEncoder, DecodeLimits};
pub use config::{ConfigError, DynAnyConfig};
pub use dynany::{DynAny, DynAnyFactory, NameDynAnyPair, NameValuePair, Status};
pub use error::{CdrError, DynAnyError, DynAnyResult};
pub use types::{
    ArrayBuilder, EnumBuilder, FieldDescriptor, PrimitiveKind, SequenceBuilder, TcKind,
    TypeDescriptor, TypeDescriptorBuilder, TypeKind, UnionBuilder,
};
pub use value::Value;
