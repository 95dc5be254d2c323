// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.

use thiserror::Error;

/// Errors raised by the CDR codec.
#[derive(Debug, Error)]
pub enum CdrError {
    #[error("Buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Errors raised by dynamic value operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynAnyError {
    /// The value was destroyed; every operation on it fails.
    #[error("object has been destroyed")]
    Destroyed,

    /// The operation does not apply to this kind of value, or a supplied
    /// value has the wrong type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The operation applies but the supplied value or current state is
    /// unacceptable.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A factory was asked to build a value from a type it cannot represent.
    #[error("inconsistent type code: {0}")]
    InconsistentTypeCode(String),
}

impl DynAnyError {
    pub(crate) fn mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }
}

impl From<CdrError> for DynAnyError {
    fn from(e: CdrError) -> Self {
        Self::InvalidValue(e.to_string())
    }
}

/// Result alias for dynamic value operations.
pub type DynAnyResult<T> = Result<T, DynAnyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdr_error_maps_to_invalid_value() {
        let err: DynAnyError = CdrError::BufferTooSmall { need: 4, have: 1 }.into();
        match err {
            DynAnyError::InvalidValue(msg) => assert!(msg.contains("need 4 bytes")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DynAnyError::Destroyed.to_string(),
            "object has been destroyed"
        );
        assert_eq!(
            DynAnyError::mismatch("not a union").to_string(),
            "type mismatch: not a union"
        );
    }
}
