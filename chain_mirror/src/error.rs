use thiserror::Error;

use crate::reader::ReadError;

/// A named logical field is absent from (or mis-typed in) the schema
/// description. Fatal for the lookup; the caller may retry with a corrected
/// schema. Never silently defaulted, since slot 0 would corrupt every
/// downstream read.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("schema field not found: {0}")]
    FieldNotFound(String),
    #[error("schema field {name} is {actual}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("schema document rejected: {0}")]
    InvalidDocument(String),
}

/// Raw fields cannot be shaped into the requested entity kind. Well-formed
/// remote data never produces this; it indicates a logic bug or a schema
/// pointed at the wrong slots.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{kind} expects at most {expected} fields, got {actual}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{kind} field {position} does not fit its declared width")]
    ValueOutOfRange { kind: &'static str, position: usize },
}

/// Failure surface of the synchronizer.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Read(#[from] ReadError),
}
