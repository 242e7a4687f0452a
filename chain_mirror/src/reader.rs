use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use field_core::FieldElement;

use crate::schema::StorageSlot;

/// Remote program address, carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Height selector for a storage read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Height(u64),
}

/// Individual read failure. `Transient` recovers by omission in batch
/// results; `Unreachable` means the endpoint itself is down and propagates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("transient read failure: {0}")]
    Transient(String),
    #[error("remote endpoint unreachable: {0}")]
    Unreachable(String),
}

/// Asynchronous raw storage access. Timeouts belong to the implementation
/// and surface as `ReadError::Transient`. The mirror never writes through
/// this boundary.
pub trait CellReader: Send + Sync + 'static {
    fn read_cell(
        &self,
        height: BlockTag,
        address: &Address,
        slot: &StorageSlot,
    ) -> impl Future<Output = Result<FieldElement, ReadError>> + Send;
}
