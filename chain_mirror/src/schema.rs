//! Storage schema: named logical fields resolved to raw slot indices.
//!
//! The schema document is produced by the remote build pipeline; it is
//! validated once at load time into a strict typed form, and downstream code
//! only ever sees the validated [`StorageSchema`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use field_core::{compress, FieldElement};

use crate::error::SchemaError;

/// Address of a single persisted cell in the remote flat storage space.
/// Field-element sized, since map-derived slots are hash outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageSlot(FieldElement);

impl StorageSlot {
    pub fn element(&self) -> &FieldElement {
        &self.0
    }

    /// Slot `n` cells past this one; entity spans occupy consecutive slots.
    pub fn offset(&self, n: u64) -> StorageSlot {
        StorageSlot(self.0.add(&FieldElement::from(n)))
    }
}

impl From<u64> for StorageSlot {
    fn from(index: u64) -> Self {
        StorageSlot(FieldElement::from(index))
    }
}

impl fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A map-typed field: per-entry slots are derived from a base slot and a key
/// through the remote network's addressing hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSlotTemplate {
    base: StorageSlot,
}

impl MapSlotTemplate {
    pub fn base(&self) -> &StorageSlot {
        &self.base
    }

    /// Concrete slot for one map entry: compress(key, base, 0).
    pub fn derive(&self, key: &FieldElement) -> StorageSlot {
        StorageSlot(compress(key, self.base.element(), &FieldElement::zero()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAssignment {
    Plain(StorageSlot),
    Map(MapSlotTemplate),
}

impl SlotAssignment {
    fn kind_name(&self) -> &'static str {
        match self {
            SlotAssignment::Plain(_) => "plain",
            SlotAssignment::Map(_) => "map",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Deserialize)]
struct FieldSpec {
    slot: u64,
    kind: FieldKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FieldKind {
    Plain,
    Map,
}

/// Validated schema; lookups after this point only fail on unknown names.
#[derive(Debug, Clone)]
pub struct StorageSchema {
    fields: BTreeMap<String, SlotAssignment>,
}

impl StorageSchema {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_json::from_str(text)
            .map_err(|err| SchemaError::InvalidDocument(err.to_string()))?;
        let fields = document
            .fields
            .into_iter()
            .map(|(name, spec)| {
                let assignment = match spec.kind {
                    FieldKind::Plain => SlotAssignment::Plain(StorageSlot::from(spec.slot)),
                    FieldKind::Map => SlotAssignment::Map(MapSlotTemplate {
                        base: StorageSlot::from(spec.slot),
                    }),
                };
                (name, assignment)
            })
            .collect();
        Ok(Self { fields })
    }

    pub fn resolve(&self, name: &str) -> Result<&SlotAssignment, SchemaError> {
        self.fields
            .get(name)
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }

    pub fn resolve_plain(&self, name: &str) -> Result<&StorageSlot, SchemaError> {
        match self.resolve(name)? {
            SlotAssignment::Plain(slot) => Ok(slot),
            other => Err(SchemaError::WrongKind {
                name: name.to_string(),
                expected: "plain",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn resolve_map(&self, name: &str) -> Result<&MapSlotTemplate, SchemaError> {
        match self.resolve(name)? {
            SlotAssignment::Map(template) => Ok(template),
            other => Err(SchemaError::WrongKind {
                name: name.to_string(),
                expected: "map",
                actual: other.kind_name(),
            }),
        }
    }
}
