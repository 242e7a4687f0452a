//! Bulk snapshot documents and their validation.
//!
//! A snapshot is an HTTP-fetchable JSON body: a metadata header plus per-kind
//! record arrays, every numeric transported as a decimal string. A payload is
//! accepted only when the header matches the caller's expected format,
//! version, and program address; a mismatched source is an expected
//! operational condition and yields `None`, never a panic or error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use field_core::FieldElement;

use crate::entity::{EntityBundle, EntityId, EntityKind};
use crate::reader::Address;

/// Format tag this mirror understands.
pub const SNAPSHOT_FORMAT: &str = "world-mirror";
/// Snapshot layout version this mirror understands.
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMeta {
    pub format: String,
    pub snapshot_version: u32,
    pub contract_address: String,
    pub block_number: u64,
    pub created_at: u64,
}

/// One exported entity: its map key plus the raw slot tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: EntityId,
    pub fields: Vec<FieldElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub meta: SnapshotMeta,
    #[serde(default)]
    pub players: Vec<SnapshotRecord>,
    #[serde(default)]
    pub planets: Vec<SnapshotRecord>,
    #[serde(default)]
    pub arrivals: Vec<SnapshotRecord>,
    #[serde(default)]
    pub artifacts: Vec<SnapshotRecord>,
}

/// A validated, decoded snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    tables: HashMap<EntityKind, HashMap<EntityId, EntityBundle>>,
}

impl Snapshot {
    /// Parse and validate a snapshot body against expectations. Parse
    /// failures and header mismatches both log and yield `None`; callers
    /// fall back to live reads.
    pub fn load(body: &str, expected_address: &Address) -> Option<Snapshot> {
        let document: SnapshotDocument = match serde_json::from_str(body) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(
                    target: "mirror::snapshot",
                    error = %err,
                    "snapshot body did not parse; ignoring source"
                );
                return None;
            }
        };
        let meta = &document.meta;
        if meta.format != SNAPSHOT_FORMAT
            || meta.snapshot_version != SNAPSHOT_VERSION
            || meta.contract_address != expected_address.as_str()
        {
            tracing::warn!(
                target: "mirror::snapshot",
                format = %meta.format,
                version = meta.snapshot_version,
                address = %meta.contract_address,
                expected = %expected_address,
                "snapshot header mismatch; ignoring source"
            );
            return None;
        }

        let mut tables = HashMap::new();
        for (kind, records) in [
            (EntityKind::Player, &document.players),
            (EntityKind::Planet, &document.planets),
            (EntityKind::Arrival, &document.arrivals),
            (EntityKind::Artifact, &document.artifacts),
        ] {
            let mut table = HashMap::with_capacity(records.len());
            for record in records {
                match EntityBundle::decode(kind, &record.fields) {
                    Ok(bundle) => {
                        table.insert(record.id.clone(), bundle);
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "mirror::snapshot",
                            entity = %record.id,
                            error = %err,
                            "snapshot record failed to decode; dropping it"
                        );
                    }
                }
            }
            tables.insert(kind, table);
        }

        Some(Snapshot {
            meta: document.meta,
            tables,
        })
    }

    pub fn table(&self, kind: EntityKind) -> Option<&HashMap<EntityId, EntityBundle>> {
        self.tables.get(&kind)
    }

    /// Merge snapshot entries into a live map. Live reads win: only ids the
    /// map does not already hold are filled from the snapshot.
    pub fn merge_into(&self, kind: EntityKind, out: &mut HashMap<EntityId, EntityBundle>) {
        if let Some(table) = self.tables.get(&kind) {
            for (id, bundle) in table {
                out.entry(id.clone()).or_insert_with(|| bundle.clone());
            }
        }
    }
}
