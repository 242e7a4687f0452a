//! Client-side mirror of the remote world program's public state.
//!
//! Raw storage cells are read over an async boundary, resolved through a
//! validated schema, decoded into typed entity bundles, and reconciled with
//! bulk snapshot exports. The mirror is read-only with respect to the
//! network; the write path only consumes the argument lists built in
//! [`arguments`].

pub mod arguments;
pub mod context;
pub mod entity;
pub mod error;
pub mod paginate;
pub mod reader;
pub mod reconcile;
pub mod schema;
pub mod snapshot;
pub mod sync;

pub use context::{check_consistency, ConsistencyReport, MirrorConfig, MirrorContext};
pub use entity::{EntityBundle, EntityId, EntityKind};
pub use error::{DecodeError, SchemaError, SyncError};
pub use reader::{Address, BlockTag, CellReader, ReadError};
pub use reconcile::{
    PollOutcome, Reconciler, ReconcilerState, RepeatingTask, SnapshotPayload, SnapshotSource,
    SourceError, SyncSignature,
};
pub use schema::{MapSlotTemplate, SlotAssignment, StorageSchema, StorageSlot};
pub use snapshot::{Snapshot, SnapshotMeta, SNAPSHOT_FORMAT, SNAPSHOT_VERSION};
pub use sync::StateSync;
