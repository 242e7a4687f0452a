//! Bounded-concurrency entity synchronization.
//!
//! All remote reads flow through here. `fetch_batch` is the only construct
//! that issues concurrent reads, and it enforces a hard cap by running
//! exactly `concurrency_limit` worker tasks that pull indices from a shared
//! counter; there is never more than one outstanding read per worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use field_core::FieldElement;

use crate::entity::{EntityBundle, EntityId, EntityKind};
use crate::error::SyncError;
use crate::paginate::Paginator;
use crate::reader::{Address, BlockTag, CellReader, ReadError};
use crate::schema::{MapSlotTemplate, StorageSchema, StorageSlot};

pub struct StateSync<R> {
    reader: Arc<R>,
    schema: Arc<StorageSchema>,
    address: Address,
}

enum WorkerReport {
    Fields(EntityId, Vec<FieldElement>),
    Skipped(EntityId, ReadError),
    Unreachable(ReadError),
}

impl<R: CellReader> StateSync<R> {
    pub fn new(reader: Arc<R>, schema: Arc<StorageSchema>, address: Address) -> Self {
        Self {
            reader,
            schema,
            address,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Fetch and decode a single entity from its derived slot span.
    pub async fn fetch_entity(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<EntityBundle, SyncError> {
        let template = self.schema.resolve_map(kind.schema_field())?;
        let base = template.derive(id);
        let fields =
            read_span(self.reader.as_ref(), &self.address, &base, kind.span()).await?;
        Ok(EntityBundle::decode(kind, &fields)?)
    }

    /// Fetch many entities with at most `concurrency_limit` reads in flight.
    ///
    /// Results are keyed 1:1 by input id regardless of completion order.
    /// Entities whose reads fail transiently are omitted; an unreachable
    /// endpoint aborts the whole batch. `on_progress` receives monotonic
    /// fractions in 0..=1 as entities complete.
    pub async fn fetch_batch<F>(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        concurrency_limit: usize,
        mut on_progress: F,
        out: &mut HashMap<EntityId, EntityBundle>,
    ) -> Result<(), SyncError>
    where
        F: FnMut(f64),
    {
        if ids.is_empty() {
            on_progress(1.0);
            return Ok(());
        }

        let template = self.schema.resolve_map(kind.schema_field())?;
        let jobs: Arc<Vec<(EntityId, StorageSlot)>> = Arc::new(
            ids.iter()
                .map(|id| (id.clone(), template.derive(id)))
                .collect(),
        );
        let next = Arc::new(AtomicUsize::new(0));
        let limit = concurrency_limit.clamp(1, ids.len());
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<WorkerReport>();

        let mut workers = Vec::with_capacity(limit);
        for _ in 0..limit {
            let jobs = Arc::clone(&jobs);
            let next = Arc::clone(&next);
            let reader = Arc::clone(&self.reader);
            let address = self.address.clone();
            let report_tx = report_tx.clone();
            let span = kind.span();
            workers.push(tokio::spawn(async move {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some((id, base)) = jobs.get(index) else {
                        break;
                    };
                    match read_span(reader.as_ref(), &address, base, span).await {
                        Ok(fields) => {
                            let _ = report_tx.send(WorkerReport::Fields(id.clone(), fields));
                        }
                        Err(err @ ReadError::Transient(_)) => {
                            let _ = report_tx.send(WorkerReport::Skipped(id.clone(), err));
                        }
                        Err(err @ ReadError::Unreachable(_)) => {
                            let _ = report_tx.send(WorkerReport::Unreachable(err));
                            break;
                        }
                    }
                }
            }));
        }
        drop(report_tx);

        let total = ids.len();
        let mut completed = 0usize;
        let mut fatal: Option<ReadError> = None;
        let mut decoded: Vec<(EntityId, EntityBundle)> = Vec::with_capacity(total);

        while let Some(report) = report_rx.recv().await {
            match report {
                WorkerReport::Fields(id, fields) => {
                    decoded.push((id, EntityBundle::decode(kind, &fields)?));
                }
                WorkerReport::Skipped(id, err) => {
                    tracing::warn!(
                        target: "mirror::sync",
                        entity = %id,
                        error = %err,
                        "read failed; omitting entity from batch"
                    );
                }
                WorkerReport::Unreachable(err) => {
                    // Steal every remaining index so the other workers drain.
                    next.store(total, Ordering::Relaxed);
                    fatal.get_or_insert(err);
                }
            }
            completed += 1;
            on_progress((completed as f64 / total as f64).min(1.0));
        }

        for worker in workers {
            let _ = worker.await;
        }

        if let Some(err) = fatal {
            return Err(err.into());
        }
        for (id, bundle) in decoded {
            out.insert(id, bundle);
        }
        on_progress(1.0);
        Ok(())
    }

    /// Begin a pagination pass over a counter-indexed list. The counter is
    /// captured once here; entries appended afterwards are not part of the
    /// pass.
    pub async fn paginate(
        &self,
        counter_field: &str,
        index_field: &str,
        page_size: u64,
    ) -> Result<Paginator<'_, R>, SyncError> {
        let counter_slot = self.schema.resolve_plain(counter_field)?;
        let raw = self
            .reader
            .read_cell(BlockTag::Latest, &self.address, counter_slot)
            .await?;
        let captured = raw.to_u64().ok_or(crate::error::DecodeError::ValueOutOfRange {
            kind: "index counter",
            position: 0,
        })?;
        let template = self.schema.resolve_map(index_field)?.clone();
        tracing::debug!(
            target: "mirror::sync",
            counter = counter_field,
            captured,
            page_size,
            "pagination pass started"
        );
        Ok(Paginator::new(self, template, captured, page_size))
    }

    pub(crate) async fn read_index_entry(
        &self,
        template: &MapSlotTemplate,
        index: u64,
    ) -> Result<FieldElement, SyncError> {
        let slot = template.derive(&FieldElement::from(index));
        Ok(self
            .reader
            .read_cell(BlockTag::Latest, &self.address, &slot)
            .await?)
    }
}

async fn read_span<R: CellReader>(
    reader: &R,
    address: &Address,
    base: &StorageSlot,
    span: usize,
) -> Result<Vec<FieldElement>, ReadError> {
    let mut fields = Vec::with_capacity(span);
    for offset in 0..span {
        let slot = base.offset(offset as u64);
        fields.push(reader.read_cell(BlockTag::Latest, address, &slot).await?);
    }
    Ok(fields)
}
