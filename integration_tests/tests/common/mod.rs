#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use chain_mirror::{Address, BlockTag, CellReader, ReadError, StorageSlot};
use field_core::FieldElement;

pub const SCHEMA_DOC: &str = r#"{
    "fields": {
        "players": { "slot": 1, "kind": "map" },
        "planets": { "slot": 3, "kind": "map" },
        "arrivals": { "slot": 5, "kind": "map" },
        "artifacts": { "slot": 6, "kind": "map" },
        "revealedCoordinates": { "slot": 8, "kind": "map" },
        "planetCounter": { "slot": 7, "kind": "plain" },
        "planetIndex": { "slot": 9, "kind": "map" }
    }
}"#;

static TRACING: Once = Once::new();

/// Route library logs through the test harness, once per test binary.
/// `RUST_LOG=mirror::sync=debug` and friends work as usual.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// In-memory cell store instrumented to observe concurrency. Every read
/// holds an in-flight counter across an awaited sleep so overlapping reads
/// are visible to the peak tracker.
#[derive(Default)]
pub struct MockReader {
    cells: Mutex<HashMap<StorageSlot, FieldElement>>,
    failing: Mutex<HashSet<StorageSlot>>,
    unreachable: AtomicBool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockReader {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn put(&self, slot: StorageSlot, value: FieldElement) {
        self.cells
            .lock()
            .expect("cells mutex poisoned")
            .insert(slot, value);
    }

    /// Seed a span of consecutive slots starting at `base`.
    pub fn put_span(&self, base: &StorageSlot, values: &[FieldElement]) {
        for (offset, value) in values.iter().enumerate() {
            self.put(base.offset(offset as u64), value.clone());
        }
    }

    pub fn fail_slot(&self, slot: StorageSlot) {
        self.failing
            .lock()
            .expect("failing mutex poisoned")
            .insert(slot);
    }

    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl CellReader for MockReader {
    fn read_cell(
        &self,
        _height: BlockTag,
        _address: &Address,
        slot: &StorageSlot,
    ) -> impl Future<Output = Result<FieldElement, ReadError>> + Send {
        let slot = slot.clone();
        async move {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(ReadError::Unreachable("mock endpoint down".to_string()));
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self
                .failing
                .lock()
                .expect("failing mutex poisoned")
                .contains(&slot)
            {
                return Err(ReadError::Transient("mock slot failure".to_string()));
            }
            Ok(self
                .cells
                .lock()
                .expect("cells mutex poisoned")
                .get(&slot)
                .cloned()
                .unwrap_or_default())
        }
    }
}
