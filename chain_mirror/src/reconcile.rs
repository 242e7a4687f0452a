//! Snapshot/live reconciliation.
//!
//! The reconciler polls a snapshot source cheaply (a signature such as an
//! HTTP validator header), reloads the full body only when the signature
//! changed and a minimum interval has elapsed, and never runs two
//! reconciliations at once: a poll started while one is pending is dropped,
//! not queued. These two rules are the only cross-call shared state in the
//! core.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::reader::Address;
use crate::snapshot::Snapshot;

/// Opaque staleness token for a snapshot source (content fingerprint, cache
/// validator string, or similar).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncSignature(pub String);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),
}

/// Full snapshot body plus the signature it was served under, when known.
#[derive(Debug, Clone)]
pub struct SnapshotPayload {
    pub body: String,
    pub signature: Option<SyncSignature>,
}

/// Transport for snapshot documents. The cheap check may be unsupported by a
/// source; returning `Ok(None)` makes the reconciler fall back to a full
/// fetch.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<SnapshotPayload, SourceError>> + Send;
    fn poll_signature(
        &self,
    ) -> impl Future<Output = Result<Option<SyncSignature>, SourceError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Unloaded,
    /// Loaded and the last signature check confirmed no change.
    Fresh,
    /// A change was observed but the reload is still gated or pending.
    Stale,
}

/// Outcome of one poll.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// A snapshot was (re)loaded and applied.
    Applied,
    /// Signature unchanged; nothing to do.
    Unchanged,
    /// Change observed but the minimum interval has not elapsed yet.
    Deferred,
    /// The payload failed validation and was treated as absent.
    Rejected,
    /// Another reconciliation was already in flight; this poll was dropped.
    AlreadyRunning,
}

/// Pure gating rule: reload only when the signature differs from the last
/// applied one (an unknown current signature counts as differing) and the
/// minimum interval since the previous application has elapsed. A missing
/// baseline always applies.
pub fn should_apply(
    current: Option<&SyncSignature>,
    last: Option<&SyncSignature>,
    elapsed_since_apply: Option<Duration>,
    min_interval: Duration,
) -> bool {
    let changed = match (current, last) {
        (_, None) => return true,
        (Some(current), Some(last)) => current != last,
        (None, Some(_)) => true,
    };
    if !changed {
        return false;
    }
    match elapsed_since_apply {
        Some(elapsed) => elapsed >= min_interval,
        None => true,
    }
}

struct ReconcilerInner {
    state: ReconcilerState,
    last_signature: Option<SyncSignature>,
    last_applied_at: Option<Instant>,
    snapshot: Option<Snapshot>,
}

pub struct Reconciler<S> {
    source: S,
    expected_address: Address,
    min_interval: Duration,
    in_flight: AtomicBool,
    inner: Mutex<ReconcilerInner>,
}

impl<S: SnapshotSource> Reconciler<S> {
    pub fn new(source: S, expected_address: Address, min_interval: Duration) -> Self {
        Self {
            source,
            expected_address,
            min_interval,
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(ReconcilerInner {
                state: ReconcilerState::Unloaded,
                last_signature: None,
                last_applied_at: None,
                snapshot: None,
            }),
        }
    }

    pub fn state(&self) -> ReconcilerState {
        self.lock_inner().state
    }

    /// The most recently applied snapshot, if any.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.lock_inner().snapshot.clone()
    }

    /// Run one reconciliation step: cheap signature check, then a gated full
    /// reload. Drops the poll if another one is still pending.
    pub async fn poll(&self) -> Result<PollOutcome, SourceError> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                target: "mirror::snapshot",
                "reconciliation already in flight; dropping poll"
            );
            return Ok(PollOutcome::AlreadyRunning);
        }
        let outcome = self.poll_locked().await;
        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    async fn poll_locked(&self) -> Result<PollOutcome, SourceError> {
        let current = self.source.poll_signature().await?;

        let (last_signature, elapsed) = {
            let inner = self.lock_inner();
            let elapsed = inner.last_applied_at.map(|at| at.elapsed());
            (inner.last_signature.clone(), elapsed)
        };

        if !should_apply(
            current.as_ref(),
            last_signature.as_ref(),
            elapsed,
            self.min_interval,
        ) {
            let unchanged = current.is_some() && current == last_signature;
            let mut inner = self.lock_inner();
            inner.state = if unchanged {
                ReconcilerState::Fresh
            } else {
                ReconcilerState::Stale
            };
            return Ok(if unchanged {
                PollOutcome::Unchanged
            } else {
                PollOutcome::Deferred
            });
        }

        let payload = self.source.fetch().await?;
        match Snapshot::load(&payload.body, &self.expected_address) {
            Some(snapshot) => {
                let block_number = snapshot.meta.block_number;
                let mut inner = self.lock_inner();
                inner.snapshot = Some(snapshot);
                inner.last_signature = payload.signature.or(current);
                inner.last_applied_at = Some(Instant::now());
                inner.state = ReconcilerState::Fresh;
                drop(inner);
                tracing::info!(
                    target: "mirror::snapshot",
                    block_number,
                    "snapshot applied"
                );
                Ok(PollOutcome::Applied)
            }
            None => Ok(PollOutcome::Rejected),
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, ReconcilerInner> {
        self.inner.lock().expect("reconciler state mutex poisoned")
    }
}

/// Caller-owned repeating timer with an explicit cancellation handle. The
/// loop stops when `stop` is called or the handle is dropped; there is no
/// free-running background loop without a shutdown hook.
pub struct RepeatingTask {
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (shutdown, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = timer.tick() => tick().await,
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
        });
        Self { shutdown, handle }
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        let _ = self.handle.await;
    }
}
