//! Mutable state of one collection run and its channel handoff.

use super::permissions::{MissingPermission, Namespace};
use super::progress::Progress;
use compact_str::CompactString;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const LOG_TARGET: &str = "collect";

/// A failure absorbed during a collection run.
///
/// Absorbed failures never abort sibling work; they are logged at the point
/// of occurrence and surfaced here so callers and tests can observe them
/// instead of relying on incidental log output.
#[derive(Debug)]
pub enum CollectionError {
    /// Top-level entity discovery failed. Fatal to the run: zero entities are
    /// produced because there is nothing to fan out over.
    Discovery(ohno::AppError),

    /// A single entity's enrichment field could not be fetched for a reason
    /// other than a permission gap. The field is left absent and the entity
    /// is still merged.
    SubCollection {
        /// Identifier of the affected entity.
        entity: CompactString,
        /// Which sub-collection failed (e.g. "webhooks").
        what: &'static str,
        error: ohno::AppError,
    },
}

impl CollectionError {
    /// Returns `true` for the fatal discovery variant.
    #[must_use]
    pub const fn is_discovery(&self) -> bool {
        matches!(self, Self::Discovery(_))
    }
}

/// A fully-enriched entity together with the context it was collected in.
#[derive(Debug, Clone, Serialize)]
pub struct CollectedEntity<T> {
    /// The namespace kind the entity belongs to.
    pub namespace: Namespace,

    /// The entity plus its collector-specific enrichment.
    pub entity: T,

    /// Display URL of the entity on the platform.
    pub url: CompactString,

    /// Roles the credential holds on the entity.
    pub roles: Vec<CompactString>,
}

/// Shared mutable state of one collection run for one entity kind.
///
/// Exclusively owned by one collector run; worker tasks hold it behind an
/// `Arc` and merge their results through it. All merges are append-only and
/// commutative, so mutual exclusion on the deduplication set plus atomic
/// counters is the only synchronization required.
pub struct Session<T> {
    namespace: Namespace,
    collected_tx: mpsc::UnboundedSender<CollectedEntity<T>>,
    permissions_tx: mpsc::UnboundedSender<MissingPermission>,
    progress_tx: mpsc::UnboundedSender<u64>,
    errors_tx: mpsc::UnboundedSender<CollectionError>,
    seen_permissions: Mutex<HashSet<MissingPermission>>,
    progress: AtomicU64,
    total: AtomicU64,
    reporter: Arc<dyn Progress>,
}

impl<T> core::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .field("progress", &self.progress)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl<T> Session<T> {
    /// Set the phase label on the run's progress reporter.
    pub fn set_phase(&self, phase: &str) {
        self.reporter.set_phase(phase);
    }

    /// Record the advisory total discovered entity count for progress
    /// reporting. Never gates correctness.
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    /// Merge one fully-enriched entity into the run's result sequence.
    ///
    /// Safe to call concurrently from multiple fan-out tasks; entities are
    /// streamed to the caller in completion order.
    pub fn collect_data(&self, entity: T, url: impl Into<CompactString>, roles: Vec<CompactString>) {
        let _ = self.collected_tx.send(CollectedEntity {
            namespace: self.namespace,
            entity,
            url: url.into(),
            roles,
        });
    }

    /// Record a permission gap finding. Idempotent under duplicate reports.
    pub fn issue_missing_permissions(&self, finding: MissingPermission) {
        let is_new = self
            .seen_permissions
            .lock()
            .map(|mut seen| seen.insert(finding.clone()))
            .unwrap_or(false);

        if is_new {
            log::warn!(target: LOG_TARGET, "{finding}");
            let _ = self.permissions_tx.send(finding);
        }
    }

    /// Atomically advance the progress counter by one fully-merged entity.
    pub fn change_by_one(&self) {
        let completed = self.progress.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.progress_tx.send(completed);
        self.reporter.advance(completed, self.total.load(Ordering::Relaxed));
    }

    /// Record a fatal discovery failure. The run yields zero entities.
    pub fn report_discovery_failure(&self, error: ohno::AppError) {
        log::error!(target: LOG_TARGET, "failed to discover {} entities: {error:#}", self.namespace);
        let _ = self.errors_tx.send(CollectionError::Discovery(error));
    }

    /// Record an absorbed sub-collection failure; the affected field stays
    /// absent and the run continues.
    pub fn report_sub_failure(&self, entity: impl Into<CompactString>, what: &'static str, error: ohno::AppError) {
        let entity = entity.into();
        log::warn!(target: LOG_TARGET, "failed to collect {what} for {} '{entity}': {error:#}", self.namespace);
        let _ = self.errors_tx.send(CollectionError::SubCollection { entity, what, error });
    }
}

/// Open a session, run the caller-supplied discovery+fan-out body on the
/// runtime, and hand back the channels the run streams into.
///
/// The channels complete exactly once: they close when the body and every
/// task still holding the session have finished, regardless of what failed
/// inside. Internal sub-task failures are absorbed per the session's error
/// discipline and never bubble out of the handoff.
pub fn wrapped_collection<T, F, Fut>(namespace: Namespace, reporter: Arc<dyn Progress>, body: F) -> CollectionChannels<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<Session<T>>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (collected_tx, collected) = mpsc::unbounded_channel();
    let (permissions_tx, missing_permissions) = mpsc::unbounded_channel();
    let (progress_tx, progress) = mpsc::unbounded_channel();
    let (errors_tx, errors) = mpsc::unbounded_channel();

    let session = Arc::new(Session {
        namespace,
        collected_tx,
        permissions_tx,
        progress_tx,
        errors_tx,
        seen_permissions: Mutex::new(HashSet::new()),
        progress: AtomicU64::new(0),
        total: AtomicU64::new(0),
        reporter,
    });

    drop(tokio::spawn(async move {
        body(Arc::clone(&session)).await;
        session.reporter.done();
    }));

    CollectionChannels {
        collected,
        missing_permissions,
        progress,
        errors,
    }
}

/// Channel handoff of one collection run.
///
/// Streams results while the run is in flight; all four channels close when
/// the run completes. Use [`join`](Self::join) to wait for completion and
/// aggregate everything into a [`CollectionOutcome`].
#[derive(Debug)]
pub struct CollectionChannels<T> {
    /// Enriched entities, in completion order.
    pub collected: mpsc::UnboundedReceiver<CollectedEntity<T>>,

    /// Deduplicated permission gap findings.
    pub missing_permissions: mpsc::UnboundedReceiver<MissingPermission>,

    /// Running count of fully-merged entities.
    pub progress: mpsc::UnboundedReceiver<u64>,

    /// Failures absorbed during the run.
    pub errors: mpsc::UnboundedReceiver<CollectionError>,
}

impl<T> CollectionChannels<T> {
    /// Drain every channel to completion and aggregate the final state.
    ///
    /// The channels are unbounded, so draining them one after another cannot
    /// deadlock: senders never block, and all of them close once the run's
    /// last task drops its session handle.
    pub async fn join(mut self) -> CollectionOutcome<T> {
        let mut entities = Vec::new();
        while let Some(entity) = self.collected.recv().await {
            entities.push(entity);
        }

        let mut missing_permissions = Vec::new();
        while let Some(finding) = self.missing_permissions.recv().await {
            missing_permissions.push(finding);
        }

        let mut progress = 0;
        while let Some(count) = self.progress.recv().await {
            progress = progress.max(count);
        }

        let mut errors = Vec::new();
        while let Some(error) = self.errors.recv().await {
            errors.push(error);
        }

        CollectionOutcome {
            entities,
            missing_permissions,
            errors,
            progress,
        }
    }
}

/// Final aggregated state of one collection run.
#[derive(Debug)]
pub struct CollectionOutcome<T> {
    /// One enriched entity per discovered entity, in completion order.
    /// Downstream consumers must treat this as unordered, keyed by entity
    /// identifier.
    pub entities: Vec<CollectedEntity<T>>,

    /// Permission gaps detected during the run.
    pub missing_permissions: Vec<MissingPermission>,

    /// Failures absorbed during the run.
    pub errors: Vec<CollectionError>,

    /// Final progress count; equals the number of entities fully merged.
    pub progress: u64,
}

impl<T> CollectionOutcome<T> {
    /// Returns `true` when top-level discovery itself failed.
    #[must_use]
    pub fn discovery_failed(&self) -> bool {
        self.errors.iter().any(CollectionError::is_discovery)
    }
}
