//! The capability set every entity collector implements.

use super::permissions::Namespace;
use super::session::CollectionChannels;
use strum::{Display, EnumString};

/// Source-control platforms the engine can inventory.
///
/// The platform is selected once at setup time; callers construct the
/// matching concrete collector there and never re-branch per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    GitHub,
}

/// The concrete policy for collecting one entity kind from one platform.
///
/// A collector discovers its top-level entities, fans out one task per
/// entity for the extra per-entity sub-collections, and merges everything
/// into a single run session. Each implementation produces exactly one
/// entity kind per run.
pub trait Collector {
    /// The enriched entity type this collector produces.
    type Output: Send + 'static;

    /// The namespace kind of the produced entities.
    fn namespace(&self) -> Namespace;

    /// Cheap advisory estimate of the total entity count, for progress
    /// reporting only.
    ///
    /// Returns 0 (after logging) on failure; never mutates run state, and
    /// repeated calls against an unchanged remote return the same count.
    fn collect_total_entities(&self) -> impl Future<Output = u64> + Send;

    /// Start a collection run and hand back its channels.
    ///
    /// Returns immediately; the run proceeds on the runtime and streams into
    /// the returned channels until they close.
    fn collect(&self) -> CollectionChannels<Self::Output>;
}
