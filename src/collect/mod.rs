//! Concurrent, pagination-aware, permission-tolerant collection engine
//!
//! This module walks a platform's paged API listings to exhaustion, fans out
//! one concurrent task per discovered entity, and aggregates the enriched
//! entities into a single session. Failures are classified at the point of
//! occurrence: a response indicating the credential cannot see a resource
//! becomes a recorded [`MissingPermission`] finding, while any other failure
//! leaves the affected field absent and is surfaced on the session's error
//! channel. No sub-task failure ever aborts sibling work.
//!
//! # Implementation Model
//!
//! A platform-specific collector (e.g. [`github::OrganizationCollector`])
//! implements the [`Collector`] capability set. Its `collect()` call opens a
//! session, discovers the top-level entities through [`paginate`], schedules
//! one [`GroupWaiter`] task per entity, and hands the caller a set of
//! channels that stream collected entities, permission findings, progress
//! ticks, and absorbed errors until the run completes. The channels close
//! exactly once, when every task has finished.

mod api;
mod cancel;
mod collector;
pub mod github;
mod group_waiter;
mod pagination;
mod permissions;
mod progress;
mod session;

pub use api::{ApiFailure, ApiResult, RateLimitInfo};
pub use cancel::CancelFlag;
pub use collector::{Collector, Platform};
pub use group_waiter::GroupWaiter;
pub use pagination::{Page, PageResult, paginate};
pub use permissions::{MissingPermission, Namespace, Permission};
pub use progress::{NoProgress, Progress};
pub use session::{CollectedEntity, CollectionChannels, CollectionError, CollectionOutcome, Session, wrapped_collection};
