//! orgprobe crate
//!
//! Collects configuration and metadata about organizations and their
//! sub-resources (webhooks, identity-provider settings) from a source-control
//! platform's REST and GraphQL APIs, producing an in-memory inventory
//! annotated with any permission gaps encountered along the way.
//!
//! The crate is a pure collection engine: it owns no on-disk format and no
//! report shape. Policy evaluation and reporting are built on top of the
//! [`collect`] module's output.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod collect;
