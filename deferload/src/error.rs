//! Error types shared across the loading components.
//!
//! Failures inside loaders are always caught at the component boundary and
//! converted into observable state (the scheduler's `error` signal, a queue
//! warning). Nothing in this crate propagates a load failure as a panic or
//! an `Err` across the public API surface; callers poll or subscribe to the
//! error state instead.

use thiserror::Error;

/// Errors produced while loading a deferred resource.
///
/// These are recorded in scheduler state or logged by the prefetch queue,
/// never thrown past a component boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The caller-supplied loader rejected.
    #[error("loader failed: {0}")]
    Loader(String),

    /// A network fetch failed (HTTP error, timeout, connection refused).
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl LoadError {
    /// Creates a loader failure from any displayable cause.
    pub fn loader(cause: impl std::fmt::Display) -> Self {
        Self::Loader(cause.to_string())
    }

    /// Creates a fetch failure from any displayable cause.
    pub fn fetch(cause: impl std::fmt::Display) -> Self {
        Self::Fetch(cause.to_string())
    }
}

/// The host environment lacks intersection-detection capability.
///
/// This is not surfaced to callers: the observation engine handles it by
/// failing open (triggering immediately and permanently). It exists as a
/// typed error so drivers can report the condition explicitly.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("intersection detection is unavailable on this host")]
pub struct DriverUnavailable;
