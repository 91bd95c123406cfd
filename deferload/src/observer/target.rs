//! Opaque handles for observable regions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter backing [`TargetId::next`].
static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an observation target.
///
/// Drivers key their watch registrations on this id; the view-binding layer
/// holds it to deliver intersection events for the right target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        Self(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target-{}", self.0)
    }
}

/// An opaque handle to a viewable region supplied by the view-binding layer.
///
/// The engine observing a target owns its watch exclusively; the target
/// itself is just identity plus a label for logging.
#[derive(Clone, Debug)]
pub struct ObservationTarget {
    id: TargetId,
    label: String,
}

impl ObservationTarget {
    /// Creates a target with a fresh id and the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: TargetId::next(),
            label: label.into(),
        }
    }

    /// The target's unique id.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The human-readable label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for ObservationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_ids_are_unique() {
        let a = ObservationTarget::new("a");
        let b = ObservationTarget::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_target_display() {
        let target = ObservationTarget::new("hero");
        let text = target.to_string();
        assert!(text.contains("hero"));
        assert!(text.contains("target-"));
    }
}
