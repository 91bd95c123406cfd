//! Load state machine states.

use std::fmt;

/// State of a single deferred resource.
///
/// Transitions only flow `NotStarted -> Loading -> {Loaded | Error}`. A
/// terminal state is left only by an explicit reload, which re-enters
/// `Loading`; re-entrant triggers while `Loading` are no-ops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// No load has been attempted.
    #[default]
    NotStarted,
    /// A load is in flight.
    Loading,
    /// The resource loaded successfully.
    Loaded,
    /// The last load attempt failed.
    Error,
}

impl LoadState {
    /// Whether this state ends a load attempt (`Loaded` or `Error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }

    /// Whether a load is currently in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Short kebab-case label for display and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_started() {
        assert_eq!(LoadState::default(), LoadState::NotStarted);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!LoadState::NotStarted.is_terminal());
        assert!(!LoadState::Loading.is_terminal());
        assert!(LoadState::Loaded.is_terminal());
        assert!(LoadState::Error.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(LoadState::NotStarted.to_string(), "not-started");
        assert_eq!(LoadState::Loading.to_string(), "loading");
        assert_eq!(LoadState::Loaded.to_string(), "loaded");
        assert_eq!(LoadState::Error.to_string(), "error");
    }
}
