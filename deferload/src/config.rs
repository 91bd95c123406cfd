//! Configuration for lazy-load bindings.
//!
//! `LazyConfig` is the caller-facing configuration surface shared by the
//! observation engine and the load scheduler. All fields have defaults that
//! match common lazy-image usage: trigger at 10% visibility with a 50px
//! margin, observe once, no eager prefetch, no fallback.

// =============================================================================
// Defaults
// =============================================================================

/// Default intersection ratio required to trigger a load.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Default CSS-margin-like expansion of the viewport test region.
pub const DEFAULT_ROOT_MARGIN: &str = "50px";

/// Configuration for a single lazy-load binding.
///
/// Built with builder-style `with_*` methods:
///
/// ```
/// use deferload::config::LazyConfig;
///
/// let config = LazyConfig::new()
///     .with_threshold(0.25)
///     .with_once(false)
///     .with_fallback("placeholder.png");
///
/// assert_eq!(config.threshold, 0.25);
/// assert!(!config.once);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LazyConfig {
    /// Intersection ratio (0.0 - 1.0) required to fire the trigger.
    pub threshold: f64,

    /// CSS-margin-like expansion of the viewport test region (e.g. `"50px"`).
    pub root_margin: String,

    /// Stop observing after the first positive intersection.
    pub once: bool,

    /// Force eager loading, bypassing visibility.
    pub prefetch: bool,

    /// Value exposed while not yet loaded or after a load failure.
    pub fallback: Option<String>,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: DEFAULT_ROOT_MARGIN.to_string(),
            once: true,
            prefetch: false,
            fallback: None,
        }
    }
}

impl LazyConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the intersection threshold.
    ///
    /// # Panics
    ///
    /// Panics if the threshold is not in the range 0.0..=1.0.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "threshold must be between 0.0 and 1.0"
        );
        self.threshold = threshold;
        self
    }

    /// Sets the root margin.
    pub fn with_root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = margin.into();
        self
    }

    /// Sets whether observation stops after the first positive intersection.
    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Sets whether loading is forced eagerly, bypassing visibility.
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Sets the fallback value shown while unloaded or on error.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LazyConfig::default();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.root_margin, DEFAULT_ROOT_MARGIN);
        assert!(config.once);
        assert!(!config.prefetch);
        assert_eq!(config.fallback, None);
    }

    #[test]
    fn test_builder_chain() {
        let config = LazyConfig::new()
            .with_threshold(0.5)
            .with_root_margin("100px")
            .with_once(false)
            .with_prefetch(true)
            .with_fallback("spinner.gif");

        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.root_margin, "100px");
        assert!(!config.once);
        assert!(config.prefetch);
        assert_eq!(config.fallback.as_deref(), Some("spinner.gif"));
    }

    #[test]
    #[should_panic(expected = "threshold must be between 0.0 and 1.0")]
    fn test_threshold_out_of_range() {
        LazyConfig::new().with_threshold(1.5);
    }

    #[test]
    fn test_threshold_boundaries_accepted() {
        assert_eq!(LazyConfig::new().with_threshold(0.0).threshold, 0.0);
        assert_eq!(LazyConfig::new().with_threshold(1.0).threshold, 1.0);
    }
}
