//! Responsive source resolution.
//!
//! Maps a base resource identifier and a set of named breakpoint variants to
//! the variant appropriate for the current viewport width. This module
//! performs no I/O and holds no mutable state: a [`ResponsiveSource`] is
//! immutable once constructed and every read recomputes from the latest
//! viewport width, so results are always consistent without invalidation.
//!
//! # Example
//!
//! ```
//! use deferload::responsive::{Breakpoint, ResponsiveSource};
//!
//! let source = ResponsiveSource::new("assets/hero.jpg")
//!     .with_variant(Breakpoint::W1920, "assets/hero-huge.jpg");
//!
//! assert_eq!(source.current_src(480), "assets/hero-480w.jpg");
//! assert_eq!(source.current_src(2000), "assets/hero-huge.jpg");
//! ```

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Breakpoints
// =============================================================================

/// A named viewport-width threshold used to pick a resource variant.
///
/// Ordered by ascending width, so iterating a `BTreeMap` keyed by
/// `Breakpoint` yields variants narrowest-first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Breakpoint {
    /// Small phones, up to 480px.
    W480,
    /// Tablets and large phones, up to 768px.
    W768,
    /// Small desktops, up to 1024px.
    W1024,
    /// Full-width desktops.
    W1920,
}

impl Breakpoint {
    /// All breakpoints in ascending width order.
    pub const ALL: [Breakpoint; 4] = [
        Breakpoint::W480,
        Breakpoint::W768,
        Breakpoint::W1024,
        Breakpoint::W1920,
    ];

    /// The pixel width this breakpoint describes.
    pub fn width(&self) -> u32 {
        match self {
            Breakpoint::W480 => 480,
            Breakpoint::W768 => 768,
            Breakpoint::W1024 => 1024,
            Breakpoint::W1920 => 1920,
        }
    }

    /// The suffix used in derived filenames and `srcset` descriptors.
    pub fn suffix(&self) -> &'static str {
        match self {
            Breakpoint::W480 => "480w",
            Breakpoint::W768 => "768w",
            Breakpoint::W1024 => "1024w",
            Breakpoint::W1920 => "1920w",
        }
    }

    /// Selects the tier for a viewport width.
    ///
    /// Tiers are `<=480 -> W480`, `<=768 -> W768`, `<=1024 -> W1024`,
    /// otherwise `W1920`. A width exactly on a boundary belongs to the
    /// lower tier.
    pub fn for_viewport(width: u32) -> Self {
        if width <= 480 {
            Breakpoint::W480
        } else if width <= 768 {
            Breakpoint::W768
        } else if width <= 1024 {
            Breakpoint::W1024
        } else {
            Breakpoint::W1920
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

// =============================================================================
// Responsive Source
// =============================================================================

/// An immutable mapping from breakpoints to resource URLs.
///
/// [`ResponsiveSource::new`] derives a default variant for every breakpoint
/// by inserting the breakpoint suffix before the filename extension of the
/// base identifier. Caller-supplied variants override the derived defaults
/// key-for-key. A missing variant is never an error: resolution falls back
/// to the base identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponsiveSource {
    base: String,
    variants: BTreeMap<Breakpoint, String>,
}

impl ResponsiveSource {
    /// Creates a source with derived variants for every breakpoint.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let variants = Breakpoint::ALL
            .iter()
            .map(|bp| (*bp, derive_variant(&base, *bp)))
            .collect();
        Self { base, variants }
    }

    /// Creates a source with no derived variants.
    ///
    /// Only explicitly supplied variants resolve; every other tier falls
    /// back to the base identifier.
    pub fn bare(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            variants: BTreeMap::new(),
        }
    }

    /// Overrides the variant for one breakpoint.
    pub fn with_variant(mut self, breakpoint: Breakpoint, url: impl Into<String>) -> Self {
        self.variants.insert(breakpoint, url.into());
        self
    }

    /// The base resource identifier.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The variant URL for a breakpoint, if one exists.
    pub fn variant(&self, breakpoint: Breakpoint) -> Option<&str> {
        self.variants.get(&breakpoint).map(String::as_str)
    }

    /// Every `(breakpoint, url)` pair in ascending breakpoint order.
    pub fn entries(&self) -> impl Iterator<Item = (Breakpoint, &str)> {
        self.variants.iter().map(|(bp, url)| (*bp, url.as_str()))
    }

    /// A `srcset`-style descriptor listing every variant.
    ///
    /// Pairs are ordered by ascending breakpoint width, e.g.
    /// `"a-480w.jpg 480w, a-768w.jpg 768w, ..."`.
    pub fn src_set(&self) -> String {
        self.entries()
            .map(|(bp, url)| format!("{} {}", url, bp.suffix()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolves the source for the given viewport width.
    ///
    /// Pure function of the width: selects the tier via
    /// [`Breakpoint::for_viewport`] and falls back to the base identifier
    /// when that tier has no variant.
    pub fn current_src(&self, viewport_width: u32) -> &str {
        let tier = Breakpoint::for_viewport(viewport_width);
        self.variant(tier).unwrap_or(&self.base)
    }
}

/// Derives a variant URL by inserting the breakpoint suffix before the
/// filename extension, e.g. `photo.jpg` -> `photo-480w.jpg`.
///
/// Identifiers without an extension get the suffix appended at the end.
/// A dot inside a directory component does not count as an extension.
fn derive_variant(base: &str, breakpoint: Breakpoint) -> String {
    let slash = base.rfind('/').map(|i| i + 1).unwrap_or(0);
    match base[slash..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = slash + dot;
            format!("{}-{}{}", &base[..dot], breakpoint.suffix(), &base[dot..])
        }
        _ => format!("{}-{}", base, breakpoint.suffix()),
    }
}
