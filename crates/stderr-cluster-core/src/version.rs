//! Sortable keys for free-form tool version strings.
//!
//! Tool versions look like `2.1.3+galaxy1`, `0.10.0`, `234` or
//! `2.1.3+galaxy1+galaxy3`. [`sortable_key`] turns them into a key whose
//! ordering agrees with release order:
//!
//! 1. split on the first `+` into a core and an opaque suffix
//! 2. every character of the core that is not alphanumeric or `.` becomes `.`
//! 3. the core is split on `.`; numeric components are zero-padded to
//!    [`VERSION_COMPONENT_WIDTH`] digits, others kept verbatim
//! 4. a non-empty suffix is appended as the final component
//!
//! Components are compared as strings, so padding makes numeric components
//! order correctly up to 999. A missing version sorts below every real one.
//!
//! ```
//! use stderr_cluster_core::version::sortable_key;
//!
//! assert!(sortable_key(Some("0.1.0+galaxy2")) < sortable_key(Some("0.10.0+galaxy1")));
//! assert_eq!(sortable_key(Some("2.3.7")).components(), ["002", "003", "007"]);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Width numeric version components are padded to.
pub const VERSION_COMPONENT_WIDTH: usize = 3;

/// Textual stand-in used for absent versions.
const MISSING_VERSION_REPR: &str = "nan";

/// Totally ordered key derived from a version string.
///
/// Variant order matters: every `Missing` key is less than every `Known` key.
/// Component vectors compare element by element, a strict prefix being less.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SortableVersion {
    /// No usable version; holds the characters of the stand-in representation.
    Missing(Vec<String>),
    /// Parsed version components.
    Known(Vec<String>),
}

impl SortableVersion {
    /// The key components in comparison order.
    pub fn components(&self) -> &[String] {
        match self {
            SortableVersion::Missing(parts) | SortableVersion::Known(parts) => parts,
        }
    }

    /// Whether this key came from a missing version.
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, SortableVersion::Missing(_))
    }
}

impl fmt::Display for SortableVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.components().join(", "))
    }
}

/// Build the sortable key for a version.
///
/// `None`, and strings that spell a missing value (`""`, `"nan"`, `"NaN"`),
/// produce a [`SortableVersion::Missing`] key.
pub fn sortable_key(version: Option<&str>) -> SortableVersion {
    let Some(version) = version.filter(|v| !is_missing_repr(v)) else {
        return SortableVersion::Missing(
            MISSING_VERSION_REPR.chars().map(String::from).collect(),
        );
    };

    let (core, suffix) = match version.split_once('+') {
        Some((core, suffix)) => (core, Some(suffix)),
        None => (version, None),
    };

    let core: String = core
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c } else { '.' })
        .collect();

    let mut components: Vec<String> = core.split('.').map(pad_component).collect();
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        components.push(suffix.to_string());
    }

    SortableVersion::Known(components)
}

/// Compare two versions by their sortable keys.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    sortable_key(a).cmp(&sortable_key(b))
}

fn is_missing_repr(version: &str) -> bool {
    let trimmed = version.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MISSING_VERSION_REPR)
}

fn pad_component(component: &str) -> String {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return component.to_string();
    }
    let digits = component.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    format!("{:0>width$}", digits, width = VERSION_COMPONENT_WIDTH)
}
