/// Registry of known citizen-science source categories.
///
/// The `Data.Source` column is open-ended, but the published dataset uses
/// a fixed set of labels. This registry is the single source of truth for
/// those labels; other modules reference categories from here rather
/// than hardcoding strings.

// ---------------------------------------------------------------------------
// Category labels
// ---------------------------------------------------------------------------

/// Camera-trap records counted once per species per day.
pub const DAILY_RECORD: &str = "Daily Record";

/// Camera-trap records counted once per independent photo sequence.
pub const SEQUENCES_RECORD: &str = "Sequences Record";

/// Records mirrored from GBIF-publishing platforms.
pub const GLOBAL_BIODIVERSITY: &str = "Global Biodiversity";

/// Platform records that have not passed expert validation.
pub const NO_VALIDATION: &str = "No Validation";

// ---------------------------------------------------------------------------
// Category metadata
// ---------------------------------------------------------------------------

/// Metadata for one source category.
pub struct SourceCategory {
    pub label: &'static str,
    pub description: &'static str,
    /// Whether the records come from the project's own camera traps.
    pub camera_trap: bool,
}

/// All source categories found in the citizen-science dataset.
pub static SOURCE_REGISTRY: &[SourceCategory] = &[
    SourceCategory {
        label: GLOBAL_BIODIVERSITY,
        description: "Historical occurrences from iMammalia, iNaturalist and \
                      Observation.org, as published through GBIF.",
        camera_trap: false,
    },
    SourceCategory {
        label: NO_VALIDATION,
        description: "Platform observations awaiting expert validation. \
                      Useful for coverage, weaker for identification.",
        camera_trap: false,
    },
    SourceCategory {
        label: SEQUENCES_RECORD,
        description: "School camera traps, one record per independent \
                      detection sequence.",
        camera_trap: true,
    },
    SourceCategory {
        label: DAILY_RECORD,
        description: "School camera traps, at most one record per species \
                      per camera per day.",
        camera_trap: true,
    },
];

/// Looks up a category by label. Returns `None` if not found.
pub fn find_source(label: &str) -> Option<&'static SourceCategory> {
    SOURCE_REGISTRY.iter().find(|s| s.label == label)
}

pub fn is_known_source(label: &str) -> bool {
    find_source(label).is_some()
}

/// Labels of the camera-trap categories, in registry order.
pub fn camera_trap_sources() -> Vec<&'static str> {
    SOURCE_REGISTRY
        .iter()
        .filter(|s| s.camera_trap)
        .map(|s| s.label)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
