//! SNOMED-CT code to label lookups
//!
//! The vendor wants a human readable label next to every disease and specimen type code. Labels
//! come from two static reference tables (a disease tree and a specimen type map) that are loaded
//! at most once per process and never invalidated.

/// Reference tables and the cached process-wide instance
pub mod snomed;

pub use snomed::{CodeLookup, LookupError, SnomedLookup, SnomedTable};
