//! File import/export adapters around the simulation core.

/// CSV step-record export.
pub mod export;
/// CSV load-profile import.
pub mod load;
