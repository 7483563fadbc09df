//! Physical asset models for the simulation.

/// Battery energy storage model.
pub mod battery;
/// Solar photovoltaic generation model.
pub mod pv_array;

// Re-export the main types for convenience
pub use battery::Battery;
pub use pv_array::PvArray;
