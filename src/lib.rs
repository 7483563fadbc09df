//! Behind-the-meter battery and solar-PV peak-shaving simulator.

/// Scenario configuration and presets.
pub mod config;
pub mod devices;
/// CSV import/export adapters.
pub mod io;
/// Load-profile series and synthetic generation.
pub mod profile;
/// Simulation engine, dispatch policies, and financial aggregation.
pub mod sim;
/// Peak/off-peak classification and rates.
pub mod tariff;
