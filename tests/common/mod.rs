//! Shared builders for integration tests.
#![allow(dead_code)]

use bess_sim::devices::{Battery, PvArray};
use bess_sim::profile::{LoadSample, LoadSeries};
use bess_sim::tariff::TariffSchedule;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

/// Monday 2024-01-01 00:00, so default weekday tariffs apply.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Constant-load series at 5-minute resolution.
pub fn flat_series(load_kw: f64, hours: i64) -> LoadSeries {
    let steps = hours * 12;
    let samples = (0..steps)
        .map(|i| LoadSample {
            timestamp: start() + Duration::minutes(i * 5),
            load_kw,
        })
        .collect();
    LoadSeries::from_samples(samples, Vec::new())
}

/// A PV array too small to matter (0 kW inverter clips everything).
pub fn no_pv() -> PvArray {
    PvArray::new(1.0, 0.0, 0.0, 6.5, 19.0)
}

/// The industrial-scale default array.
pub fn default_pv() -> PvArray {
    PvArray::new(9109.1, 0.14, 9109.1, 6.5, 19.0)
}

/// 1 MWh / 500 kW lossless battery with no fade, SoE as given.
pub fn small_battery(initial_soe: f64) -> Battery {
    Battery::new(1.0, initial_soe, 500.0, 500.0, 1.0, 0.0, 0.8)
}

/// 7.5 MWh / 2 MW battery with realistic loss and fade.
pub fn default_battery(initial_soe: f64) -> Battery {
    Battery::new(7.5, initial_soe, 2000.0, 2000.0, 0.90, 2.5e-5, 0.80)
}

/// Default Malaysian commercial tariff: 14:00–22:00 weekday peak.
pub fn weekday_tariff() -> TariffSchedule {
    TariffSchedule::new(14.0, 22.0, WEEKDAYS, 0.31, 0.27)
}
