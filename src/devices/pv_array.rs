//! Deterministic clear-sky solar PV generation model.

use chrono::{Datelike, NaiveDateTime};

use crate::profile::decimal_hour;

/// Seasonal irradiance swing around the annual mean.
const SEASONAL_AMPLITUDE: f64 = 0.15;

/// Day of year of the June solstice, the seasonal maximum.
const SOLSTICE_DOY: f64 = 172.0;

/// A solar PV array producing a smooth clear-sky generation curve.
///
/// Output follows a half-sine elevation profile between sunrise and sunset,
/// modulated by a seasonal factor, derated by the system loss fraction and
/// clipped to the inverter capacity. Purely a function of the timestamp:
/// no state, no randomness, and no failure mode. Out-of-range inputs
/// yield 0 kW rather than an error.
#[derive(Debug, Clone)]
pub struct PvArray {
    /// Nameplate DC capacity in kWp.
    pub capacity_kwp: f64,
    /// Fractional system loss (soiling, wiring, temperature), in `[0, 1)`.
    pub system_loss: f64,
    /// AC inverter capacity in kW; generation above this is clipped.
    pub inverter_capacity_kw: f64,
    /// Sunrise in decimal hours.
    pub sunrise_hour: f64,
    /// Sunset in decimal hours (exclusive).
    pub sunset_hour: f64,
}

impl PvArray {
    /// Creates a new PV array.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or `system_loss` is outside
    /// `[0, 1)`. Scenario validation reports these as configuration errors
    /// first.
    pub fn new(
        capacity_kwp: f64,
        system_loss: f64,
        inverter_capacity_kw: f64,
        sunrise_hour: f64,
        sunset_hour: f64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour);
        assert!((0.0..1.0).contains(&system_loss));

        Self {
            capacity_kwp: capacity_kwp.max(0.0),
            system_loss,
            inverter_capacity_kw: inverter_capacity_kw.max(0.0),
            sunrise_hour,
            sunset_hour,
        }
    }

    /// Expected AC generation at `timestamp` in kW.
    ///
    /// Returns 0 outside daylight hours and is continuous across the day,
    /// rising from 0 at sunrise to the seasonal peak at solar noon.
    pub fn power_kw(&self, timestamp: NaiveDateTime) -> f64 {
        let hour = decimal_hour(timestamp);
        if hour < self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }

        let day_length = self.sunset_hour - self.sunrise_hour;
        let elevation = (std::f64::consts::PI * (hour - self.sunrise_hour) / day_length).sin();

        let doy = f64::from(timestamp.ordinal()) + hour / 24.0;
        let seasonal = 1.0
            + SEASONAL_AMPLITUDE
                * (2.0 * std::f64::consts::PI * (doy - SOLSTICE_DOY) / 365.0).cos();

        let kw = self.capacity_kwp * elevation * seasonal * (1.0 - self.system_loss);
        kw.min(self.inverter_capacity_kw).max(0.0)
    }

    /// Theoretical generation ignoring the inverter limit, for clipping
    /// analysis.
    pub fn unclipped_power_kw(&self, timestamp: NaiveDateTime) -> f64 {
        let hour = decimal_hour(timestamp);
        if hour < self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }

        let day_length = self.sunset_hour - self.sunrise_hour;
        let elevation = (std::f64::consts::PI * (hour - self.sunrise_hour) / day_length).sin();
        let doy = f64::from(timestamp.ordinal()) + hour / 24.0;
        let seasonal = 1.0
            + SEASONAL_AMPLITUDE
                * (2.0 * std::f64::consts::PI * (doy - SOLSTICE_DOY) / 365.0).cos();

        (self.capacity_kwp * elevation * seasonal * (1.0 - self.system_loss)).max(0.0)
    }
}
