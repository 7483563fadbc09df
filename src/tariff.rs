//! Peak/off-peak tariff classification shared by dispatch and finance.

use chrono::{Datelike, NaiveDateTime};

use crate::profile::decimal_hour;

/// Tariff band a timestamp falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TariffPeriod {
    /// Inside the configured peak window on a peak weekday.
    Peak,
    /// Everything else, including all days outside the weekday mask.
    OffPeak,
}

/// Returns `true` when `hour` falls inside `[start, end)` in decimal hours.
///
/// Windows may wrap midnight (`start > end`); a zero-length window matches
/// nothing.
pub fn in_window(hour: f64, start: f64, end: f64) -> bool {
    if (start - end).abs() < 1e-6 {
        return false;
    }
    if start <= end {
        start <= hour && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Peak-window definition plus energy rates.
///
/// A single `TariffSchedule` instance is shared by the dispatch policy and
/// the financial aggregator so both sides classify timestamps identically.
#[derive(Debug, Clone)]
pub struct TariffSchedule {
    /// Peak window start in decimal hours (e.g. 14.0 for 2pm).
    peak_start_hour: f64,
    /// Peak window end in decimal hours (exclusive).
    peak_end_hour: f64,
    /// Days on which the peak window applies, indexed Monday = 0.
    peak_days: [bool; 7],
    /// Energy rate inside the peak window (RM/kWh).
    peak_rate_rm_per_kwh: f64,
    /// Energy rate outside the peak window (RM/kWh).
    offpeak_rate_rm_per_kwh: f64,
}

impl TariffSchedule {
    /// Creates a schedule from a peak window and the two energy rates.
    ///
    /// # Panics
    ///
    /// Panics if either hour is outside `[0, 24]` or a rate is negative.
    /// Scenario validation reports these as configuration errors first.
    pub fn new(
        peak_start_hour: f64,
        peak_end_hour: f64,
        peak_days: [bool; 7],
        peak_rate_rm_per_kwh: f64,
        offpeak_rate_rm_per_kwh: f64,
    ) -> Self {
        assert!((0.0..=24.0).contains(&peak_start_hour));
        assert!((0.0..=24.0).contains(&peak_end_hour));
        assert!(peak_rate_rm_per_kwh >= 0.0 && offpeak_rate_rm_per_kwh >= 0.0);

        Self {
            peak_start_hour,
            peak_end_hour,
            peak_days,
            peak_rate_rm_per_kwh,
            offpeak_rate_rm_per_kwh,
        }
    }

    /// Classifies a timestamp into its tariff band.
    ///
    /// Total over all timestamps; days outside the weekday mask are always
    /// off-peak.
    pub fn classify(&self, timestamp: NaiveDateTime) -> TariffPeriod {
        let day = timestamp.weekday().num_days_from_monday() as usize;
        if !self.peak_days[day] {
            return TariffPeriod::OffPeak;
        }
        if in_window(
            decimal_hour(timestamp),
            self.peak_start_hour,
            self.peak_end_hour,
        ) {
            TariffPeriod::Peak
        } else {
            TariffPeriod::OffPeak
        }
    }

    /// Returns the energy rate applying at a timestamp (RM/kWh).
    pub fn rate_rm_per_kwh(&self, timestamp: NaiveDateTime) -> f64 {
        self.rate_for(self.classify(timestamp))
    }

    /// Returns the energy rate for a tariff band (RM/kWh).
    pub fn rate_for(&self, period: TariffPeriod) -> f64 {
        match period {
            TariffPeriod::Peak => self.peak_rate_rm_per_kwh,
            TariffPeriod::OffPeak => self.offpeak_rate_rm_per_kwh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

    fn schedule() -> TariffSchedule {
        TariffSchedule::new(14.0, 22.0, WEEKDAYS, 0.31, 0.27)
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn weekday_afternoon_is_peak() {
        // 2024-01-03 is a Wednesday
        assert_eq!(schedule().classify(ts(2024, 1, 3, 15, 0)), TariffPeriod::Peak);
    }

    #[test]
    fn window_boundaries_half_open() {
        let s = schedule();
        assert_eq!(s.classify(ts(2024, 1, 3, 14, 0)), TariffPeriod::Peak);
        assert_eq!(s.classify(ts(2024, 1, 3, 21, 59)), TariffPeriod::Peak);
        assert_eq!(s.classify(ts(2024, 1, 3, 22, 0)), TariffPeriod::OffPeak);
        assert_eq!(s.classify(ts(2024, 1, 3, 13, 59)), TariffPeriod::OffPeak);
    }

    #[test]
    fn weekend_is_always_offpeak() {
        // 2024-01-06 is a Saturday
        assert_eq!(
            schedule().classify(ts(2024, 1, 6, 15, 0)),
            TariffPeriod::OffPeak
        );
    }

    #[test]
    fn rates_follow_classification() {
        let s = schedule();
        assert_eq!(s.rate_rm_per_kwh(ts(2024, 1, 3, 15, 0)), 0.31);
        assert_eq!(s.rate_rm_per_kwh(ts(2024, 1, 3, 2, 0)), 0.27);
        assert_eq!(s.rate_for(TariffPeriod::Peak), 0.31);
        assert_eq!(s.rate_for(TariffPeriod::OffPeak), 0.27);
    }

    #[test]
    fn wrapping_window_crosses_midnight() {
        assert!(in_window(23.0, 22.0, 6.0));
        assert!(in_window(3.0, 22.0, 6.0));
        assert!(!in_window(12.0, 22.0, 6.0));
    }

    #[test]
    fn empty_window_matches_nothing() {
        assert!(!in_window(10.0, 10.0, 10.0));
    }
}
