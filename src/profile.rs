//! Measured load-profile series: samples, interval inference, and a seeded
//! synthetic generator for demo scenarios.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Default nominal interval assumed when a series is too short to infer one.
const FALLBACK_INTERVAL_HOURS: f64 = 5.0 / 60.0;

/// Relative deviation from the median delta above which the series is
/// flagged as non-uniform.
const JITTER_TOLERANCE: f64 = 0.01;

/// Delta-to-median ratio above which a gap (missing samples) is flagged.
const GAP_RATIO: f64 = 1.5;

/// Returns the time of day as a decimal hour (e.g. 14.5 for 14:30).
pub fn decimal_hour(timestamp: NaiveDateTime) -> f64 {
    f64::from(timestamp.hour())
        + f64::from(timestamp.minute()) / 60.0
        + f64::from(timestamp.second()) / 3600.0
}

/// One measured sample of facility demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    pub timestamp: NaiveDateTime,
    /// Demand in kW, non-negative.
    pub load_kw: f64,
}

/// Non-fatal data-quality issue found while preparing a series.
///
/// Warnings never abort a run; the series is repaired with a defensive
/// default and the caller decides whether to surface them.
#[derive(Debug, Clone)]
pub struct QualityWarning {
    pub message: String,
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data quality: {}", self.message)
    }
}

/// An ordered load series with an inferred nominal sampling interval.
///
/// Timestamps are strictly increasing after construction. The nominal
/// interval is the median delta between consecutive samples; per-step
/// deltas remain available through [`LoadSeries::step_hours`] so small
/// jitter does not skew energy integration.
#[derive(Debug, Clone)]
pub struct LoadSeries {
    samples: Vec<LoadSample>,
    interval_hours: f64,
    warnings: Vec<QualityWarning>,
}

impl LoadSeries {
    /// Builds a series from raw samples, repairing what can be repaired.
    ///
    /// Sorts by timestamp, drops duplicate timestamps (keeping the first),
    /// clamps negative loads to zero, and infers the nominal interval.
    /// Every repair is recorded as a [`QualityWarning`].
    pub fn from_samples(mut samples: Vec<LoadSample>, mut warnings: Vec<QualityWarning>) -> Self {
        let sorted = samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
        if !sorted {
            samples.sort_by_key(|s| s.timestamp);
            warnings.push(QualityWarning {
                message: "timestamps were out of order and have been sorted".into(),
            });
        }

        let before = samples.len();
        samples.dedup_by_key(|s| s.timestamp);
        let dropped = before - samples.len();
        if dropped > 0 {
            warnings.push(QualityWarning {
                message: format!("{dropped} duplicate timestamp(s) dropped, first kept"),
            });
        }

        let negatives = samples.iter().filter(|s| s.load_kw < 0.0).count();
        if negatives > 0 {
            for s in &mut samples {
                if s.load_kw < 0.0 {
                    s.load_kw = 0.0;
                }
            }
            warnings.push(QualityWarning {
                message: format!("{negatives} negative load value(s) clamped to 0 kW"),
            });
        }

        let interval_hours = Self::infer_interval(&samples, &mut warnings);

        Self {
            samples,
            interval_hours,
            warnings,
        }
    }

    fn infer_interval(samples: &[LoadSample], warnings: &mut Vec<QualityWarning>) -> f64 {
        let mut deltas: Vec<f64> = samples
            .windows(2)
            .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds() as f64 / 3600.0)
            .collect();

        if deltas.is_empty() {
            warnings.push(QualityWarning {
                message: format!(
                    "series too short to infer an interval, assuming {:.0} minutes",
                    FALLBACK_INTERVAL_HOURS * 60.0
                ),
            });
            return FALLBACK_INTERVAL_HOURS;
        }

        deltas.sort_by(|a, b| a.total_cmp(b));
        let median = deltas[deltas.len() / 2];

        let jittery = deltas
            .iter()
            .filter(|&&d| (d - median).abs() > median * JITTER_TOLERANCE)
            .count();
        if jittery > 0 {
            warnings.push(QualityWarning {
                message: format!(
                    "non-uniform sampling: {jittery} interval(s) deviate from the \
                     {:.1}-minute median; per-step deltas are used",
                    median * 60.0
                ),
            });
        }

        let gaps = deltas.iter().filter(|&&d| d > median * GAP_RATIO).count();
        if gaps > 0 {
            warnings.push(QualityWarning {
                message: format!("{gaps} gap(s) detected, samples appear to be missing"),
            });
        }

        median
    }

    pub fn samples(&self) -> &[LoadSample] {
        &self.samples
    }

    /// Nominal sampling interval in hours (median of consecutive deltas).
    pub fn interval_hours(&self) -> f64 {
        self.interval_hours
    }

    pub fn warnings(&self) -> &[QualityWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by step `i` in hours: the delta to the next sample,
    /// or the nominal interval for the final step.
    pub fn step_hours(&self, i: usize) -> f64 {
        match (self.samples.get(i), self.samples.get(i + 1)) {
            (Some(a), Some(b)) => (b.timestamp - a.timestamp).num_seconds() as f64 / 3600.0,
            _ => self.interval_hours,
        }
    }
}

/// Seeded synthetic demand profile for demo runs and tests.
///
/// Produces a sinusoidal daily pattern with Gaussian noise, the classic
/// "flat base plus daytime bulge" industrial shape. Deterministic for a
/// fixed seed.
#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    /// Baseline demand in kW.
    pub base_kw: f64,
    /// Amplitude of the daily sinusoidal swing in kW.
    pub amp_kw: f64,
    /// Phase offset of the swing in radians.
    pub phase_rad: f64,
    /// Standard deviation of the additive noise in kW.
    pub noise_std_kw: f64,
    rng: StdRng,
}

impl SyntheticProfile {
    pub fn new(base_kw: f64, amp_kw: f64, phase_rad: f64, noise_std_kw: f64, seed: u64) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std_kw: noise_std_kw.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates `days` of samples at `interval_minutes` starting at
    /// midnight on `start_date`.
    pub fn generate(&mut self, start_date: NaiveDate, days: u32, interval_minutes: u32) -> LoadSeries {
        let interval_minutes = i64::from(interval_minutes.max(1));
        let steps_per_day = (24 * 60) / interval_minutes;
        let start = start_date.and_hms_opt(0, 0, 0).unwrap_or_default();

        let total = steps_per_day * i64::from(days);
        let mut samples = Vec::with_capacity(total as usize);
        for i in 0..total {
            let timestamp = start + Duration::minutes(i * interval_minutes);
            let hour = decimal_hour(timestamp);
            let angle = 2.0 * std::f64::consts::PI * hour / 24.0 + self.phase_rad;
            let load_kw =
                self.base_kw + self.amp_kw * angle.sin() + gaussian_noise(&mut self.rng, self.noise_std_kw);
            samples.push(LoadSample {
                timestamp,
                load_kw: load_kw.max(0.0),
            });
        }

        LoadSeries::from_samples(samples, Vec::new())
    }
}

/// Gaussian noise via the Box-Muller transform, mean 0.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn sample(d: u32, h: u32, min: u32, load_kw: f64) -> LoadSample {
        LoadSample {
            timestamp: ts(d, h, min),
            load_kw,
        }
    }

    #[test]
    fn infers_five_minute_interval() {
        let samples = (0..12).map(|i| sample(1, 0, i * 5, 100.0)).collect();
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert!((series.interval_hours() - 5.0 / 60.0).abs() < 1e-9);
        assert!(series.warnings().is_empty());
    }

    #[test]
    fn sorts_and_warns_on_unordered_input() {
        let samples = vec![sample(1, 1, 0, 2.0), sample(1, 0, 0, 1.0)];
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert_eq!(series.samples()[0].load_kw, 1.0);
        assert!(series.warnings().iter().any(|w| w.message.contains("sorted")));
    }

    #[test]
    fn drops_duplicates_keeping_first() {
        let samples = vec![
            sample(1, 0, 0, 1.0),
            sample(1, 0, 5, 2.0),
            sample(1, 0, 5, 99.0),
            sample(1, 0, 10, 3.0),
        ];
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert_eq!(series.len(), 3);
        assert_eq!(series.samples()[1].load_kw, 2.0);
        assert!(series.warnings().iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn clamps_negative_load() {
        let samples = vec![sample(1, 0, 0, -5.0), sample(1, 0, 5, 7.0)];
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert_eq!(series.samples()[0].load_kw, 0.0);
        assert!(series.warnings().iter().any(|w| w.message.contains("clamped")));
    }

    #[test]
    fn warns_on_gap() {
        let mut samples: Vec<LoadSample> = (0..6).map(|i| sample(1, 0, i * 5, 1.0)).collect();
        samples.push(sample(1, 2, 0, 1.0));
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert!(series.warnings().iter().any(|w| w.message.contains("gap")));
    }

    #[test]
    fn step_hours_uses_per_step_delta() {
        let samples = vec![
            sample(1, 0, 0, 1.0),
            sample(1, 0, 5, 1.0),
            sample(1, 0, 12, 1.0),
        ];
        let series = LoadSeries::from_samples(samples, Vec::new());
        assert!((series.step_hours(0) - 5.0 / 60.0).abs() < 1e-9);
        assert!((series.step_hours(1) - 7.0 / 60.0).abs() < 1e-9);
        // Final step falls back to the nominal interval.
        assert!((series.step_hours(2) - series.interval_hours()).abs() < 1e-9);
    }

    #[test]
    fn synthetic_profile_is_deterministic() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = SyntheticProfile::new(8000.0, 1200.0, 0.0, 50.0, 42).generate(start, 1, 5);
        let b = SyntheticProfile::new(8000.0, 1200.0, 0.0, 50.0, 42).generate(start, 1, 5);
        assert_eq!(a.len(), 288);
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert_eq!(x.load_kw, y.load_kw);
        }
    }

    #[test]
    fn synthetic_profile_is_non_negative() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = SyntheticProfile::new(10.0, 50.0, 0.0, 5.0, 7).generate(start, 1, 30);
        assert!(series.samples().iter().all(|s| s.load_kw >= 0.0));
    }

    #[test]
    fn decimal_hour_includes_minutes() {
        assert!((decimal_hour(ts(1, 14, 30)) - 14.5).abs() < 1e-9);
    }
}
