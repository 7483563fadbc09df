//! Post-hoc financial aggregation from simulation records.

use std::fmt;

use crate::tariff::{TariffPeriod, TariffSchedule};

use super::types::StepRecord;

/// Shortfall below this threshold is treated as numerical noise.
const SHORTFALL_EPSILON_KW: f64 = 1e-6;

/// Billing-month length used to scale per-day savings, matching the
/// utility's flat-month convention.
const DAYS_PER_MONTH: f64 = 30.0;

/// Capital payback horizon.
///
/// Annual savings of zero or less never recover the investment; the
/// sentinel keeps raw infinities and NaNs out of every downstream
/// consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payback {
    Years(f64),
    NotRecoverable,
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(y) => write!(f, "{y:.1} years"),
            Payback::NotRecoverable => write!(f, "not recoverable"),
        }
    }
}

/// Return on investment as an annual fraction of CAPEX.
///
/// Undefined when CAPEX is zero; the sentinel replaces a division by
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Roi {
    Fraction(f64),
    Undefined,
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Roi::Fraction(r) => write!(f, "{:.1}%", r * 100.0),
            Roi::Undefined => write!(f, "undefined"),
        }
    }
}

/// Aggregate demand, energy, and financial metrics for a complete run.
///
/// Computed post-hoc from the full record vector so step data and
/// reported metrics cannot drift apart.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Maximum demand without PV or battery (kW).
    pub md_before_kw: f64,
    /// Maximum demand with PV but before battery dispatch (kW).
    pub md_with_pv_kw: f64,
    /// Maximum grid import after PV and battery (kW).
    pub md_after_kw: f64,
    /// Total demand reduction, clamped non-negative (kW).
    pub md_reduction_kw: f64,
    /// Share of the reduction attributable to PV (kW).
    pub pv_contribution_kw: f64,
    /// Share of the reduction attributable to battery dispatch (kW).
    pub ems_contribution_kw: f64,
    /// Battery energy discharged inside the peak window (kWh).
    pub peak_discharge_kwh: f64,
    /// Battery energy discharged off-peak (kWh).
    pub offpeak_discharge_kwh: f64,
    /// Total battery discharge energy (kWh).
    pub total_discharge_kwh: f64,
    /// PV energy consumed directly by the load (kWh).
    pub pv_self_consumption_kwh: f64,
    /// PV surplus neither used nor stored (kWh).
    pub pv_curtailed_kwh: f64,
    /// Calendar days spanned by the run.
    pub simulation_days: f64,
    pub monthly_md_savings_rm: f64,
    pub monthly_peak_discharge_savings_rm: f64,
    pub monthly_offpeak_discharge_savings_rm: f64,
    /// Value of PV self-consumption; reported but excluded from the
    /// savings total used for payback/ROI.
    pub monthly_pv_savings_rm: f64,
    /// MD + peak + off-peak discharge savings per month.
    pub monthly_savings_rm: f64,
    pub annual_savings_rm: f64,
    pub capex_rm: f64,
    pub payback: Payback,
    pub roi: Roi,
    /// Steps on which grid import exceeded the demand target.
    pub shortfall_steps: usize,
    /// Worst observed excess over the demand target (kW).
    pub max_shortfall_kw: f64,
    /// Equivalent full battery cycles over the run.
    pub equivalent_cycles: f64,
    /// Battery state of health at the end of the run.
    pub final_soh: f64,
}

impl Summary {
    /// Computes the summary from the complete record vector.
    ///
    /// # Arguments
    ///
    /// * `records` - Complete simulation step records
    /// * `tariff` - The shared tariff schedule used during dispatch
    /// * `battery_capacity_kwh` - Rated capacity for cycle accounting
    /// * `capex_rm` - Installed system cost
    /// * `md_charge_rm_per_kw_month` - Utility maximum-demand charge
    pub fn from_records(
        records: &[StepRecord],
        tariff: &TariffSchedule,
        battery_capacity_kwh: f64,
        capex_rm: f64,
        md_charge_rm_per_kw_month: f64,
    ) -> Self {
        if records.is_empty() {
            return Self::empty(capex_rm);
        }

        let mut md_before = 0.0_f64;
        let mut md_with_pv = 0.0_f64;
        let mut md_after = 0.0_f64;
        let mut peak_kwh = 0.0_f64;
        let mut offpeak_kwh = 0.0_f64;
        let mut pv_self_kwh = 0.0_f64;
        let mut pv_curtailed_kwh = 0.0_f64;
        let mut shortfall_steps = 0_usize;
        let mut max_shortfall = 0.0_f64;

        for r in records {
            md_before = md_before.max(r.load_kw);
            md_with_pv = md_with_pv.max((r.load_kw - r.pv_kw).max(0.0));
            md_after = md_after.max(r.grid_kw);

            if r.battery_kw > 0.0 {
                let energy = r.battery_kw * r.dt_hours;
                match tariff.classify(r.timestamp) {
                    TariffPeriod::Peak => peak_kwh += energy,
                    TariffPeriod::OffPeak => offpeak_kwh += energy,
                }
            }

            pv_self_kwh += r.pv_to_load_kw * r.dt_hours;
            pv_curtailed_kwh += r.pv_curtailed_kw * r.dt_hours;

            if r.shortfall_kw > SHORTFALL_EPSILON_KW {
                shortfall_steps += 1;
                max_shortfall = max_shortfall.max(r.shortfall_kw);
            }
        }

        let total_discharge_kwh = peak_kwh + offpeak_kwh;
        let md_reduction = (md_before - md_after).max(0.0);
        let pv_contribution = (md_before - md_with_pv).max(0.0);
        let ems_contribution = (md_with_pv - md_after).max(0.0);

        let first = records[0].timestamp;
        let last = records[records.len() - 1].timestamp;
        let span_days = ((last - first).num_seconds() as f64 / 86_400.0).floor() + 1.0;

        let monthly_md_savings = md_reduction * md_charge_rm_per_kw_month;
        let monthly_peak_savings =
            peak_kwh / span_days * tariff.rate_for(TariffPeriod::Peak) * DAYS_PER_MONTH;
        let monthly_offpeak_savings =
            offpeak_kwh / span_days * tariff.rate_for(TariffPeriod::OffPeak) * DAYS_PER_MONTH;
        let monthly_pv_savings =
            pv_self_kwh / span_days * tariff.rate_for(TariffPeriod::Peak) * DAYS_PER_MONTH;

        // PV self-consumption value is reported but kept out of the
        // recoverable total: the storage investment is judged on what the
        // battery itself earns.
        let monthly_savings = monthly_md_savings + monthly_peak_savings + monthly_offpeak_savings;
        let annual_savings = monthly_savings * 12.0;

        let payback = if annual_savings > 0.0 {
            Payback::Years(capex_rm / annual_savings)
        } else {
            Payback::NotRecoverable
        };
        let roi = if capex_rm > 0.0 {
            Roi::Fraction(annual_savings / capex_rm)
        } else {
            Roi::Undefined
        };

        let equivalent_cycles = if battery_capacity_kwh > 0.0 {
            total_discharge_kwh / battery_capacity_kwh
        } else {
            0.0
        };

        Self {
            md_before_kw: md_before,
            md_with_pv_kw: md_with_pv,
            md_after_kw: md_after,
            md_reduction_kw: md_reduction,
            pv_contribution_kw: pv_contribution,
            ems_contribution_kw: ems_contribution,
            peak_discharge_kwh: peak_kwh,
            offpeak_discharge_kwh: offpeak_kwh,
            total_discharge_kwh,
            pv_self_consumption_kwh: pv_self_kwh,
            pv_curtailed_kwh,
            simulation_days: span_days,
            monthly_md_savings_rm: monthly_md_savings,
            monthly_peak_discharge_savings_rm: monthly_peak_savings,
            monthly_offpeak_discharge_savings_rm: monthly_offpeak_savings,
            monthly_pv_savings_rm: monthly_pv_savings,
            monthly_savings_rm: monthly_savings,
            annual_savings_rm: annual_savings,
            capex_rm,
            payback,
            roi,
            shortfall_steps,
            max_shortfall_kw: max_shortfall,
            equivalent_cycles,
            final_soh: records[records.len() - 1].soh,
        }
    }

    fn empty(capex_rm: f64) -> Self {
        Self {
            md_before_kw: 0.0,
            md_with_pv_kw: 0.0,
            md_after_kw: 0.0,
            md_reduction_kw: 0.0,
            pv_contribution_kw: 0.0,
            ems_contribution_kw: 0.0,
            peak_discharge_kwh: 0.0,
            offpeak_discharge_kwh: 0.0,
            total_discharge_kwh: 0.0,
            pv_self_consumption_kwh: 0.0,
            pv_curtailed_kwh: 0.0,
            simulation_days: 0.0,
            monthly_md_savings_rm: 0.0,
            monthly_peak_discharge_savings_rm: 0.0,
            monthly_offpeak_discharge_savings_rm: 0.0,
            monthly_pv_savings_rm: 0.0,
            monthly_savings_rm: 0.0,
            annual_savings_rm: 0.0,
            capex_rm,
            payback: Payback::NotRecoverable,
            roi: if capex_rm > 0.0 {
                Roi::Fraction(0.0)
            } else {
                Roi::Undefined
            },
            shortfall_steps: 0,
            max_shortfall_kw: 0.0,
            equivalent_cycles: 0.0,
            final_soh: 1.0,
        }
    }

    /// Flat key→value listing of every metric, for tabular export.
    pub fn key_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("md_before_kw", format!("{:.2}", self.md_before_kw)),
            ("md_with_pv_kw", format!("{:.2}", self.md_with_pv_kw)),
            ("md_after_kw", format!("{:.2}", self.md_after_kw)),
            ("md_reduction_kw", format!("{:.2}", self.md_reduction_kw)),
            ("pv_contribution_kw", format!("{:.2}", self.pv_contribution_kw)),
            ("ems_contribution_kw", format!("{:.2}", self.ems_contribution_kw)),
            ("peak_discharge_kwh", format!("{:.2}", self.peak_discharge_kwh)),
            (
                "offpeak_discharge_kwh",
                format!("{:.2}", self.offpeak_discharge_kwh),
            ),
            ("total_discharge_kwh", format!("{:.2}", self.total_discharge_kwh)),
            (
                "pv_self_consumption_kwh",
                format!("{:.2}", self.pv_self_consumption_kwh),
            ),
            ("pv_curtailed_kwh", format!("{:.2}", self.pv_curtailed_kwh)),
            ("simulation_days", format!("{:.0}", self.simulation_days)),
            ("monthly_md_savings_rm", format!("{:.2}", self.monthly_md_savings_rm)),
            (
                "monthly_peak_discharge_savings_rm",
                format!("{:.2}", self.monthly_peak_discharge_savings_rm),
            ),
            (
                "monthly_offpeak_discharge_savings_rm",
                format!("{:.2}", self.monthly_offpeak_discharge_savings_rm),
            ),
            ("monthly_pv_savings_rm", format!("{:.2}", self.monthly_pv_savings_rm)),
            ("monthly_savings_rm", format!("{:.2}", self.monthly_savings_rm)),
            ("annual_savings_rm", format!("{:.2}", self.annual_savings_rm)),
            ("capex_rm", format!("{:.2}", self.capex_rm)),
            ("payback", self.payback.to_string()),
            ("roi", self.roi.to_string()),
            ("shortfall_steps", self.shortfall_steps.to_string()),
            ("max_shortfall_kw", format!("{:.2}", self.max_shortfall_kw)),
            ("equivalent_cycles", format!("{:.3}", self.equivalent_cycles)),
            ("final_soh", format!("{:.4}", self.final_soh)),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Simulation Summary ---")?;
        writeln!(
            f,
            "MD before / with PV / after:  {:.1} / {:.1} / {:.1} kW",
            self.md_before_kw, self.md_with_pv_kw, self.md_after_kw
        )?;
        writeln!(
            f,
            "MD reduction:                 {:.1} kW (PV {:.1}, battery {:.1})",
            self.md_reduction_kw, self.pv_contribution_kw, self.ems_contribution_kw
        )?;
        writeln!(
            f,
            "Discharge energy:             {:.1} kWh ({:.1} peak, {:.1} off-peak)",
            self.total_discharge_kwh, self.peak_discharge_kwh, self.offpeak_discharge_kwh
        )?;
        writeln!(
            f,
            "PV self-consumption:          {:.1} kWh ({:.1} kWh curtailed)",
            self.pv_self_consumption_kwh, self.pv_curtailed_kwh
        )?;
        writeln!(
            f,
            "Monthly savings:              RM {:.2} (MD {:.2}, peak {:.2}, off-peak {:.2})",
            self.monthly_savings_rm,
            self.monthly_md_savings_rm,
            self.monthly_peak_discharge_savings_rm,
            self.monthly_offpeak_discharge_savings_rm
        )?;
        writeln!(
            f,
            "Annual savings:               RM {:.2}",
            self.annual_savings_rm
        )?;
        writeln!(f, "Payback:                      {}", self.payback)?;
        writeln!(f, "Annual ROI:                   {}", self.roi)?;
        writeln!(
            f,
            "Target shortfall:             {} step(s), worst {:.1} kW",
            self.shortfall_steps, self.max_shortfall_kw
        )?;
        write!(
            f,
            "Battery:                      {:.3} equivalent cycles, final SoH {:.2}%",
            self.equivalent_cycles,
            self.final_soh * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::DispatchMode;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

    fn tariff() -> TariffSchedule {
        TariffSchedule::new(14.0, 22.0, WEEKDAYS, 0.31, 0.27)
    }

    fn ts(h: u32, min: u32) -> NaiveDateTime {
        // 2024-01-03 is a Wednesday.
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn record(timestamp: NaiveDateTime, load_kw: f64, battery_kw: f64, grid_kw: f64) -> StepRecord {
        StepRecord {
            timestamp,
            load_kw,
            pv_kw: 0.0,
            battery_kw,
            grid_kw,
            pv_to_load_kw: 0.0,
            pv_to_battery_kw: 0.0,
            pv_curtailed_kw: 0.0,
            soe_kwh: 500.0,
            soh: 0.999,
            mode: if battery_kw > 0.0 {
                DispatchMode::Discharge
            } else {
                DispatchMode::Idle
            },
            shortfall_kw: 0.0,
            dt_hours: 1.0,
        }
    }

    #[test]
    fn md_values_and_reduction() {
        let records = vec![
            record(ts(10, 0), 7000.0, 0.0, 7000.0),
            record(ts(18, 0), 8000.0, 500.0, 7500.0),
            record(ts(20, 0), 7800.0, 300.0, 7500.0),
        ];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 1_000_000.0, 97.0);
        assert_eq!(s.md_before_kw, 8000.0);
        assert_eq!(s.md_after_kw, 7500.0);
        assert_eq!(s.md_reduction_kw, 500.0);
        assert_eq!(s.monthly_md_savings_rm, 500.0 * 97.0);
    }

    #[test]
    fn discharge_split_by_tariff_band() {
        let records = vec![
            record(ts(18, 0), 8000.0, 500.0, 7500.0), // peak
            record(ts(23, 0), 6000.0, 200.0, 5800.0), // off-peak
        ];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 0.0, 97.0);
        assert!((s.peak_discharge_kwh - 500.0).abs() < 1e-9);
        assert!((s.offpeak_discharge_kwh - 200.0).abs() < 1e-9);
        assert!(
            (s.peak_discharge_kwh + s.offpeak_discharge_kwh - s.total_discharge_kwh).abs() < 1e-9
        );
    }

    #[test]
    fn weekend_discharge_counts_offpeak() {
        // 2024-01-06 is a Saturday afternoon.
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let records = vec![record(saturday, 8000.0, 500.0, 7500.0)];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 0.0, 97.0);
        assert_eq!(s.peak_discharge_kwh, 0.0);
        assert!((s.offpeak_discharge_kwh - 500.0).abs() < 1e-9);
    }

    #[test]
    fn zero_capex_reports_undefined_roi() {
        let records = vec![record(ts(18, 0), 8000.0, 500.0, 7500.0)];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 0.0, 97.0);
        assert_eq!(s.roi, Roi::Undefined);
        // Zero cost is paid back immediately.
        assert_eq!(s.payback, Payback::Years(0.0));
    }

    #[test]
    fn zero_savings_reports_not_recoverable() {
        let records = vec![record(ts(10, 0), 5000.0, 0.0, 5000.0)];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 1_000_000.0, 97.0);
        assert_eq!(s.payback, Payback::NotRecoverable);
        assert_eq!(s.roi, Roi::Fraction(0.0));
    }

    #[test]
    fn empty_records_yield_sentinels_not_nan() {
        let s = Summary::from_records(&[], &tariff(), 1000.0, 0.0, 97.0);
        assert_eq!(s.payback, Payback::NotRecoverable);
        assert_eq!(s.roi, Roi::Undefined);
        assert_eq!(s.annual_savings_rm, 0.0);
    }

    #[test]
    fn shortfall_steps_counted() {
        let mut r1 = record(ts(18, 0), 8000.0, 0.0, 8000.0);
        r1.shortfall_kw = 500.0;
        let r2 = record(ts(19, 0), 7000.0, 0.0, 7000.0);
        let s = Summary::from_records(&[r1, r2], &tariff(), 1000.0, 0.0, 97.0);
        assert_eq!(s.shortfall_steps, 1);
        assert_eq!(s.max_shortfall_kw, 500.0);
    }

    #[test]
    fn span_days_counts_calendar_days() {
        let day1 = ts(0, 0);
        let records: Vec<StepRecord> = (0..48)
            .map(|i| record(day1 + Duration::hours(i), 5000.0, 0.0, 5000.0))
            .collect();
        let s = Summary::from_records(&records, &tariff(), 1000.0, 0.0, 97.0);
        assert_eq!(s.simulation_days, 2.0);
    }

    #[test]
    fn monthly_energy_savings_scale_with_rates() {
        // One day, 100 kWh peak discharge: daily 31 RM, monthly 930 RM.
        let records = vec![record(ts(18, 0), 8000.0, 100.0, 7900.0)];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 0.0, 0.0);
        assert!((s.monthly_peak_discharge_savings_rm - 100.0 * 0.31 * 30.0).abs() < 1e-6);
        assert!((s.annual_savings_rm - s.monthly_savings_rm * 12.0).abs() < 1e-9);
    }

    #[test]
    fn pv_savings_excluded_from_roi_total() {
        let mut r = record(ts(12, 0), 5000.0, 0.0, 4000.0);
        r.pv_kw = 1000.0;
        r.pv_to_load_kw = 1000.0;
        let s = Summary::from_records(&[r], &tariff(), 1000.0, 100_000.0, 0.0);
        assert!(s.monthly_pv_savings_rm > 0.0);
        assert_eq!(s.monthly_savings_rm, 0.0);
        assert_eq!(s.payback, Payback::NotRecoverable);
    }

    #[test]
    fn key_values_cover_headline_metrics() {
        let records = vec![record(ts(18, 0), 8000.0, 500.0, 7500.0)];
        let s = Summary::from_records(&records, &tariff(), 1000.0, 1_000_000.0, 97.0);
        let kv = s.key_values();
        for key in [
            "md_before_kw",
            "md_after_kw",
            "peak_discharge_kwh",
            "payback",
            "roi",
            "final_soh",
        ] {
            assert!(kv.iter().any(|(k, _)| *k == key), "missing key {key}");
        }
    }
}
