//! Simulation engine: the sequential per-sample loop tying load, PV,
//! policy, and battery together.

use crate::devices::{Battery, PvArray};
use crate::profile::{LoadSample, LoadSeries};

use super::dispatch::DispatchPolicy;
use super::types::{BatteryCommand, BatteryView, DispatchMode, StepInput, StepRecord};

/// Simulation engine owning the PV model, the battery state, and the
/// dispatch policy for one run.
///
/// Generic over `P: DispatchPolicy` for static dispatch. Each run owns
/// its own `Battery`, so independent engines can execute concurrently
/// (e.g. a target-MD sensitivity sweep) with no shared state.
///
/// Power balance per step, all in kW:
/// `grid = load - pv_to_load - discharge + grid_charge`, clamped at 0.
/// No export is modeled: PV surplus is stored or curtailed, never fed
/// back.
pub struct Engine<P: DispatchPolicy> {
    pv: PvArray,
    battery: Battery,
    policy: P,
    /// Demand ceiling used for shortfall accounting; `None` for policies
    /// without a grid-import target.
    target_md_kw: Option<f64>,
}

impl<P: DispatchPolicy> Engine<P> {
    pub fn new(pv: PvArray, battery: Battery, policy: P, target_md_kw: Option<f64>) -> Self {
        Self {
            pv,
            battery,
            policy,
            target_md_kw,
        }
    }

    /// Executes one step and returns its record.
    ///
    /// Out-of-range inputs are clamped, never fatal: a negative load reads
    /// as 0 and a non-finite load as 0, so one bad sample cannot abort a
    /// long run.
    pub fn step(&mut self, sample: &LoadSample, dt_hours: f64) -> StepRecord {
        let load_kw = if sample.load_kw.is_finite() {
            sample.load_kw.max(0.0)
        } else {
            0.0
        };
        let pv_kw = self.pv.power_kw(sample.timestamp);
        let net_load_kw = load_kw - pv_kw;

        let input = StepInput {
            timestamp: sample.timestamp,
            load_kw,
            pv_kw,
            net_load_kw,
            dt_hours,
        };
        let view = BatteryView {
            soe_kwh: self.battery.soe_kwh(),
            usable_capacity_kwh: self.battery.usable_capacity_kwh(),
            max_charge_kw: self.battery.max_charge_kw(),
            max_discharge_kw: self.battery.max_discharge_kw(),
        };
        let command = self.policy.dispatch(&input, &view);

        let pv_to_load_kw = load_kw.min(pv_kw);
        let residual_load_kw = (load_kw - pv_to_load_kw).max(0.0);
        let surplus_kw = (pv_kw - pv_to_load_kw).max(0.0);

        let (battery_kw, mode, pv_to_battery_kw, grid_kw) =
            self.apply_command(command, residual_load_kw, surplus_kw, dt_hours);

        let pv_curtailed_kw = (surplus_kw - pv_to_battery_kw).max(0.0);
        let shortfall_kw = match self.target_md_kw {
            Some(target) => (grid_kw - target).max(0.0),
            None => 0.0,
        };

        StepRecord {
            timestamp: sample.timestamp,
            load_kw,
            pv_kw,
            battery_kw,
            grid_kw,
            pv_to_load_kw,
            pv_to_battery_kw,
            pv_curtailed_kw,
            soe_kwh: self.battery.soe_kwh(),
            soh: self.battery.soh(),
            mode,
            shortfall_kw,
            dt_hours,
        }
    }

    /// Realizes a policy command against the battery and splits the power
    /// flows. Returns `(battery_kw, mode, pv_to_battery_kw, grid_kw)`.
    fn apply_command(
        &mut self,
        command: BatteryCommand,
        residual_load_kw: f64,
        surplus_kw: f64,
        dt_hours: f64,
    ) -> (f64, DispatchMode, f64, f64) {
        if command.power_kw > 0.0 {
            // No-export rule: discharge never exceeds the load left after PV.
            let request_kw = command.power_kw.min(residual_load_kw);
            let actual_kw = self.battery.apply_kw(request_kw, dt_hours);
            let mode = if actual_kw > 0.0 {
                DispatchMode::Discharge
            } else {
                DispatchMode::Idle
            };
            let grid_kw = (residual_load_kw - actual_kw).max(0.0);
            (actual_kw, mode, 0.0, grid_kw)
        } else if command.power_kw < 0.0 {
            let requested_kw = -command.power_kw;
            let allowed_kw = if command.grid_charge {
                requested_kw
            } else {
                requested_kw.min(surplus_kw)
            };
            let actual_kw = self.battery.apply_kw(-allowed_kw, dt_hours);
            let charge_kw = -actual_kw;
            let mode = if charge_kw > 0.0 {
                DispatchMode::Charge
            } else {
                DispatchMode::Idle
            };
            let pv_to_battery_kw = charge_kw.min(surplus_kw);
            let grid_charge_kw = (charge_kw - pv_to_battery_kw).max(0.0);
            (
                actual_kw,
                mode,
                pv_to_battery_kw,
                residual_load_kw + grid_charge_kw,
            )
        } else {
            (0.0, DispatchMode::Idle, 0.0, residual_load_kw)
        }
    }

    /// Runs the full series and returns one record per sample.
    pub fn run(&mut self, series: &LoadSeries) -> Vec<StepRecord> {
        let samples = series.samples();
        let mut records = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            let dt_hours = series.step_hours(i);
            records.push(self.step(sample, dt_hours));
        }
        records
    }

    /// Returns a reference to the battery (for summary capacity queries).
    pub fn battery(&self) -> &Battery {
        &self.battery
    }
}
