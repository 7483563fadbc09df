//! Dispatch policies deciding battery action once per sample.

use crate::profile::decimal_hour;
use crate::tariff::in_window;

use super::types::{BatteryCommand, BatteryView, StepInput};

/// The seam between the engine loop and the dispatch rule.
///
/// The engine calls this once per sample; implementations must be pure
/// per step (all state lives in the battery and the inputs) so a run
/// stays deterministic. A rolling-horizon optimizer would slot in here
/// without touching the engine.
pub trait DispatchPolicy {
    fn dispatch(&self, input: &StepInput, battery: &BatteryView) -> BatteryCommand;
}

/// Greedy demand-threshold rule, the default policy.
///
/// Discharges the minimum needed to cap net load at the target maximum
/// demand, charges opportunistically from PV surplus, and otherwise
/// idles. No look-ahead: SoE is preserved for later peaks only insofar
/// as nothing is discharged below the target.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    /// Grid-import ceiling the battery defends (kW).
    pub target_md_kw: f64,
}

impl ThresholdPolicy {
    /// # Panics
    ///
    /// Panics if `target_md_kw <= 0`. Scenario validation reports this as
    /// a configuration error first.
    pub fn new(target_md_kw: f64) -> Self {
        assert!(target_md_kw > 0.0);
        Self { target_md_kw }
    }
}

impl DispatchPolicy for ThresholdPolicy {
    fn dispatch(&self, input: &StepInput, battery: &BatteryView) -> BatteryCommand {
        let net = input.net_load_kw;

        if net > self.target_md_kw && battery.soe_kwh > 0.0 {
            let deficit = net - self.target_md_kw;
            let by_soe = if input.dt_hours > 0.0 {
                battery.soe_kwh / input.dt_hours
            } else {
                0.0
            };
            return BatteryCommand::discharge(deficit.min(battery.max_discharge_kw).min(by_soe));
        }

        if net < 0.0 && battery.soe_kwh < battery.usable_capacity_kwh {
            let surplus = -net;
            let headroom = battery.usable_capacity_kwh - battery.soe_kwh;
            let by_soe = if input.dt_hours > 0.0 {
                headroom / input.dt_hours
            } else {
                0.0
            };
            return BatteryCommand::charge_from_pv(
                surplus.min(battery.max_charge_kw).min(by_soe),
            );
        }

        BatteryCommand::idle()
    }
}

/// Schedule-based time-of-use policy.
///
/// Discharges at full available power inside the discharge window down to
/// a minimum SoE, and recharges inside the charge window (grid charging
/// permitted) up to a maximum SoE. Discharge takes precedence when the
/// windows overlap. Windows are decimal-hour ranges and may wrap
/// midnight.
#[derive(Debug, Clone)]
pub struct TouPolicy {
    /// Charge window `[start, end)` in decimal hours.
    pub charge_window: (f64, f64),
    /// Discharge window `[start, end)` in decimal hours.
    pub discharge_window: (f64, f64),
    /// SoE fraction the policy will not discharge below.
    pub min_soe_fraction: f64,
    /// SoE fraction the policy will not charge above.
    pub max_soe_fraction: f64,
}

impl TouPolicy {
    /// # Panics
    ///
    /// Panics if the SoE band is inverted or outside `[0, 1]`. Scenario
    /// validation reports these as configuration errors first.
    pub fn new(
        charge_window: (f64, f64),
        discharge_window: (f64, f64),
        min_soe_fraction: f64,
        max_soe_fraction: f64,
    ) -> Self {
        assert!((0.0..=1.0).contains(&min_soe_fraction));
        assert!((0.0..=1.0).contains(&max_soe_fraction));
        assert!(min_soe_fraction <= max_soe_fraction);

        Self {
            charge_window,
            discharge_window,
            min_soe_fraction,
            max_soe_fraction,
        }
    }

    fn in_discharge_window(&self, hour: f64) -> bool {
        in_window(hour, self.discharge_window.0, self.discharge_window.1)
    }

    fn in_charge_window(&self, hour: f64) -> bool {
        in_window(hour, self.charge_window.0, self.charge_window.1)
    }
}

impl DispatchPolicy for TouPolicy {
    fn dispatch(&self, input: &StepInput, battery: &BatteryView) -> BatteryCommand {
        if input.dt_hours <= 0.0 {
            return BatteryCommand::idle();
        }
        let hour = decimal_hour(input.timestamp);

        if self.in_discharge_window(hour) {
            let floor_kwh = self.min_soe_fraction * battery.usable_capacity_kwh;
            let available_kwh = (battery.soe_kwh - floor_kwh).max(0.0);
            let kw = battery
                .max_discharge_kw
                .min(available_kwh / input.dt_hours);
            if kw > 0.0 {
                return BatteryCommand::discharge(kw);
            }
            return BatteryCommand::idle();
        }

        if self.in_charge_window(hour) {
            let ceiling_kwh = self.max_soe_fraction * battery.usable_capacity_kwh;
            let missing_kwh = (ceiling_kwh - battery.soe_kwh).max(0.0);
            let kw = battery.max_charge_kw.min(missing_kwh / input.dt_hours);
            if kw > 0.0 {
                return BatteryCommand::charge_from_grid(kw);
            }
        }

        BatteryCommand::idle()
    }
}
