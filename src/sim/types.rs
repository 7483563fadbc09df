//! Core simulation types: step inputs, dispatch commands, and the
//! per-sample output record.

use std::fmt;

use chrono::NaiveDateTime;

/// What the battery did during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Serving load to hold grid import down.
    Discharge,
    /// Absorbing PV surplus or scheduled grid energy.
    Charge,
    /// No battery action.
    Idle,
}

impl DispatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchMode::Discharge => "discharge",
            DispatchMode::Charge => "charge",
            DispatchMode::Idle => "idle",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step readings fed to a dispatch policy.
#[derive(Debug, Clone)]
pub struct StepInput {
    pub timestamp: NaiveDateTime,
    /// Facility demand (kW, >= 0).
    pub load_kw: f64,
    /// PV generation (kW, >= 0).
    pub pv_kw: f64,
    /// `load_kw - pv_kw`; negative means PV surplus.
    pub net_load_kw: f64,
    /// Duration this sample covers in hours.
    pub dt_hours: f64,
}

/// Battery constraints visible to a dispatch policy.
#[derive(Debug, Clone)]
pub struct BatteryView {
    pub soe_kwh: f64,
    pub usable_capacity_kwh: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
}

/// A policy's decision for one step.
#[derive(Debug, Clone, Copy)]
pub struct BatteryCommand {
    /// Signed power request (kW; positive=discharge, negative=charge).
    pub power_kw: f64,
    /// Whether charging may draw from the grid; when `false` charging is
    /// limited to PV surplus.
    pub grid_charge: bool,
}

impl BatteryCommand {
    pub fn idle() -> Self {
        Self {
            power_kw: 0.0,
            grid_charge: false,
        }
    }

    pub fn discharge(kw: f64) -> Self {
        Self {
            power_kw: kw.max(0.0),
            grid_charge: false,
        }
    }

    /// Charge from PV surplus only.
    pub fn charge_from_pv(kw: f64) -> Self {
        Self {
            power_kw: -kw.max(0.0),
            grid_charge: false,
        }
    }

    /// Charge, drawing from the grid once PV surplus is exhausted.
    pub fn charge_from_grid(kw: f64) -> Self {
        Self {
            power_kw: -kw.max(0.0),
            grid_charge: true,
        }
    }
}

/// Complete record of one simulation step, one per input sample.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub timestamp: NaiveDateTime,
    /// Facility demand (kW).
    pub load_kw: f64,
    /// PV generation (kW).
    pub pv_kw: f64,
    /// Battery power (kW; positive=discharge, negative=charge).
    pub battery_kw: f64,
    /// Grid import (kW, >= 0; no export is modeled).
    pub grid_kw: f64,
    /// PV directly offsetting load (kW).
    pub pv_to_load_kw: f64,
    /// PV surplus absorbed by the battery (kW).
    pub pv_to_battery_kw: f64,
    /// PV surplus neither used nor stored (kW).
    pub pv_curtailed_kw: f64,
    /// Battery state of energy after this step (kWh).
    pub soe_kwh: f64,
    /// Battery state of health after this step (fraction).
    pub soh: f64,
    /// Dispatch mode realized this step.
    pub mode: DispatchMode,
    /// Grid import above the demand target when the target was
    /// unreachable (kW, >= 0).
    pub shortfall_kw: f64,
    /// Duration this sample covers in hours.
    pub dt_hours: f64,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | load={:>8.1} kW  pv={:>7.1} kW  bat={:>+8.1} kW \
             (SoE={:.0} kWh, SoH={:.2}%) | grid={:>8.1} kW  mode={:<9} \
             shortfall={:.1} kW",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.load_kw,
            self.pv_kw,
            self.battery_kw,
            self.soe_kwh,
            self.soh * 100.0,
            self.grid_kw,
            self.mode.as_str(),
            self.shortfall_kw,
        )
    }
}
