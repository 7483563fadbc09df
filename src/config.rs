//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `industrial` preset. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::industrial`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Synthetic load profile, used when no measured CSV is supplied.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Solar PV array parameters.
    #[serde(default)]
    pub pv: PvConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Dispatch policy selection and parameters.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Peak window and energy rates.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Investment and demand-charge parameters.
    #[serde(default)]
    pub financial: FinancialConfig,
}

/// Synthetic load-profile parameters (demo fallback for a measured CSV).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Baseline demand (kW).
    pub base_kw: f64,
    /// Daily sinusoidal swing amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset of the swing (radians).
    pub phase_rad: f64,
    /// Additive Gaussian noise standard deviation (kW).
    pub noise_std_kw: f64,
    /// First simulated day (midnight start).
    pub start_date: NaiveDate,
    /// Number of days to generate (must be > 0).
    pub days: u32,
    /// Sampling interval in minutes (must be > 0).
    pub interval_minutes: u32,
    /// Noise seed for reproducibility.
    pub seed: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_kw: 6800.0,
            amp_kw: 1600.0,
            phase_rad: -2.356,
            noise_std_kw: 150.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 7,
            interval_minutes: 5,
            seed: 42,
        }
    }
}

/// Solar PV array parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvConfig {
    /// Nameplate DC capacity (kWp).
    pub capacity_kwp: f64,
    /// Fractional system loss (0.0–1.0).
    pub system_loss: f64,
    /// AC inverter capacity (kW); defaults to the nameplate capacity.
    pub inverter_capacity_kw: Option<f64>,
    /// Sunrise in decimal hours.
    pub sunrise_hour: f64,
    /// Sunset in decimal hours.
    pub sunset_hour: f64,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            capacity_kwp: 9109.1,
            system_loss: 0.14,
            inverter_capacity_kw: None,
            sunrise_hour: 6.5,
            sunset_hour: 19.0,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Rated energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// Maximum charging power (kW); defaults to `max_discharge_kw`.
    pub max_charge_kw: Option<f64>,
    /// Initial state of energy (0.0–1.0).
    pub initial_soe_fraction: f64,
    /// Round-trip efficiency applied on charge (0.0–1.0).
    pub roundtrip_efficiency: f64,
    /// SoH fraction lost per equivalent full cycle.
    pub soh_fade_per_cycle: f64,
    /// SoH never degrades below this fraction.
    pub soh_floor: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_mwh: 7.5,
            max_discharge_kw: 2000.0,
            max_charge_kw: None,
            initial_soe_fraction: 0.6,
            roundtrip_efficiency: 0.90,
            soh_fade_per_cycle: 2.5e-5,
            soh_floor: 0.80,
        }
    }
}

/// Dispatch policy selection and parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Policy: `"threshold"` or `"time_of_use"`.
    pub policy: String,
    /// Grid-import ceiling defended by the threshold policy (kW).
    pub target_md_kw: f64,
    /// Time-of-use charge window start (decimal hours).
    pub charge_start_hour: f64,
    /// Time-of-use charge window end (decimal hours).
    pub charge_end_hour: f64,
    /// Time-of-use discharge window start (decimal hours).
    pub discharge_start_hour: f64,
    /// Time-of-use discharge window end (decimal hours).
    pub discharge_end_hour: f64,
    /// Time-of-use policy will not discharge below this SoE fraction.
    pub min_soe_fraction: f64,
    /// Time-of-use policy will not charge above this SoE fraction.
    pub max_soe_fraction: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            policy: "threshold".to_string(),
            target_md_kw: 6500.0,
            charge_start_hour: 0.0,
            charge_end_hour: 6.0,
            discharge_start_hour: 18.0,
            discharge_end_hour: 22.0,
            min_soe_fraction: 0.15,
            max_soe_fraction: 0.90,
        }
    }
}

/// Peak window and energy rates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Peak window start (decimal hours).
    pub peak_start_hour: f64,
    /// Peak window end (decimal hours, must be later than the start).
    pub peak_end_hour: f64,
    /// Days the peak window applies, e.g. `["mon", "tue"]`.
    pub peak_days: Vec<String>,
    /// Energy rate inside the peak window (RM/kWh).
    pub peak_rate_rm_per_kwh: f64,
    /// Energy rate outside the peak window (RM/kWh).
    pub offpeak_rate_rm_per_kwh: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            peak_start_hour: 14.0,
            peak_end_hour: 22.0,
            peak_days: ["mon", "tue", "wed", "thu", "fri"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            peak_rate_rm_per_kwh: 0.31,
            offpeak_rate_rm_per_kwh: 0.27,
        }
    }
}

impl TariffConfig {
    /// Weekday mask indexed Monday = 0; unknown day names are ignored
    /// here and reported by [`ScenarioConfig::validate`].
    pub fn peak_day_mask(&self) -> [bool; 7] {
        let mut mask = [false; 7];
        for name in &self.peak_days {
            if let Some(i) = day_index(name) {
                mask[i] = true;
            }
        }
        mask
    }
}

fn day_index(name: &str) -> Option<usize> {
    match name.to_ascii_lowercase().as_str() {
        "mon" => Some(0),
        "tue" => Some(1),
        "wed" => Some(2),
        "thu" => Some(3),
        "fri" => Some(4),
        "sat" => Some(5),
        "sun" => Some(6),
        _ => None,
    }
}

/// Investment and demand-charge parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancialConfig {
    /// Installed system cost (RM).
    pub capex_rm: f64,
    /// Utility maximum-demand charge (RM per kW per month).
    pub md_charge_rm_per_kw_month: f64,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            capex_rm: 4_861_625.0,
            md_charge_rm_per_kw_month: 97.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the industrial-site baseline: a ~9 MWp array, 7.5 MWh /
    /// 2 MW battery and the threshold dispatch policy.
    pub fn industrial() -> Self {
        Self {
            profile: ProfileConfig::default(),
            pv: PvConfig::default(),
            battery: BatteryConfig::default(),
            dispatch: DispatchConfig::default(),
            tariff: TariffConfig::default(),
            financial: FinancialConfig::default(),
        }
    }

    /// Returns the time-of-use preset: schedule-driven overnight charging
    /// and evening discharge instead of demand-threshold shaving.
    pub fn time_of_use() -> Self {
        Self {
            dispatch: DispatchConfig {
                policy: "time_of_use".to_string(),
                ..DispatchConfig::default()
            },
            ..Self::industrial()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["industrial", "time_of_use"];

    /// Valid dispatch policy names.
    pub const POLICIES: &[&str] = &["threshold", "time_of_use"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "industrial" => Ok(Self::industrial()),
            "time_of_use" => Ok(Self::time_of_use()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid. Invalid
    /// values are never silently corrected.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.profile;
        if p.days == 0 {
            errors.push(ConfigError {
                field: "profile.days".into(),
                message: "must be > 0".into(),
            });
        }
        if p.interval_minutes == 0 {
            errors.push(ConfigError {
                field: "profile.interval_minutes".into(),
                message: "must be > 0".into(),
            });
        }
        if p.base_kw < 0.0 || p.amp_kw < 0.0 || p.noise_std_kw < 0.0 {
            errors.push(ConfigError {
                field: "profile".into(),
                message: "base_kw, amp_kw and noise_std_kw must be >= 0".into(),
            });
        }

        let pv = &self.pv;
        if pv.capacity_kwp <= 0.0 {
            errors.push(ConfigError {
                field: "pv.capacity_kwp".into(),
                message: "must be > 0".into(),
            });
        }
        if !(0.0..1.0).contains(&pv.system_loss) {
            errors.push(ConfigError {
                field: "pv.system_loss".into(),
                message: "must be in [0.0, 1.0)".into(),
            });
        }
        if let Some(inv) = pv.inverter_capacity_kw
            && inv <= 0.0
        {
            errors.push(ConfigError {
                field: "pv.inverter_capacity_kw".into(),
                message: "must be > 0 when set".into(),
            });
        }
        if !(0.0..=24.0).contains(&pv.sunrise_hour)
            || !(0.0..=24.0).contains(&pv.sunset_hour)
            || pv.sunrise_hour >= pv.sunset_hour
        {
            errors.push(ConfigError {
                field: "pv.sunrise_hour".into(),
                message: "sunrise and sunset must lie in [0, 24] with sunrise < sunset".into(),
            });
        }

        let b = &self.battery;
        if b.capacity_mwh <= 0.0 {
            errors.push(ConfigError {
                field: "battery.capacity_mwh".into(),
                message: "must be > 0".into(),
            });
        }
        if b.max_discharge_kw <= 0.0 {
            errors.push(ConfigError {
                field: "battery.max_discharge_kw".into(),
                message: "must be > 0".into(),
            });
        }
        if let Some(c) = b.max_charge_kw
            && c <= 0.0
        {
            errors.push(ConfigError {
                field: "battery.max_charge_kw".into(),
                message: "must be > 0 when set".into(),
            });
        }
        if !(0.0..=1.0).contains(&b.initial_soe_fraction) {
            errors.push(ConfigError {
                field: "battery.initial_soe_fraction".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&b.roundtrip_efficiency) || b.roundtrip_efficiency == 0.0 {
            errors.push(ConfigError {
                field: "battery.roundtrip_efficiency".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if b.soh_fade_per_cycle < 0.0 {
            errors.push(ConfigError {
                field: "battery.soh_fade_per_cycle".into(),
                message: "must be >= 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&b.soh_floor) || b.soh_floor == 0.0 {
            errors.push(ConfigError {
                field: "battery.soh_floor".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }

        let d = &self.dispatch;
        if !Self::POLICIES.contains(&d.policy.as_str()) {
            errors.push(ConfigError {
                field: "dispatch.policy".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    Self::POLICIES.join(", "),
                    d.policy
                ),
            });
        }
        if d.target_md_kw <= 0.0 {
            errors.push(ConfigError {
                field: "dispatch.target_md_kw".into(),
                message: "must be > 0".into(),
            });
        }
        for (field, hour) in [
            ("dispatch.charge_start_hour", d.charge_start_hour),
            ("dispatch.charge_end_hour", d.charge_end_hour),
            ("dispatch.discharge_start_hour", d.discharge_start_hour),
            ("dispatch.discharge_end_hour", d.discharge_end_hour),
        ] {
            if !(0.0..=24.0).contains(&hour) {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be in [0, 24]".into(),
                });
            }
        }
        if !(0.0..=1.0).contains(&d.min_soe_fraction)
            || !(0.0..=1.0).contains(&d.max_soe_fraction)
            || d.min_soe_fraction > d.max_soe_fraction
        {
            errors.push(ConfigError {
                field: "dispatch.min_soe_fraction".into(),
                message: "SoE band must lie in [0, 1] with min <= max".into(),
            });
        }

        let t = &self.tariff;
        if !(0.0..=24.0).contains(&t.peak_start_hour)
            || !(0.0..=24.0).contains(&t.peak_end_hour)
            || t.peak_start_hour >= t.peak_end_hour
        {
            errors.push(ConfigError {
                field: "tariff.peak_start_hour".into(),
                message: "peak window must lie in [0, 24] with start < end".into(),
            });
        }
        if t.peak_rate_rm_per_kwh < 0.0 || t.offpeak_rate_rm_per_kwh < 0.0 {
            errors.push(ConfigError {
                field: "tariff.peak_rate_rm_per_kwh".into(),
                message: "rates must be >= 0".into(),
            });
        }
        for name in &t.peak_days {
            if day_index(name).is_none() {
                errors.push(ConfigError {
                    field: "tariff.peak_days".into(),
                    message: format!(
                        "unknown day \"{name}\", expected mon/tue/wed/thu/fri/sat/sun"
                    ),
                });
            }
        }

        let f = &self.financial;
        if f.capex_rm < 0.0 {
            errors.push(ConfigError {
                field: "financial.capex_rm".into(),
                message: "must be >= 0".into(),
            });
        }
        if f.md_charge_rm_per_kw_month < 0.0 {
            errors.push(ConfigError {
                field: "financial.md_charge_rm_per_kw_month".into(),
                message: "must be >= 0".into(),
            });
        }

        errors
    }
}
