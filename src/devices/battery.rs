//! Battery energy storage: state of energy, state of health, and the
//! power/energy constraints enforced on every dispatch request.

/// SoE slack below which the battery counts as full/empty.
const SOE_EPSILON_KWH: f64 = 1e-9;

/// A battery energy storage system owned by one simulation run.
///
/// Tracks state of energy (kWh), state of health (fraction of rated
/// capacity remaining) and cumulative discharge throughput. All dispatch
/// goes through [`Battery::apply_kw`], which enforces power limits, SoE
/// bounds and the charge-side round-trip loss.
///
/// # Power Sign Convention
/// - Positive: discharging (serving load)
/// - Negative: charging (absorbing energy)
#[derive(Debug, Clone)]
pub struct Battery {
    /// Rated capacity in kWh at SoH = 1.
    capacity_kwh: f64,
    /// Maximum charging power in kW (positive magnitude).
    max_charge_kw: f64,
    /// Maximum discharging power in kW (positive magnitude).
    max_discharge_kw: f64,
    /// Round-trip efficiency, applied as a loss on charge; discharge
    /// draws down SoE 1:1.
    roundtrip_efficiency: f64,
    /// SoH fraction lost per equivalent full cycle of discharge.
    soh_fade_per_cycle: f64,
    /// SoH never degrades below this fraction.
    soh_floor: f64,
    soe_kwh: f64,
    soh: f64,
    throughput_kwh: f64,
}

impl Battery {
    /// Creates a new battery at full health.
    ///
    /// # Arguments
    ///
    /// * `capacity_mwh` - Rated capacity in MWh (must be > 0)
    /// * `initial_soe_fraction` - Initial SoE as a fraction of capacity (0.0 to 1.0)
    /// * `max_charge_kw` / `max_discharge_kw` - Power limits in kW
    /// * `roundtrip_efficiency` - Charge-side loss factor (0..1.0]
    /// * `soh_fade_per_cycle` - SoH lost per equivalent full cycle (>= 0)
    /// * `soh_floor` - Minimum SoH fraction (0..1.0]
    ///
    /// # Panics
    ///
    /// Panics on out-of-range arguments. Scenario validation reports these
    /// as configuration errors first.
    pub fn new(
        capacity_mwh: f64,
        initial_soe_fraction: f64,
        max_charge_kw: f64,
        max_discharge_kw: f64,
        roundtrip_efficiency: f64,
        soh_fade_per_cycle: f64,
        soh_floor: f64,
    ) -> Self {
        assert!(capacity_mwh > 0.0);
        assert!((0.0..=1.0).contains(&initial_soe_fraction));
        assert!(max_charge_kw >= 0.0 && max_discharge_kw >= 0.0);
        assert!(roundtrip_efficiency > 0.0 && roundtrip_efficiency <= 1.0);
        assert!(soh_fade_per_cycle >= 0.0);
        assert!(soh_floor > 0.0 && soh_floor <= 1.0);

        let capacity_kwh = capacity_mwh * 1000.0;
        Self {
            capacity_kwh,
            max_charge_kw,
            max_discharge_kw,
            roundtrip_efficiency,
            soh_fade_per_cycle,
            soh_floor,
            soe_kwh: initial_soe_fraction * capacity_kwh,
            soh: 1.0,
            throughput_kwh: 0.0,
        }
    }

    /// Rated capacity in kWh at SoH = 1.
    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    /// Capacity currently usable, shrinking as SoH degrades.
    pub fn usable_capacity_kwh(&self) -> f64 {
        self.capacity_kwh * self.soh
    }

    pub fn soe_kwh(&self) -> f64 {
        self.soe_kwh
    }

    pub fn soh(&self) -> f64 {
        self.soh
    }

    /// Cumulative discharge energy in kWh.
    pub fn throughput_kwh(&self) -> f64 {
        self.throughput_kwh
    }

    /// Equivalent full cycles accumulated so far.
    pub fn equivalent_cycles(&self) -> f64 {
        self.throughput_kwh / self.capacity_kwh
    }

    pub fn max_charge_kw(&self) -> f64 {
        self.max_charge_kw
    }

    pub fn max_discharge_kw(&self) -> f64 {
        self.max_discharge_kw
    }

    pub fn is_full(&self) -> bool {
        self.soe_kwh >= self.usable_capacity_kwh() - SOE_EPSILON_KWH
    }

    pub fn is_empty(&self) -> bool {
        self.soe_kwh <= SOE_EPSILON_KWH
    }

    /// Maximum discharge power sustainable for `dt_hours` given SoE.
    pub fn available_discharge_kw(&self, dt_hours: f64) -> f64 {
        if dt_hours <= 0.0 {
            return 0.0;
        }
        self.max_discharge_kw.min(self.soe_kwh / dt_hours)
    }

    /// Maximum charge power acceptable for `dt_hours` given headroom.
    pub fn available_charge_kw(&self, dt_hours: f64) -> f64 {
        if dt_hours <= 0.0 {
            return 0.0;
        }
        let headroom_kwh = (self.usable_capacity_kwh() - self.soe_kwh).max(0.0);
        self.max_charge_kw.min(headroom_kwh / dt_hours)
    }

    /// Applies a signed power request for one step and returns the power
    /// actually realized after power and SoE limits.
    ///
    /// Positive requests discharge, negative requests charge. Requests are
    /// clamped, never rejected: an empty battery simply realizes 0 kW.
    /// Discharge energy accrues throughput and degrades SoH; charge energy
    /// is stored after the round-trip loss.
    pub fn apply_kw(&mut self, request_kw: f64, dt_hours: f64) -> f64 {
        if dt_hours <= 0.0 || request_kw == 0.0 {
            return 0.0;
        }

        if request_kw > 0.0 {
            let actual_kw = request_kw.min(self.available_discharge_kw(dt_hours));
            if actual_kw <= 0.0 {
                return 0.0;
            }
            let energy_kwh = actual_kw * dt_hours;
            self.soe_kwh -= energy_kwh;
            self.throughput_kwh += energy_kwh;
            self.degrade(energy_kwh);
            self.soe_kwh = self.soe_kwh.clamp(0.0, self.usable_capacity_kwh());
            actual_kw
        } else {
            let actual_kw = (-request_kw).min(self.available_charge_kw(dt_hours));
            if actual_kw <= 0.0 {
                return 0.0;
            }
            self.soe_kwh += actual_kw * dt_hours * self.roundtrip_efficiency;
            self.soe_kwh = self.soe_kwh.clamp(0.0, self.usable_capacity_kwh());
            -actual_kw
        }
    }

    /// Amp-hour-throughput degradation: SoH drops in proportion to the
    /// equivalent full cycles of the step, floored at `soh_floor`.
    fn degrade(&mut self, discharge_kwh: f64) {
        let cycles = discharge_kwh / self.capacity_kwh;
        self.soh = (self.soh - cycles * self.soh_fade_per_cycle).max(self.soh_floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(initial_soe: f64) -> Battery {
        // 1 MWh, 500 kW both directions, lossless, no fade.
        Battery::new(1.0, initial_soe, 500.0, 500.0, 1.0, 0.0, 0.8)
    }

    #[test]
    fn new_battery_state() {
        let b = Battery::new(7.5, 0.6, 2000.0, 2000.0, 0.9, 2.5e-5, 0.8);
        assert_eq!(b.capacity_kwh(), 7500.0);
        assert_eq!(b.soe_kwh(), 4500.0);
        assert_eq!(b.soh(), 1.0);
        assert_eq!(b.throughput_kwh(), 0.0);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        Battery::new(0.0, 0.5, 500.0, 500.0, 0.9, 0.0, 0.8);
    }

    #[test]
    #[should_panic]
    fn soe_fraction_out_of_range_panics() {
        Battery::new(1.0, 1.2, 500.0, 500.0, 0.9, 0.0, 0.8);
    }

    #[test]
    fn discharge_respects_power_limit() {
        let mut b = battery(1.0);
        let actual = b.apply_kw(800.0, 0.25);
        assert_eq!(actual, 500.0);
        assert!((b.soe_kwh() - 875.0).abs() < 1e-9);
    }

    #[test]
    fn discharge_respects_soe_limit() {
        // 100 kWh left, 1h step: at most 100 kW regardless of rating.
        let mut b = battery(0.1);
        let actual = b.apply_kw(500.0, 1.0);
        assert_eq!(actual, 100.0);
        assert!(b.is_empty());
    }

    #[test]
    fn empty_battery_realizes_zero() {
        let mut b = battery(0.0);
        assert_eq!(b.apply_kw(500.0, 0.25), 0.0);
        assert_eq!(b.soe_kwh(), 0.0);
    }

    #[test]
    fn charge_respects_headroom() {
        // 900 kWh stored, 100 kWh headroom, 1h step: at most 100 kW.
        let mut b = battery(0.9);
        let actual = b.apply_kw(-500.0, 1.0);
        assert_eq!(actual, -100.0);
        assert!(b.is_full());
    }

    #[test]
    fn charge_loss_applies_on_charge_side() {
        let mut b = Battery::new(1.0, 0.0, 500.0, 500.0, 0.9, 0.0, 0.8);
        let actual = b.apply_kw(-100.0, 1.0);
        assert_eq!(actual, -100.0);
        // 100 kWh drawn, 90 kWh stored.
        assert!((b.soe_kwh() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn discharge_draws_soe_one_to_one() {
        let mut b = Battery::new(1.0, 0.5, 500.0, 500.0, 0.9, 0.0, 0.8);
        b.apply_kw(100.0, 1.0);
        assert!((b.soe_kwh() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn soh_degrades_with_discharge_throughput() {
        let mut b = Battery::new(1.0, 1.0, 1000.0, 1000.0, 1.0, 1e-3, 0.8);
        b.apply_kw(500.0, 1.0); // half a cycle
        assert!((b.soh() - 0.9995).abs() < 1e-12);
        assert!((b.equivalent_cycles() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn soh_never_increases_and_respects_floor() {
        let mut b = Battery::new(1.0, 1.0, 1000.0, 1000.0, 1.0, 0.5, 0.8);
        let mut last_soh = b.soh();
        for _ in 0..10 {
            b.apply_kw(1000.0, 1.0);
            assert!(b.soh() <= last_soh);
            last_soh = b.soh();
            b.apply_kw(-1000.0, 1.0);
        }
        assert!(b.soh() >= 0.8);
    }

    #[test]
    fn soe_clamped_to_usable_capacity_after_fade() {
        // Aggressive fade: a full discharge-recharge shrinks usable
        // capacity below the previous SoE ceiling.
        let mut b = Battery::new(1.0, 1.0, 1000.0, 1000.0, 1.0, 0.1, 0.5);
        b.apply_kw(1000.0, 1.0);
        b.apply_kw(-1000.0, 1.0);
        assert!(b.soe_kwh() <= b.usable_capacity_kwh() + 1e-9);
    }

    #[test]
    fn charge_on_full_battery_is_noop() {
        let mut b = battery(1.0);
        assert_eq!(b.apply_kw(-500.0, 0.25), 0.0);
    }

    #[test]
    fn zero_dt_is_noop() {
        let mut b = battery(0.5);
        assert_eq!(b.apply_kw(500.0, 0.0), 0.0);
        assert_eq!(b.soe_kwh(), 500.0);
    }
}
