//! Passive two-terminal devices: resistor, capacitor, inductor.

use std::collections::HashMap;

use circsim_core::{Error, IntegrationMethod, Result, StampContext};

use crate::device::{Device, DeviceKind};

/// Linear resistor between two nodes.
#[derive(Debug, Clone)]
pub struct Resistor {
    name: String,
    a: String,
    b: String,
    resistance: f64,
}

impl Resistor {
    pub fn new(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>, resistance: f64) -> Result<Self> {
        let a = a.into();
        let b = b.into();
        if a == b {
            return Err(Error::Validation(format!(
                "resistor {:?} has duplicate terminals {:?}",
                name.into(),
                a
            )));
        }
        if resistance == 0.0 {
            return Err(Error::Validation(format!(
                "resistor {:?} has zero resistance",
                name.into()
            )));
        }
        Ok(Self {
            name: name.into(),
            a,
            b,
            resistance,
        })
    }
}

impl Device for Resistor {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let a = ctx.node_index(&self.a);
        let b = ctx.node_index(&self.b);
        ctx.stamp_conductance(a, b, 1.0 / self.resistance);
        Ok(())
    }

    fn power(&self, voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.a)?;
        let vb = *voltages.get(&self.b)?;
        let v = va - vb;
        Some(v * v / self.resistance)
    }

    fn characteristic_value(&self) -> Option<f64> {
        Some(self.resistance)
    }
}

/// Companion-model state shared by capacitor and inductor: the equivalent
/// conductance/resistance and the history source, refreshed each step.
#[derive(Debug, Clone, Copy, Default)]
struct Companion {
    equivalent: f64,
    history: f64,
}

/// Capacitor between two nodes, backward-Euler/trapezoidal companion model.
#[derive(Debug, Clone)]
pub struct Capacitor {
    name: String,
    a: String,
    b: String,
    capacitance: f64,
    initial_voltage: f64,
    h: Option<f64>,
    method: IntegrationMethod,
    companion: Companion,
    /// Previous step's capacitor voltage (`V_prev`); also the previous
    /// step's current, needed by the trapezoidal history term.
    previous_voltage: f64,
    previous_current: f64,
}

impl Capacitor {
    pub fn new(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>, capacitance: f64) -> Result<Self> {
        Self::with_ic(name, a, b, capacitance, 0.0)
    }

    pub fn with_ic(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        capacitance: f64,
        initial_voltage: f64,
    ) -> Result<Self> {
        let name = name.into();
        let a = a.into();
        let b = b.into();
        if a == b {
            return Err(Error::Validation(format!(
                "capacitor {name:?} has duplicate terminals {a:?}"
            )));
        }
        if capacitance < 0.0 {
            return Err(Error::Validation(format!(
                "capacitor {name:?} has negative capacitance"
            )));
        }
        Ok(Self {
            name,
            a,
            b,
            capacitance,
            initial_voltage,
            h: None,
            method: IntegrationMethod::BackwardEuler,
            companion: Companion::default(),
            previous_voltage: initial_voltage,
            previous_current: 0.0,
        })
    }

    fn refresh_companion(&mut self) {
        let Some(h) = self.h else { return };
        match self.method {
            IntegrationMethod::BackwardEuler => {
                self.companion.equivalent = self.capacitance / h;
                self.companion.history = -self.companion.equivalent * self.previous_voltage;
            }
            IntegrationMethod::Trapezoidal => {
                self.companion.equivalent = 2.0 * self.capacitance / h;
                self.companion.history =
                    -self.companion.equivalent * self.previous_voltage - self.previous_current;
            }
        }
    }
}

impl Device for Capacitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        // DC (no step allocated yet): capacitor is open, no stamp at all.
        let Some(_h) = self.h else { return Ok(()) };
        let a = ctx.node_index(&self.a);
        let b = ctx.node_index(&self.b);
        ctx.stamp_conductance(a, b, self.companion.equivalent);
        ctx.stamp_current(a, b, -self.companion.history);
        Ok(())
    }

    fn init_transient(&mut self, h: f64, method: IntegrationMethod) {
        self.h = Some(h);
        self.method = method;
        self.previous_voltage = self.initial_voltage;
        self.previous_current = 0.0;
        self.refresh_companion();
    }

    fn update_companion_model(&mut self) {
        self.refresh_companion();
    }

    fn update_history(&mut self, voltages: &HashMap<String, f64>, currents: &HashMap<String, f64>) {
        // Refresh the companion model from the step that just ended before
        // overwriting previous_* with this step's values.
        self.refresh_companion();
        let va = *voltages.get(&self.a).unwrap_or(&0.0);
        let vb = *voltages.get(&self.b).unwrap_or(&0.0);
        let v = va - vb;
        self.previous_current = self.companion.equivalent * v + self.companion.history;
        let _ = currents;
        self.previous_voltage = v;
    }

    fn power(&self, voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.a)?;
        let vb = *voltages.get(&self.b)?;
        let v = va - vb;
        let i = self.companion.equivalent * v + self.companion.history;
        Some(v * i)
    }

    fn characteristic_value(&self) -> Option<f64> {
        Some(self.capacitance)
    }
}

/// Inductor between two nodes, own branch-current unknown.
#[derive(Debug, Clone)]
pub struct Inductor {
    name: String,
    a: String,
    b: String,
    inductance: f64,
    initial_current: f64,
    h: Option<f64>,
    method: IntegrationMethod,
    companion: Companion,
    previous_current: f64,
    /// Previous step's terminal voltage drop (`V_a - V_b`); the dual of the
    /// capacitor's `previous_current`, needed by the trapezoidal history
    /// term.
    previous_voltage: f64,
    /// `{other_inductor_branch_name, mutual_inductance}` pairs for coupled
    /// inductors.
    couplings: Vec<(String, f64)>,
    /// Latched previous currents for each coupling partner, refreshed by
    /// whichever caller (e.g. the transformer meta-device's host) knows
    /// them; defaults to 0 until set.
    coupling_currents: HashMap<String, f64>,
}

/// Small conductance used to short an inductor in DC analysis, in place of
/// the (undefined, h=0) equivalent resistance a transient stamp would use.
const DC_SHORT_CONDUCTANCE: f64 = 1e9;

impl Inductor {
    pub fn new(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>, inductance: f64) -> Result<Self> {
        Self::with_ic(name, a, b, inductance, 0.0)
    }

    pub fn with_ic(
        name: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        inductance: f64,
        initial_current: f64,
    ) -> Result<Self> {
        let name = name.into();
        let a = a.into();
        let b = b.into();
        if a == b {
            return Err(Error::Validation(format!(
                "inductor {name:?} has duplicate terminals {a:?}"
            )));
        }
        if inductance < 0.0 {
            return Err(Error::Validation(format!(
                "inductor {name:?} has negative inductance"
            )));
        }
        Ok(Self {
            name,
            a,
            b,
            inductance,
            initial_current,
            h: None,
            method: IntegrationMethod::BackwardEuler,
            companion: Companion::default(),
            previous_current: initial_current,
            previous_voltage: 0.0,
            couplings: Vec::new(),
            coupling_currents: HashMap::new(),
        })
    }

    /// Register a mutual-coupling partner, clamping `k` to `[-1, 1]` and
    /// computing `M = k * sqrt(L_i * L_j)`.
    pub fn couple_with(&mut self, other_name: impl Into<String>, k: f64, other_inductance: f64) {
        let other_name = other_name.into();
        if !(-1.0..=1.0).contains(&k) {
            log::warn!("coupling coefficient {k} between {:?} and {other_name:?} clamped to [-1, 1]", self.name);
        }
        let k = k.clamp(-1.0, 1.0);
        let m = k * (self.inductance * other_inductance).sqrt();
        self.couplings.push((other_name, m));
    }

    /// Called by the owning transformer meta-device (or the transient
    /// loop, for a freestanding coupled pair) to hand over a partner's
    /// latest accepted current.
    pub fn set_coupling_current(&mut self, other_name: &str, current: f64) {
        self.coupling_currents.insert(other_name.to_string(), current);
    }

    fn refresh_companion(&mut self) {
        let Some(h) = self.h else { return };
        match self.method {
            IntegrationMethod::BackwardEuler => {
                self.companion.equivalent = self.inductance / h;
                self.companion.history = self.companion.equivalent * self.previous_current;
            }
            IntegrationMethod::Trapezoidal => {
                // Dual of the capacitor's `-equivalent*previous_voltage -
                // previous_current`: doubles the equivalent resistance and
                // folds in the previous step's terminal voltage drop
                // alongside the previous current.
                self.companion.equivalent = 2.0 * self.inductance / h;
                self.companion.history =
                    self.companion.equivalent * self.previous_current + self.previous_voltage;
            }
        }
    }
}

impl Device for Inductor {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn needs_branch_variable(&self) -> bool {
        true
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let a = ctx.node_index(&self.a);
        let b = ctx.node_index(&self.b);
        let Some(branch) = ctx.branch_row(&self.name) else {
            return Err(Error::Validation(format!(
                "inductor {:?} has no branch index allocated",
                self.name
            )));
        };
        ctx.stamp_branch_kcl(a, b, branch);
        ctx.stamp_branch_kvl(branch, a, b);

        let r_eq = if self.h.is_some() {
            self.companion.equivalent
        } else {
            // DC: short the inductor via a tiny conductance row instead.
            1.0 / DC_SHORT_CONDUCTANCE
        };
        ctx.a.add_at(branch, branch, -r_eq);

        if self.h.is_some() {
            ctx.b.add_at(branch, -self.companion.history);
            let h = self.h.unwrap();
            for (other, m) in &self.couplings {
                if let Some(other_branch) = ctx.branch_row(other) {
                    ctx.a.add_at(branch, other_branch, -m / h);
                    let i_other = *self.coupling_currents.get(other).unwrap_or(&0.0);
                    ctx.b.add_at(branch, -(m / h) * i_other);
                }
            }
        }
        Ok(())
    }

    fn init_transient(&mut self, h: f64, method: IntegrationMethod) {
        self.h = Some(h);
        self.method = method;
        self.previous_current = self.initial_current;
        self.previous_voltage = 0.0;
        self.refresh_companion();
    }

    fn update_companion_model(&mut self) {
        self.refresh_companion();
    }

    fn update_history(&mut self, voltages: &HashMap<String, f64>, currents: &HashMap<String, f64>) {
        // Refresh the companion model from the step that just ended before
        // overwriting previous_* with this step's values.
        self.refresh_companion();
        if let Some(i) = currents.get(&self.name) {
            self.previous_current = *i;
        }
        let va = *voltages.get(&self.a).unwrap_or(&0.0);
        let vb = *voltages.get(&self.b).unwrap_or(&0.0);
        self.previous_voltage = va - vb;
        // `currents` carries every branch-current device's latest value by
        // name, so a coupling partner's current is read straight out of it
        // — no separate wiring from the transformer meta-device is needed.
        for (other, _) in &self.couplings {
            if let Some(i) = currents.get(other) {
                self.coupling_currents.insert(other.clone(), *i);
            }
        }
    }

    fn power(&self, voltages: &HashMap<String, f64>, currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.a)?;
        let vb = *voltages.get(&self.b)?;
        let i = *currents.get(&self.name)?;
        Some((va - vb) * i)
    }

    fn characteristic_value(&self) -> Option<f64> {
        Some(self.inductance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistor_rejects_zero_ohms() {
        assert!(Resistor::new("R1", "a", "b", 0.0).is_err());
    }

    #[test]
    fn resistor_rejects_duplicate_terminals() {
        assert!(Resistor::new("R1", "a", "a", 100.0).is_err());
    }

    #[test]
    fn capacitor_history_ordering_pins_next_step_rhs() {
        // Refresh companion from the step that just ended, then overwrite
        // previous_voltage. With C=1uF, h=1us, backward Euler: G_eq = 1.0.
        // After seeing V=1.0 at the new step, the *next* stamp's history
        // term must be -G_eq*1.0 = -1.0.
        let mut cap = Capacitor::new("C1", "a", "0", 1e-6).unwrap();
        cap.init_transient(1e-6, IntegrationMethod::BackwardEuler);
        let mut voltages = HashMap::new();
        voltages.insert("a".to_string(), 1.0);
        voltages.insert("0".to_string(), 0.0);
        cap.update_history(&voltages, &HashMap::new());
        assert_eq!(cap.previous_voltage, 1.0);
        cap.update_companion_model();
        assert_eq!(cap.companion.history, -1.0);
    }

    #[test]
    fn inductor_couplings_clamp_k() {
        let mut l1 = Inductor::new("L1", "a", "0", 1e-3).unwrap();
        l1.couple_with("L2", 1.5, 1e-3);
        assert_eq!(l1.couplings[0].1, 1e-3);
    }

    #[test]
    fn inductor_trapezoidal_history_includes_previous_voltage() {
        // Trapezoidal history is the dual of the capacitor's: it must fold
        // in both the previous current (scaled by the doubled equivalent
        // resistance) and the previous terminal voltage drop. With L=1mH,
        // h=1us: R_eq = 2mH/1us = 2.0. After a step that ends with I=1.0A
        // and V=0.5V across the inductor, the next stamp's history term
        // must be R_eq*1.0 + 0.5 = 2.5, not just R_eq*1.0 = 2.0.
        let mut l = Inductor::new("L1", "a", "b", 1e-3).unwrap();
        l.init_transient(1e-6, IntegrationMethod::Trapezoidal);
        let mut voltages = HashMap::new();
        voltages.insert("a".to_string(), 0.5);
        voltages.insert("b".to_string(), 0.0);
        let mut currents = HashMap::new();
        currents.insert("L1".to_string(), 1.0);
        l.update_history(&voltages, &currents);
        assert_eq!(l.previous_voltage, 0.5);
        assert_eq!(l.previous_current, 1.0);
        l.update_companion_model();
        assert!((l.companion.history - 2.5).abs() < 1e-12);
    }
}
