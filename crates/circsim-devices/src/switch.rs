//! Switch-level MOSFET with anti-parallel body diode.

use std::collections::HashMap;

use circsim_core::{Result, StampContext};

use crate::device::Device;

/// A two-state (ON/OFF) channel MOSFET. Gate state is owned externally
/// and driven through [`Device::set_gate_state`]. The anti-parallel body
/// diode contributes both the conductance switch and, when conducting,
/// the same `V_f` equivalent-current injection as
/// [`crate::diode::IdealDiode`].
#[derive(Debug, Clone)]
pub struct SwitchMosfet {
    name: String,
    drain: String,
    source: String,
    r_on: f64,
    r_off: f64,
    r_on_body: f64,
    r_off_body: f64,
    v_f: f64,
    gate_on: bool,
    /// `V_ds` from the previous iterate; defaults to 0.
    previous_vds: f64,
}

impl SwitchMosfet {
    pub fn new(
        name: impl Into<String>,
        drain: impl Into<String>,
        source: impl Into<String>,
        r_on: f64,
        r_off: f64,
        r_on_body: f64,
        r_off_body: f64,
        v_f: f64,
    ) -> Self {
        Self {
            name: name.into(),
            drain: drain.into(),
            source: source.into(),
            r_on,
            r_off,
            r_on_body,
            r_off_body,
            v_f,
            gate_on: false,
            previous_vds: 0.0,
        }
    }

    fn body_diode_conducting(&self) -> bool {
        self.previous_vds < -self.v_f
    }

    fn total_conductance(&self) -> f64 {
        let channel = if self.gate_on { 1.0 / self.r_on } else { 1.0 / self.r_off };
        let body = if self.body_diode_conducting() {
            1.0 / self.r_on_body
        } else {
            1.0 / self.r_off_body
        };
        channel + body
    }
}

impl Device for SwitchMosfet {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.drain.clone(), self.source.clone()]
    }

    fn is_nonlinear(&self) -> bool {
        true
    }

    fn pre_stamp(&mut self, voltages: &HashMap<String, f64>) {
        let vd = *voltages.get(&self.drain).unwrap_or(&0.0);
        let vs = *voltages.get(&self.source).unwrap_or(&0.0);
        self.previous_vds = vd - vs;
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let d = ctx.node_index(&self.drain);
        let s = ctx.node_index(&self.source);
        ctx.stamp_conductance(d, s, self.total_conductance());
        if self.body_diode_conducting() {
            // Anti-parallel body diode, anode at source: same equivalent-
            // current treatment as `IdealDiode`.
            let i_eq = self.v_f / self.r_on_body;
            ctx.stamp_current(s, d, -i_eq);
        }
        Ok(())
    }

    fn power(&self, voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        let vd = *voltages.get(&self.drain)?;
        let vs = *voltages.get(&self.source)?;
        let v = vd - vs;
        Some(v * v * self.total_conductance())
    }

    fn status(&self) -> HashMap<String, String> {
        let mut s = HashMap::new();
        s.insert("gate".to_string(), if self.gate_on { "ON" } else { "OFF" }.to_string());
        s.insert(
            "body_diode".to_string(),
            if self.body_diode_conducting() { "conducting" } else { "blocking" }.to_string(),
        );
        s
    }

    fn set_gate_state(&mut self, on: bool) -> Result<()> {
        self.gate_on = on;
        Ok(())
    }
}
