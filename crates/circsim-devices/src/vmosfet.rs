//! Voltage-controlled, level-1-like square-law MOSFET.

use std::collections::HashMap;

use circsim_core::{Result, StampContext};

use crate::device::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Off,
    Linear,
    Saturation,
}

/// Conductance floor used for the OFF region and as a saturation-region
/// fallback when `V_ds` is (numerically) zero.
const OFF_CONDUCTANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct VoltageControlledMosfet {
    name: String,
    drain: String,
    source: String,
    gate: String,
    /// Transconductance parameter `k = mu * Cox * W / L`.
    k: f64,
    v_th: f64,
    r_on_body: f64,
    r_off_body: f64,
    v_f: f64,
    previous_vgs: f64,
    previous_vds: f64,
}

impl VoltageControlledMosfet {
    pub fn new(
        name: impl Into<String>,
        drain: impl Into<String>,
        source: impl Into<String>,
        gate: impl Into<String>,
        k: f64,
        v_th: f64,
        r_on_body: f64,
        r_off_body: f64,
        v_f: f64,
    ) -> Self {
        Self {
            name: name.into(),
            drain: drain.into(),
            source: source.into(),
            gate: gate.into(),
            k,
            v_th,
            r_on_body,
            r_off_body,
            v_f,
            previous_vgs: 0.0,
            previous_vds: 0.0,
        }
    }

    pub fn region(&self) -> Region {
        let v_ov = self.previous_vgs - self.v_th;
        if v_ov <= 0.0 {
            Region::Off
        } else if self.previous_vds < v_ov {
            Region::Linear
        } else {
            Region::Saturation
        }
    }

    fn channel_conductance(&self) -> f64 {
        let v_ov = self.previous_vgs - self.v_th;
        match self.region() {
            Region::Off => OFF_CONDUCTANCE,
            Region::Linear => {
                let g = self.k * (v_ov - self.previous_vds / 2.0);
                g.max(OFF_CONDUCTANCE)
            }
            Region::Saturation => {
                let i_sat = 0.5 * self.k * v_ov * v_ov;
                if self.previous_vds.abs() > 1e-12 {
                    (i_sat / self.previous_vds).max(OFF_CONDUCTANCE)
                } else {
                    OFF_CONDUCTANCE
                }
            }
        }
    }

    fn body_diode_conducting(&self) -> bool {
        self.previous_vds < -self.v_f
    }

    fn body_conductance(&self) -> f64 {
        if self.body_diode_conducting() {
            1.0 / self.r_on_body
        } else {
            1.0 / self.r_off_body
        }
    }
}

impl Device for VoltageControlledMosfet {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.drain.clone(), self.source.clone(), self.gate.clone()]
    }

    fn is_nonlinear(&self) -> bool {
        true
    }

    fn pre_stamp(&mut self, voltages: &HashMap<String, f64>) {
        let vd = *voltages.get(&self.drain).unwrap_or(&0.0);
        let vs = *voltages.get(&self.source).unwrap_or(&0.0);
        let vg = *voltages.get(&self.gate).unwrap_or(&0.0);
        self.previous_vgs = vg - vs;
        self.previous_vds = vd - vs;
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let d = ctx.node_index(&self.drain);
        let s = ctx.node_index(&self.source);
        ctx.stamp_conductance(d, s, self.channel_conductance() + self.body_conductance());
        if self.body_diode_conducting() {
            // Anti-parallel body diode, anode at source (conducts when
            // V_ds < -V_f, i.e. the source is the higher-potential
            // terminal) — same orientation as `SwitchMosfet`.
            let i_eq = self.v_f * self.body_conductance();
            ctx.stamp_current(s, d, -i_eq);
        }
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        let mut s = HashMap::new();
        let region = match self.region() {
            Region::Off => "OFF",
            Region::Linear => "LINEAR",
            Region::Saturation => "SATURATION",
        };
        s.insert("region".to_string(), region.to_string());
        s
    }
}
