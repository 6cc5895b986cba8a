//! Ideal two-state diode.

use std::collections::HashMap;

use circsim_core::{Result, StampContext};

use crate::device::Device;

/// A diode between anode and cathode whose conductance switches between
/// `1/R_on` (forward) and `1/R_off` (reverse), driven by the previous
/// iterate's `V_ak` vs the forward voltage `V_f`. When forward-biased, an
/// equivalent current source `V_f / R_on` is injected to represent the
/// series voltage drop.
#[derive(Debug, Clone)]
pub struct IdealDiode {
    name: String,
    anode: String,
    cathode: String,
    r_on: f64,
    r_off: f64,
    v_f: f64,
    previous_vak: f64,
}

impl IdealDiode {
    pub fn new(
        name: impl Into<String>,
        anode: impl Into<String>,
        cathode: impl Into<String>,
        r_on: f64,
        r_off: f64,
        v_f: f64,
    ) -> Self {
        Self {
            name: name.into(),
            anode: anode.into(),
            cathode: cathode.into(),
            r_on,
            r_off,
            v_f,
            previous_vak: 0.0,
        }
    }

    fn forward_biased(&self) -> bool {
        self.previous_vak >= self.v_f
    }

    fn conductance(&self) -> f64 {
        if self.forward_biased() {
            1.0 / self.r_on
        } else {
            1.0 / self.r_off
        }
    }
}

impl Device for IdealDiode {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.anode.clone(), self.cathode.clone()]
    }

    fn is_nonlinear(&self) -> bool {
        true
    }

    fn pre_stamp(&mut self, voltages: &HashMap<String, f64>) {
        let va = *voltages.get(&self.anode).unwrap_or(&0.0);
        let vk = *voltages.get(&self.cathode).unwrap_or(&0.0);
        self.previous_vak = va - vk;
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let a = ctx.node_index(&self.anode);
        let k = ctx.node_index(&self.cathode);
        ctx.stamp_conductance(a, k, self.conductance());
        if self.forward_biased() {
            let i_eq = self.v_f / self.r_on;
            ctx.stamp_current(a, k, -i_eq);
        }
        Ok(())
    }

    fn power(&self, voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.anode)?;
        let vk = *voltages.get(&self.cathode)?;
        let v = va - vk;
        Some(v * v * self.conductance())
    }

    fn status(&self) -> HashMap<String, String> {
        let mut s = HashMap::new();
        s.insert(
            "state".to_string(),
            if self.forward_biased() { "forward" } else { "reverse" }.to_string(),
        );
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circsim_core::{BranchMap, MnaSystem, NodeMap};

    #[test]
    fn stamp_reverse_biased_only_adds_conductance() {
        let nodes = NodeMap::build(["a", "k"]);
        let branches = BranchMap::build(std::iter::empty::<&str>());
        let mut sys = MnaSystem::zeros(2);
        let d = IdealDiode::new("D1", "a", "k", 1.0, 1e6, 0.7);
        {
            let mut ctx = StampContext {
                a: &mut sys.a,
                b: &mut sys.b,
                nodes: &nodes,
                branches: &branches,
                time: 0.0,
            };
            d.stamp(&mut ctx).unwrap();
        }
        let g = 1.0 / 1e6;
        assert_eq!(sys.a.get(0, 0), g);
        assert_eq!(sys.a.get(1, 1), g);
        assert_eq!(sys.a.get(0, 1), -g);
        assert_eq!(sys.a.get(1, 0), -g);
        assert_eq!(sys.b.get(0), 0.0);
        assert_eq!(sys.b.get(1), 0.0);
    }

    #[test]
    fn stamp_forward_biased_injects_equivalent_current() {
        let nodes = NodeMap::build(["a", "k"]);
        let branches = BranchMap::build(std::iter::empty::<&str>());
        let mut sys = MnaSystem::zeros(2);
        let mut d = IdealDiode::new("D1", "a", "k", 1.0, 1e6, 0.7);
        let mut v = HashMap::new();
        v.insert("a".to_string(), 1.0);
        v.insert("k".to_string(), 0.0);
        d.pre_stamp(&v);
        {
            let mut ctx = StampContext {
                a: &mut sys.a,
                b: &mut sys.b,
                nodes: &nodes,
                branches: &branches,
                time: 0.0,
            };
            d.stamp(&mut ctx).unwrap();
        }
        let g = 1.0 / 1.0;
        assert_eq!(sys.a.get(0, 0), g);
        assert_eq!(sys.a.get(1, 1), g);
        // i_eq = v_f / r_on = 0.7, stamped as stamp_current(a, k, -i_eq):
        // RHS[a] -= (-i_eq) = +i_eq, RHS[k] += (-i_eq) = -i_eq.
        assert_eq!(sys.b.get(0), 0.7);
        assert_eq!(sys.b.get(1), -0.7);
    }

    #[test]
    fn forward_bias_injects_equivalent_current() {
        let mut d = IdealDiode::new("D1", "a", "0", 1.0, 1e6, 0.7);
        let mut v = HashMap::new();
        v.insert("a".to_string(), 1.0);
        v.insert("0".to_string(), 0.0);
        d.pre_stamp(&v);
        assert!(d.forward_biased());
        assert_eq!(d.conductance(), 1.0);
    }

    #[test]
    fn reverse_bias_uses_roff() {
        let mut d = IdealDiode::new("D1", "a", "0", 1.0, 1e6, 0.7);
        let mut v = HashMap::new();
        v.insert("a".to_string(), 0.0);
        v.insert("0".to_string(), 0.0);
        d.pre_stamp(&v);
        assert!(!d.forward_biased());
        assert_eq!(d.conductance(), 1e-6);
    }
}
