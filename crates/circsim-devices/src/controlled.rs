//! Linear controlled sources: VCVS (E), VCCS (G), CCCS (F), CCVS (H).

use circsim_core::{Error, Result, StampContext};

use crate::device::Device;

// ───────────────────────── VCVS (E element) ─────────────────────────

/// Voltage-controlled voltage source: `V(out+,out-) = gain * V(ctrl+,ctrl-)`.
/// Requires its own branch current, like an independent voltage source.
#[derive(Debug, Clone)]
pub struct Vcvs {
    name: String,
    out_pos: String,
    out_neg: String,
    ctrl_pos: String,
    ctrl_neg: String,
    gain: f64,
}

impl Vcvs {
    pub fn new(
        name: impl Into<String>,
        out_pos: impl Into<String>,
        out_neg: impl Into<String>,
        ctrl_pos: impl Into<String>,
        ctrl_neg: impl Into<String>,
        gain: f64,
    ) -> Self {
        Self {
            name: name.into(),
            out_pos: out_pos.into(),
            out_neg: out_neg.into(),
            ctrl_pos: ctrl_pos.into(),
            ctrl_neg: ctrl_neg.into(),
            gain,
        }
    }
}

impl Device for Vcvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![
            self.out_pos.clone(),
            self.out_neg.clone(),
            self.ctrl_pos.clone(),
            self.ctrl_neg.clone(),
        ]
    }

    fn needs_branch_variable(&self) -> bool {
        true
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let op = ctx.node_index(&self.out_pos);
        let on = ctx.node_index(&self.out_neg);
        let cp = ctx.node_index(&self.ctrl_pos);
        let cn = ctx.node_index(&self.ctrl_neg);
        let Some(branch) = ctx.branch_row(&self.name) else {
            return Err(Error::Validation(format!(
                "VCVS {:?} has no branch index allocated",
                self.name
            )));
        };
        ctx.stamp_branch_kcl(op, on, branch);
        ctx.stamp_branch_kvl(branch, op, on);
        if let Some(i) = cp {
            ctx.a.add_at(branch, i, -self.gain);
        }
        if let Some(i) = cn {
            ctx.a.add_at(branch, i, self.gain);
        }
        Ok(())
    }
}

// ───────────────────────── VCCS (G element) ─────────────────────────

/// Voltage-controlled current source: `I(out+ -> out-) = gm * V(ctrl+,ctrl-)`.
/// No branch current variable.
#[derive(Debug, Clone)]
pub struct Vccs {
    name: String,
    out_pos: String,
    out_neg: String,
    ctrl_pos: String,
    ctrl_neg: String,
    gm: f64,
}

impl Vccs {
    pub fn new(
        name: impl Into<String>,
        out_pos: impl Into<String>,
        out_neg: impl Into<String>,
        ctrl_pos: impl Into<String>,
        ctrl_neg: impl Into<String>,
        gm: f64,
    ) -> Self {
        Self {
            name: name.into(),
            out_pos: out_pos.into(),
            out_neg: out_neg.into(),
            ctrl_pos: ctrl_pos.into(),
            ctrl_neg: ctrl_neg.into(),
            gm,
        }
    }
}

impl Device for Vccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![
            self.out_pos.clone(),
            self.out_neg.clone(),
            self.ctrl_pos.clone(),
            self.ctrl_neg.clone(),
        ]
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let op = ctx.node_index(&self.out_pos);
        let on = ctx.node_index(&self.out_neg);
        let cp = ctx.node_index(&self.ctrl_pos);
        let cn = ctx.node_index(&self.ctrl_neg);
        // Four cross-terms of output x control.
        if let (Some(o), Some(c)) = (op, cp) {
            ctx.a.add_at(o, c, self.gm);
        }
        if let (Some(o), Some(c)) = (op, cn) {
            ctx.a.add_at(o, c, -self.gm);
        }
        if let (Some(o), Some(c)) = (on, cp) {
            ctx.a.add_at(o, c, -self.gm);
        }
        if let (Some(o), Some(c)) = (on, cn) {
            ctx.a.add_at(o, c, self.gm);
        }
        Ok(())
    }
}

// ───────────────────────── CCCS (F element) ─────────────────────────

/// Current-controlled current source: `I(out+ -> out-) = gain * I(control)`.
/// No branch variable of its own; depends on the named controlling
/// device's branch current, resolved against the branch map at stamp time.
#[derive(Debug, Clone)]
pub struct Cccs {
    name: String,
    out_pos: String,
    out_neg: String,
    control_device: String,
    gain: f64,
}

impl Cccs {
    pub fn new(
        name: impl Into<String>,
        out_pos: impl Into<String>,
        out_neg: impl Into<String>,
        control_device: impl Into<String>,
        gain: f64,
    ) -> Self {
        Self {
            name: name.into(),
            out_pos: out_pos.into(),
            out_neg: out_neg.into(),
            control_device: control_device.into(),
            gain,
        }
    }
}

impl Device for Cccs {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.out_pos.clone(), self.out_neg.clone()]
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let op = ctx.node_index(&self.out_pos);
        let on = ctx.node_index(&self.out_neg);
        let Some(control_branch) = ctx.branch_row(&self.control_device) else {
            return Err(Error::Validation(format!(
                "CCCS {:?} references unknown controlling device {:?}",
                self.name, self.control_device
            )));
        };
        if let Some(i) = op {
            ctx.a.add_at(i, control_branch, self.gain);
        }
        if let Some(i) = on {
            ctx.a.add_at(i, control_branch, -self.gain);
        }
        Ok(())
    }
}

// ───────────────────────── CCVS (H element) ─────────────────────────

/// Current-controlled voltage source: `V(out+,out-) = r * I(control)`.
/// Requires its own branch current (it is a voltage-defining device).
#[derive(Debug, Clone)]
pub struct Ccvs {
    name: String,
    out_pos: String,
    out_neg: String,
    control_device: String,
    transresistance: f64,
}

impl Ccvs {
    pub fn new(
        name: impl Into<String>,
        out_pos: impl Into<String>,
        out_neg: impl Into<String>,
        control_device: impl Into<String>,
        transresistance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            out_pos: out_pos.into(),
            out_neg: out_neg.into(),
            control_device: control_device.into(),
            transresistance,
        }
    }
}

impl Device for Ccvs {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.out_pos.clone(), self.out_neg.clone()]
    }

    fn needs_branch_variable(&self) -> bool {
        true
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let op = ctx.node_index(&self.out_pos);
        let on = ctx.node_index(&self.out_neg);
        let Some(branch) = ctx.branch_row(&self.name) else {
            return Err(Error::Validation(format!(
                "CCVS {:?} has no branch index allocated",
                self.name
            )));
        };
        let Some(control_branch) = ctx.branch_row(&self.control_device) else {
            return Err(Error::Validation(format!(
                "CCVS {:?} references unknown controlling device {:?}",
                self.name, self.control_device
            )));
        };
        ctx.stamp_branch_kcl(op, on, branch);
        if let Some(i) = op {
            ctx.a.add_at(branch, i, 1.0);
        }
        if let Some(i) = on {
            ctx.a.add_at(branch, i, -1.0);
        }
        ctx.a.add_at(branch, control_branch, -self.transresistance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circsim_core::{BranchMap, MnaSystem, NodeMap};

    #[test]
    fn vccs_stamps_four_cross_terms() {
        let nodes = NodeMap::build(["out", "ctrl"]);
        let branches = BranchMap::build(std::iter::empty::<&str>());
        let mut sys = MnaSystem::zeros(2);
        let g = Vccs::new("G1", "out", "0", "ctrl", "0", 0.1);
        let mut ctx = StampContext {
            a: &mut sys.a,
            b: &mut sys.b,
            nodes: &nodes,
            branches: &branches,
            time: 0.0,
        };
        g.stamp(&mut ctx).unwrap();
        assert_eq!(sys.a.get(0, 1), 0.1);
    }
}
