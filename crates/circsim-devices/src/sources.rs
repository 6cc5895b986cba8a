//! Independent voltage and current sources.

use std::collections::HashMap;

use circsim_core::{Error, Result, StampContext, Waveform};

use crate::device::Device;

/// Independent voltage source between `(+, -)`, with its own branch
/// current unknown.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    name: String,
    pos: String,
    neg: String,
    waveform: Waveform,
}

impl VoltageSource {
    pub fn new(name: impl Into<String>, pos: impl Into<String>, neg: impl Into<String>, waveform: Waveform) -> Self {
        Self {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            waveform,
        }
    }

    pub fn dc(name: impl Into<String>, pos: impl Into<String>, neg: impl Into<String>, value: f64) -> Self {
        Self::new(name, pos, neg, Waveform::Dc(value))
    }
}

impl Device for VoltageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.pos.clone(), self.neg.clone()]
    }

    fn needs_branch_variable(&self) -> bool {
        true
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let a = ctx.node_index(&self.pos);
        let b = ctx.node_index(&self.neg);
        let Some(branch) = ctx.branch_row(&self.name) else {
            return Err(Error::Validation(format!(
                "voltage source {:?} has no branch index allocated",
                self.name
            )));
        };
        ctx.stamp_branch_kcl(a, b, branch);
        ctx.stamp_branch_kvl(branch, a, b);
        ctx.b.set(branch, self.waveform.value(ctx.time));
        Ok(())
    }

    fn power(&self, voltages: &HashMap<String, f64>, currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.pos)?;
        let vb = *voltages.get(&self.neg)?;
        let i = *currents.get(&self.name)?;
        Some(-(va - vb) * i)
    }

    fn set_value(&mut self, v: f64) -> Result<()> {
        self.waveform = Waveform::Dc(v);
        Ok(())
    }
}

/// Independent current source flowing from `a` to `b`, no branch variable.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    name: String,
    a: String,
    b: String,
    waveform: Waveform,
}

impl CurrentSource {
    pub fn new(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>, waveform: Waveform) -> Self {
        Self {
            name: name.into(),
            a: a.into(),
            b: b.into(),
            waveform,
        }
    }

    pub fn dc(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>, value: f64) -> Self {
        Self::new(name, a, b, Waveform::Dc(value))
    }
}

impl Device for CurrentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn stamp(&self, ctx: &mut StampContext) -> Result<()> {
        let a = ctx.node_index(&self.a);
        let b = ctx.node_index(&self.b);
        ctx.stamp_current(a, b, self.waveform.value(ctx.time));
        Ok(())
    }

    fn power(&self, voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        let va = *voltages.get(&self.a)?;
        let vb = *voltages.get(&self.b)?;
        Some((va - vb) * self.waveform.value(0.0))
    }

    fn set_value(&mut self, v: f64) -> Result<()> {
        self.waveform = Waveform::Dc(v);
        Ok(())
    }
}
