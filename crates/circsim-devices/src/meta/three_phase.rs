//! Three-phase source meta-device.
//!
//! Expands, at construction, into three internal SINE voltage sources with
//! 120-degree spacing, either ABC or ACB phase order, in wye (with neutral)
//! or delta topology.

use circsim_core::{Error, Waveform};

use crate::device::{Device, DeviceKind};
use crate::sources::VoltageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOrder {
    Abc,
    Acb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Wye,
    Delta,
}

#[derive(Debug, Clone)]
pub struct ThreePhaseSource {
    name: String,
    /// Line-to-line RMS voltage.
    v_line: f64,
    frequency: f64,
    order: PhaseOrder,
    topology: Topology,
    phase_a: String,
    phase_b: String,
    phase_c: String,
    /// Required for wye topology; `None` for delta.
    neutral: Option<String>,
}

impl ThreePhaseSource {
    pub fn wye(
        name: impl Into<String>,
        v_line: f64,
        frequency: f64,
        order: PhaseOrder,
        phase_a: impl Into<String>,
        phase_b: impl Into<String>,
        phase_c: impl Into<String>,
        neutral: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            v_line,
            frequency,
            order,
            topology: Topology::Wye,
            phase_a: phase_a.into(),
            phase_b: phase_b.into(),
            phase_c: phase_c.into(),
            neutral: Some(neutral.into()),
        }
    }

    pub fn delta(
        name: impl Into<String>,
        v_line: f64,
        frequency: f64,
        order: PhaseOrder,
        phase_a: impl Into<String>,
        phase_b: impl Into<String>,
        phase_c: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            v_line,
            frequency,
            order,
            topology: Topology::Delta,
            phase_a: phase_a.into(),
            phase_b: phase_b.into(),
            phase_c: phase_c.into(),
            neutral: None,
        }
    }

    /// Phase-to-neutral peak amplitude for wye, or line-to-line peak for
    /// delta: `sqrt(2) * V_rms`.
    fn peak(&self, rms: f64) -> f64 {
        std::f64::consts::SQRT_2 * rms
    }
}

impl Device for ThreePhaseSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        let mut t = vec![self.phase_a.clone(), self.phase_b.clone(), self.phase_c.clone()];
        if let Some(n) = &self.neutral {
            t.push(n.clone());
        }
        t
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::MetaThreePhase
    }

    fn expand(&self) -> Option<Vec<Box<dyn Device>>> {
        let two_pi_thirds = 2.0 * std::f64::consts::PI / 3.0;
        let (offset_b, offset_c) = match self.order {
            PhaseOrder::Abc => (-two_pi_thirds, two_pi_thirds),
            PhaseOrder::Acb => (two_pi_thirds, -two_pi_thirds),
        };

        let devices: Vec<Box<dyn Device>> = match self.topology {
            Topology::Wye => {
                let v_phase_rms = self.v_line / 3.0_f64.sqrt();
                let amplitude = self.peak(v_phase_rms);
                let neutral = self.neutral.clone().expect("wye topology requires a neutral node");
                vec![
                    Box::new(VoltageSource::new(
                        format!("{}_A", self.name),
                        self.phase_a.clone(),
                        neutral.clone(),
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, 0.0),
                    )),
                    Box::new(VoltageSource::new(
                        format!("{}_B", self.name),
                        self.phase_b.clone(),
                        neutral.clone(),
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, offset_b),
                    )),
                    Box::new(VoltageSource::new(
                        format!("{}_C", self.name),
                        self.phase_c.clone(),
                        neutral,
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, offset_c),
                    )),
                ]
            }
            Topology::Delta => {
                let amplitude = self.peak(self.v_line);
                vec![
                    Box::new(VoltageSource::new(
                        format!("{}_AB", self.name),
                        self.phase_a.clone(),
                        self.phase_b.clone(),
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, 0.0),
                    )),
                    Box::new(VoltageSource::new(
                        format!("{}_BC", self.name),
                        self.phase_b.clone(),
                        self.phase_c.clone(),
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, offset_b),
                    )),
                    Box::new(VoltageSource::new(
                        format!("{}_CA", self.name),
                        self.phase_c.clone(),
                        self.phase_a.clone(),
                        Waveform::phase_shifted_sine(0.0, amplitude, self.frequency, offset_c),
                    )),
                ]
            }
        };
        Some(devices)
    }

    fn stamp(&self, _ctx: &mut circsim_core::StampContext) -> circsim_core::Result<()> {
        Err(Error::Validation(format!(
            "three-phase source {:?} must be expanded before analysis",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wye_expansion_sums_to_zero_at_t0() {
        let src = ThreePhaseSource::wye("U1", 230.0, 50.0, PhaseOrder::Abc, "a", "b", "c", "n");
        let expanded = src.expand().unwrap();
        assert_eq!(expanded.len(), 3);
    }
}
