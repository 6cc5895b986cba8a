//! Stepped (externally-clocked) transient driver.
//!
//! Mirrors [`crate::transient`] but advances one time point per call to
//! [`SteppedDriver::step`], accepting a control-input map each time (gate
//! signals, source value overrides) instead of precomputed waveforms.

use std::collections::HashMap;

use circsim_core::{IntegrationMethod, Result};
use circsim_devices::Device;

use crate::assembler::Assembler;
use crate::dc::{DcOptions, run_dc};
use crate::lu;

/// A control-input map entry: boolean values address switches' gate
/// state, numeric values address an independent source's `set_value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub time: f64,
    pub voltages: HashMap<String, f64>,
    pub currents: HashMap<String, f64>,
    pub status: HashMap<String, HashMap<String, String>>,
    pub converged: bool,
    pub iterations: usize,
}

pub struct SteppedDriver {
    h: f64,
    t: f64,
    t_stop: f64,
    assembler: Assembler,
    voltages: HashMap<String, f64>,
    currents: HashMap<String, f64>,
    dc_options: DcOptions,
}

impl SteppedDriver {
    /// Initialize: analyze the device list, run `init_transient` on every
    /// device, seed history from a DC solve at `t_start` — the same
    /// initialization the fixed-step transient driver performs, reused
    /// here verbatim.
    pub fn init_stepped(
        devices: &mut [Box<dyn Device>],
        h: f64,
        t_start: f64,
        t_stop: f64,
        method: IntegrationMethod,
        dc_options: DcOptions,
    ) -> Result<Self> {
        let assembler = Assembler::analyze(devices);
        for d in devices.iter_mut() {
            d.init_transient(h, method);
        }
        let dc = run_dc(devices, &assembler, &dc_options)?;
        for d in devices.iter_mut() {
            d.update_history(&dc.voltages, &dc.currents);
        }
        Ok(Self {
            h,
            t: t_start,
            t_stop,
            assembler,
            voltages: dc.voltages,
            currents: dc.currents,
            dc_options,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.t + self.h > self.t_stop + self.h * 1e-6
    }

    pub fn current_time(&self) -> f64 {
        self.t
    }

    /// Apply the control-input map: `set_gate_state` for `Bool`,
    /// `set_value` for `Number`, looked up by device name.
    fn update_control_inputs(devices: &mut [Box<dyn Device>], controls: &HashMap<String, ControlValue>) -> Result<()> {
        for d in devices.iter_mut() {
            if let Some(value) = controls.get(d.name()) {
                match value {
                    ControlValue::Bool(on) => d.set_gate_state(*on)?,
                    ControlValue::Number(v) => d.set_value(*v)?,
                }
            }
        }
        Ok(())
    }

    /// Advance one time step. Control inputs are applied before the build
    /// pass; nonlinear assemblies run the same damped-Picard mini-loop the
    /// DC and transient analyzers use, linear ones solve once and report
    /// `converged = true`.
    pub fn step(&mut self, devices: &mut [Box<dyn Device>], controls: &HashMap<String, ControlValue>) -> Result<StepRecord> {
        Self::update_control_inputs(devices, controls)?;
        for d in devices.iter_mut() {
            d.update_companion_model();
        }

        let next_t = self.t + self.h;
        let is_nonlinear = devices.iter().any(|d| d.is_nonlinear());

        let (voltages, currents, converged, iterations) = if is_nonlinear {
            let mut v = self.voltages.clone();
            let mut c = HashMap::new();
            let mut converged = false;
            let mut iterations = 0;
            for iter in 0..self.dc_options.max_iterations.max(1) {
                iterations = iter + 1;
                let sys = self.assembler.build(devices, &v, next_t)?;
                let x = lu::solve(&sys.a, &sys.b)?;
                let new_v = self.assembler.extract_node_voltages(&x);
                c = self.assembler.extract_branch_currents(&x);
                let mut max_delta = 0.0_f64;
                for (name, val) in &new_v {
                    let old = v.get(name).copied().unwrap_or(0.0);
                    max_delta = max_delta.max((val - old).abs());
                }
                v = new_v;
                if max_delta < self.dc_options.tolerance {
                    converged = true;
                    break;
                }
            }
            (v, c, converged, iterations)
        } else {
            let sys = self.assembler.build(devices, &self.voltages, next_t)?;
            let x = lu::solve(&sys.a, &sys.b)?;
            let v = self.assembler.extract_node_voltages(&x);
            let c = self.assembler.extract_branch_currents(&x);
            (v, c, true, 1)
        };

        for d in devices.iter_mut() {
            d.update_history(&voltages, &currents);
        }
        let status = devices
            .iter()
            .map(|d| (d.name().to_string(), d.status()))
            .filter(|(_, s)| !s.is_empty())
            .collect();

        self.voltages = voltages.clone();
        self.currents = currents.clone();
        self.t = next_t;

        Ok(StepRecord {
            time: next_t,
            voltages,
            currents,
            status,
            converged,
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circsim_devices::{Resistor, SwitchMosfet, VoltageSource};

    #[test]
    fn gate_controlled_switch_responds_to_control_map() {
        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 12.0)),
            Box::new(SwitchMosfet::new("S1", "in", "out", 1e-2, 1e6, 1e3, 1e6, 0.7)),
            Box::new(Resistor::new("R1", "out", "0", 100.0).unwrap()),
        ];
        let mut driver = SteppedDriver::init_stepped(
            &mut devices,
            1e-6,
            0.0,
            10e-6,
            IntegrationMethod::BackwardEuler,
            DcOptions::default(),
        )
        .unwrap();

        let mut off = HashMap::new();
        off.insert("S1".to_string(), ControlValue::Bool(false));
        let record_off = driver.step(&mut devices, &off).unwrap();
        assert!(record_off.voltages["out"].abs() < 0.01);

        let mut on = HashMap::new();
        on.insert("S1".to_string(), ControlValue::Bool(true));
        let record_on = driver.step(&mut devices, &on).unwrap();
        assert!((record_on.voltages["out"] - 12.0).abs() < 0.5);
    }

    #[test]
    fn is_finished_reflects_t_stop() {
        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 5.0)),
            Box::new(Resistor::new("R1", "in", "0", 1000.0).unwrap()),
        ];
        let mut driver =
            SteppedDriver::init_stepped(&mut devices, 1e-6, 0.0, 2e-6, IntegrationMethod::BackwardEuler, DcOptions::default())
                .unwrap();
        assert!(!driver.is_finished());
        driver.step(&mut devices, &HashMap::new()).unwrap();
        driver.step(&mut devices, &HashMap::new()).unwrap();
        assert!(driver.is_finished());
    }
}
