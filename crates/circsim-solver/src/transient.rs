//! Transient (time-domain) analysis driver.

use std::collections::HashMap;

use circsim_core::{IntegrationMethod, Result};
use circsim_devices::Device;

use crate::assembler::Assembler;
use crate::dc::{DcOptions, run_dc};
use crate::lu;

#[derive(Debug, Clone, Copy)]
pub struct TransientParams {
    pub t_start: f64,
    pub t_stop: f64,
    pub h: f64,
    pub method: IntegrationMethod,
}

impl TransientParams {
    pub fn new(h: f64, t_stop: f64) -> Self {
        Self {
            t_start: 0.0,
            t_stop,
            h,
            method: IntegrationMethod::BackwardEuler,
        }
    }

    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_t_start(mut self, t_start: f64) -> Self {
        self.t_start = t_start;
        self
    }
}

/// Fixed-step analysis metadata: method, matrix size, node/source counts,
/// average/min/max step. Step size is fixed (no adaptive step control),
/// so avg/min/max all equal `h` — still reported explicitly rather than
/// assumed, since a caller should not have to special-case a fixed-step
/// driver.
#[derive(Debug, Clone)]
pub struct AnalysisInfo {
    pub method: IntegrationMethod,
    pub matrix_size: usize,
    pub num_nodes: usize,
    pub num_branch_sources: usize,
    pub avg_step: f64,
    pub min_step: f64,
    pub max_step: f64,
}

#[derive(Debug, Clone)]
pub struct TransientResult {
    pub time: Vec<f64>,
    pub node_voltages: HashMap<String, Vec<f64>>,
    pub branch_currents: HashMap<String, Vec<f64>>,
    pub info: AnalysisInfo,
    pub dc_converged: bool,
}

/// Strips a `V(...)` or `I(...)` wrapper, returning the inner name and
/// which wrapper (if any) was present.
pub(crate) fn unwrap_query_key(key: &str) -> (Option<char>, &str) {
    let upper_prefix = key.as_bytes().first().map(|b| b.to_ascii_uppercase());
    if matches!(upper_prefix, Some(b'V') | Some(b'I')) && key.len() >= 3 && key.as_bytes()[1] == b'(' && key.ends_with(')')
    {
        (Some(upper_prefix.unwrap() as char), &key[2..key.len() - 1])
    } else {
        (None, key)
    }
}

impl TransientResult {
    /// Looks up a result series by key: the case-insensitive pseudo-key
    /// `"time"` returns the time vector;
    /// `V(name)` / a bare node name returns that node's voltage series;
    /// `I(name)` / a bare device name returns that device's branch-current
    /// series. Returns `None` if nothing matches.
    pub fn query(&self, key: &str) -> Option<&[f64]> {
        if key.eq_ignore_ascii_case("time") {
            return Some(&self.time);
        }
        let (wrapper, name) = unwrap_query_key(key);
        match wrapper {
            Some('V') => self.node_voltages.get(name).map(Vec::as_slice),
            Some('I') => self.branch_currents.get(name).map(Vec::as_slice),
            _ => self
                .node_voltages
                .get(name)
                .or_else(|| self.branch_currents.get(name))
                .map(Vec::as_slice),
        }
    }
}

/// Returning `true` from the progress callback cancels the run: the
/// in-flight step is discarded (not appended to the series) and the
/// series accumulated so far is returned.
pub type ProgressCallback<'a> = dyn FnMut(f64) -> bool + 'a;

pub fn run_transient(
    devices: &mut Vec<Box<dyn Device>>,
    params: &TransientParams,
    dc_options: &DcOptions,
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> Result<TransientResult> {
    let assembler = Assembler::analyze(devices);
    for d in devices.iter_mut() {
        d.init_transient(params.h, params.method);
    }

    let dc = run_dc(devices, &assembler, dc_options)?;
    if !dc.converged {
        log::warn!("transient init: DC operating point at t_start did not converge, proceeding with last iterate");
    }
    let mut voltages = dc.voltages;
    let mut currents = dc.currents;
    for d in devices.iter_mut() {
        d.update_history(&voltages, &currents);
    }

    let mut time = vec![params.t_start];
    let mut node_voltages: HashMap<String, Vec<f64>> = assembler
        .nodes()
        .names_in_order()
        .iter()
        .map(|n| (n.to_string(), vec![*voltages.get(*n).unwrap_or(&0.0)]))
        .collect();
    let mut branch_currents: HashMap<String, Vec<f64>> = assembler
        .branches()
        .names_in_order()
        .iter()
        .map(|n| (n.to_string(), vec![*currents.get(*n).unwrap_or(&0.0)]))
        .collect();

    let mut t = params.t_start;
    let eps = params.h * 1e-6;
    while t + params.h <= params.t_stop + eps {
        let next_t = t + params.h;
        for d in devices.iter_mut() {
            d.update_companion_model();
        }
        let sys = assembler.build(devices, &voltages, next_t)?;
        let x = lu::solve(&sys.a, &sys.b)?;
        let new_voltages = assembler.extract_node_voltages(&x);
        let new_currents = assembler.extract_branch_currents(&x);

        if let Some(cb) = progress.as_deref_mut() {
            if cb(next_t) {
                break;
            }
        }

        for d in devices.iter_mut() {
            d.update_history(&new_voltages, &new_currents);
        }
        voltages = new_voltages;
        currents = new_currents;
        t = next_t;

        time.push(t);
        for (name, series) in node_voltages.iter_mut() {
            series.push(*voltages.get(name).unwrap_or(&0.0));
        }
        for (name, series) in branch_currents.iter_mut() {
            series.push(*currents.get(name).unwrap_or(&0.0));
        }
    }

    let info = AnalysisInfo {
        method: params.method,
        matrix_size: assembler.size(),
        num_nodes: assembler.nodes().len(),
        num_branch_sources: assembler.branches().len(),
        avg_step: params.h,
        min_step: params.h,
        max_step: params.h,
    };

    Ok(TransientResult {
        time,
        node_voltages,
        branch_currents,
        info,
        dc_converged: dc.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use circsim_core::IntegrationMethod;
    use circsim_devices::{Capacitor, Resistor, Transformer, VoltageSource, Winding};

    #[test]
    fn query_resolves_time_wrapped_and_bare_keys() {
        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 10.0)),
            Box::new(Resistor::new("R1", "in", "mid", 1000.0).unwrap()),
            Box::new(Resistor::new("R2", "mid", "0", 1000.0).unwrap()),
        ];
        let params = TransientParams::new(1e-4, 3e-4);
        let result = run_transient(&mut devices, &params, &DcOptions::default(), None).unwrap();

        assert_eq!(result.query("time").unwrap(), result.time.as_slice());
        assert_eq!(result.query("TIME").unwrap(), result.time.as_slice());
        assert_eq!(result.query("mid").unwrap(), result.node_voltages["mid"].as_slice());
        assert_eq!(result.query("V(mid)").unwrap(), result.node_voltages["mid"].as_slice());
        assert_eq!(result.query("v(mid)").unwrap(), result.node_voltages["mid"].as_slice());
        assert_eq!(result.query("I(V1)").unwrap(), result.branch_currents["V1"].as_slice());
        assert!(result.query("nonexistent").is_none());
    }

    #[test]
    fn coupled_inductor_history_drives_secondary_voltage() {
        // A transformer with a primary ramping current should induce a
        // nonzero open-circuit secondary voltage via the mutual-inductance
        // history term; before the fix described in DESIGN.md that history
        // was always read back as 0, regardless of the primary's actual
        // current (the matrix's own simultaneous coupling term still moved
        // the secondary somewhat, but the history-driven lag was absent).
        let mut t = Transformer::new(
            "T1",
            vec![
                Winding { name: "Lp".to_string(), a: "pm".to_string(), b: "0".to_string(), inductance: 1e-3 },
                Winding { name: "Ls".to_string(), a: "s1".to_string(), b: "0".to_string(), inductance: 1e-3 },
            ],
        )
        .unwrap();
        t.set_coupling(0, 1, 0.99);

        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 1.0)),
            Box::new(Resistor::new("R1", "in", "pm", 1.0).unwrap()),
        ];
        devices.extend(t.expand().unwrap());

        let params = TransientParams::new(1e-6, 20e-6);
        let result = run_transient(&mut devices, &params, &DcOptions::default(), None).unwrap();

        let s1 = &result.node_voltages["s1"];
        assert!(s1.iter().any(|v| v.abs() > 1e-6), "expected a nonzero induced secondary voltage, got {s1:?}");
    }

    #[test]
    fn rc_charging_matches_scenario_2() {
        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 5.0)),
            Box::new(Resistor::new("R1", "in", "cap", 1000.0).unwrap()),
            Box::new(Capacitor::new("C1", "cap", "0", 1e-6).unwrap()),
        ];
        let params = TransientParams::new(10e-6, 5e-3).with_method(IntegrationMethod::BackwardEuler);
        let result = run_transient(&mut devices, &params, &DcOptions::default(), None).unwrap();

        let idx_at = |target: f64| -> usize {
            result
                .time
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (**a - target).abs().partial_cmp(&(**b - target).abs()).unwrap())
                .unwrap()
                .0
        };
        let v = &result.node_voltages["cap"];
        assert!((v[idx_at(1e-3)] - 3.161).abs() / 3.161 < 0.02);
        assert!((v[idx_at(2e-3)] - 4.323).abs() / 4.323 < 0.02);
        assert!((v[idx_at(5e-3)] - 4.966).abs() / 4.966 < 0.02);
    }

    #[test]
    fn resistor_only_network_matches_dc_and_trapezoidal() {
        let mut devices: Vec<Box<dyn Device>> = vec![
            Box::new(VoltageSource::dc("V1", "in", "0", 10.0)),
            Box::new(Resistor::new("R1", "in", "mid", 1000.0).unwrap()),
            Box::new(Resistor::new("R2", "mid", "0", 1000.0).unwrap()),
        ];
        let params = TransientParams::new(1e-4, 1e-3).with_method(IntegrationMethod::Trapezoidal);
        let result = run_transient(&mut devices, &params, &DcOptions::default(), None).unwrap();
        for v in &result.node_voltages["mid"] {
            assert!((v - 5.0).abs() < 1e-9);
        }
    }
}
