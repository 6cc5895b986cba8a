//! DC operating-point analysis: damped-Picard iteration over the
//! nonlinear stamps.

use std::collections::HashMap;

use circsim_core::{Result, Vector};
use circsim_devices::Device;

use crate::assembler::Assembler;
use crate::lu;

/// Fixed iteration/tolerance constants plus an optional damping factor
/// for the Picard update — default undamped, since the built-in device
/// models converge reliably without it and damping only slows down the
/// common case.
#[derive(Debug, Clone, Copy)]
pub struct DcOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub damping: Option<f64>,
}

impl Default for DcOptions {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-9,
            damping: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DcResult {
    pub voltages: HashMap<String, f64>,
    pub currents: HashMap<String, f64>,
    pub converged: bool,
    pub iterations: usize,
    pub power: HashMap<String, f64>,
}

impl DcResult {
    /// Single-point counterpart of [`crate::TransientResult::query`] — no
    /// `"time"` pseudo-key at a single operating point, but the same
    /// `V(name)`/`I(name)`/bare-name lookup.
    pub fn query(&self, key: &str) -> Option<f64> {
        let (wrapper, name) = crate::transient::unwrap_query_key(key);
        match wrapper {
            Some('V') => self.voltages.get(name).copied(),
            Some('I') => self.currents.get(name).copied(),
            _ => self.voltages.get(name).or_else(|| self.currents.get(name)).copied(),
        }
    }
}

/// Run the DC operating-point fixed-point loop to convergence or until
/// `max_iterations` is exhausted. Either outcome is reported via
/// `DcResult::converged` rather than raised as an error — a caller may
/// still want the best available iterate.
pub fn run_dc(devices: &mut [Box<dyn Device>], assembler: &Assembler, options: &DcOptions) -> Result<DcResult> {
    let mut voltages = assembler.extract_node_voltages(&Vector::zeros(assembler.size()));
    let mut currents: HashMap<String, f64> = HashMap::new();
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..options.max_iterations.max(1) {
        iterations = iter + 1;
        let sys = assembler.build(devices, &voltages, 0.0)?;
        let x = lu::solve(&sys.a, &sys.b)?;
        let mut new_voltages = assembler.extract_node_voltages(&x);
        let new_currents = assembler.extract_branch_currents(&x);

        if let Some(k) = options.damping {
            for (name, v) in new_voltages.iter_mut() {
                let old = *voltages.get(name).unwrap_or(&0.0);
                *v = old + k * (*v - old);
            }
        }

        let mut max_delta = 0.0_f64;
        for (name, v) in &new_voltages {
            let old = voltages.get(name).copied().unwrap_or(0.0);
            max_delta = max_delta.max((v - old).abs());
        }

        voltages = new_voltages;
        currents = new_currents;

        if max_delta < options.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        log::warn!(
            "DC operating point did not converge after {} iterations (max|delta V| did not drop below {:.1e})",
            iterations,
            options.tolerance
        );
    }

    let power = devices
        .iter()
        .filter_map(|d| d.power(&voltages, &currents).map(|p| (d.name().to_string(), p)))
        .collect();

    Ok(DcResult {
        voltages,
        currents,
        converged,
        iterations,
        power,
    })
}
