//! Facade / orchestrator: holds the device list, sequences DC and
//! transient analyses, and caches the last result per analysis kind.
//!
//! Netlist text parsing, a command-line front end, and report formatting
//! are out of scope here — this crate consumes an already-built device
//! list, as a programmatic builder or an external parser would produce
//! one.

use std::collections::HashMap;

use circsim_core::{Error, Result, Warning};
use circsim_devices::Device;
use circsim_solver::{
    Assembler, ControlValue, DcOptions, DcResult, StepRecord, SteppedDriver, TransientParams, TransientResult,
    run_dc as solver_run_dc, run_transient as solver_run_transient,
};

/// The last completed analysis of each kind, kept so a caller can query a
/// result without holding onto the return value itself.
#[derive(Debug, Clone)]
pub enum AnalysisResult {
    Dc(DcResult),
    Transient(TransientResult),
}

#[derive(Debug, Clone, Default)]
pub struct CircuitInfo {
    pub device_count: usize,
    pub node_count: usize,
    pub branch_count: usize,
    pub matrix_size: usize,
}

/// Bounds for the "implausibly small/large value" advisory (spec.md §7 kind
/// 5): well outside any realistic R/L/C magnitude, so only genuine typos
/// (stray/missing engineering suffix) trip it.
const IMPLAUSIBLY_SMALL_VALUE: f64 = 1e-15;
const IMPLAUSIBLY_LARGE_VALUE: f64 = 1e15;

/// Splice a device into `out`, expanding it first if it is a meta-device.
/// Expansion happens exactly once, at add time, never during analysis.
fn add_expanding(out: &mut Vec<Box<dyn Device>>, device: Box<dyn Device>) {
    match device.expand() {
        Some(primitives) => out.extend(primitives),
        None => out.push(device),
    }
}

pub struct Circuit {
    devices: Vec<Box<dyn Device>>,
    /// Passthrough model/parameter dictionaries an external parser or
    /// builder may want to stash alongside the device list — circsim does
    /// not interpret these itself.
    pub parameters: HashMap<String, String>,
    results: HashMap<String, AnalysisResult>,
    stepped: Option<SteppedDriver>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            parameters: HashMap::new(),
            results: HashMap::new(),
            stepped: None,
        }
    }

    /// Netlist text parsing is an external collaborator; this is the seam
    /// where it would plug in. Without one connected, any input is a
    /// validation error rather than a silent no-op.
    pub fn load_netlist(&mut self, _text: &str) -> Result<()> {
        Err(Error::Validation(
            "no netlist parser is connected; build the device list programmatically".to_string(),
        ))
    }

    pub fn add_component(&mut self, device: Box<dyn Device>) {
        add_expanding(&mut self.devices, device);
    }

    pub fn add_components(&mut self, devices: Vec<Box<dyn Device>>) {
        for d in devices {
            self.add_component(d);
        }
    }

    pub fn devices(&self) -> &[Box<dyn Device>] {
        &self.devices
    }

    pub fn get_circuit_info(&self) -> CircuitInfo {
        let assembler = Assembler::analyze(&self.devices);
        CircuitInfo {
            device_count: self.devices.len(),
            node_count: assembler.nodes().len(),
            branch_count: assembler.branches().len(),
            matrix_size: assembler.size(),
        }
    }

    /// Non-fatal advisories: floating (one-connection) nodes, a missing
    /// ground reference, and implausibly small/large component values.
    /// Never blocks analysis.
    pub fn validate_circuit(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let assembler = Assembler::analyze(&self.devices);
        let degrees = assembler.node_degrees(&self.devices);

        let has_ground = self
            .devices
            .iter()
            .flat_map(|d| d.terminals())
            .any(|t| circsim_core::is_ground(&t));
        if !has_ground {
            warnings.push(Warning::new("circuit has no ground reference (\"0\", \"gnd\", or \"GND\")"));
        }

        for (name, degree) in &degrees {
            if *degree < 2 {
                warnings.push(Warning::new(format!("node {name:?} has only one connection (floating)")));
            }
        }

        for d in &self.devices {
            if let Some(value) = d.characteristic_value() {
                if value.abs() < IMPLAUSIBLY_SMALL_VALUE {
                    warnings.push(Warning::new(format!(
                        "device {:?} has an implausibly small value ({value:e})",
                        d.name()
                    )));
                } else if value.abs() > IMPLAUSIBLY_LARGE_VALUE {
                    warnings.push(Warning::new(format!(
                        "device {:?} has an implausibly large value ({value:e})",
                        d.name()
                    )));
                }
            }
        }
        warnings
    }

    pub fn run_dc(&mut self, options: &DcOptions) -> Result<DcResult> {
        let assembler = Assembler::analyze(&self.devices);
        let result = solver_run_dc(&mut self.devices, &assembler, options)?;
        self.results.insert("dc".to_string(), AnalysisResult::Dc(result.clone()));
        Ok(result)
    }

    pub fn run_transient(&mut self, params: &TransientParams, dc_options: &DcOptions) -> Result<TransientResult> {
        let result = solver_run_transient(&mut self.devices, params, dc_options, None)?;
        self.results.insert("tran".to_string(), AnalysisResult::Transient(result.clone()));
        Ok(result)
    }

    /// Dispatches to [`Self::run_dc`] or [`Self::run_transient`] with
    /// default options when no specific command is given.
    pub fn run_analysis(&mut self, params: Option<&TransientParams>) -> Result<()> {
        match params {
            Some(p) => {
                self.run_transient(p, &DcOptions::default())?;
            }
            None => {
                self.run_dc(&DcOptions::default())?;
            }
        }
        Ok(())
    }

    pub fn init_stepped_transient(&mut self, params: &TransientParams, dc_options: DcOptions) -> Result<()> {
        let driver = SteppedDriver::init_stepped(
            &mut self.devices,
            params.h,
            params.t_start,
            params.t_stop,
            params.method,
            dc_options,
        )?;
        self.stepped = Some(driver);
        Ok(())
    }

    pub fn step(&mut self, controls: &HashMap<String, ControlValue>) -> Result<StepRecord> {
        let driver = self
            .stepped
            .as_mut()
            .ok_or_else(|| Error::Validation("stepped transient has not been initialized".to_string()))?;
        driver.step(&mut self.devices, controls)
    }

    pub fn is_finished(&self) -> bool {
        self.stepped.as_ref().is_none_or(SteppedDriver::is_finished)
    }

    pub fn get_result(&self, kind: &str) -> Option<&AnalysisResult> {
        self.results.get(kind)
    }

    /// Drops the device list, cached results, and any stepped driver. The
    /// circuit is left exactly as [`Self::new`] would produce it.
    pub fn reset(&mut self) {
        self.devices.clear();
        self.results.clear();
        self.stepped = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circsim_devices::{Resistor, VoltageSource};

    #[test]
    fn add_component_expands_meta_devices() {
        use circsim_devices::{PhaseOrder, ThreePhaseSource};
        let mut circuit = Circuit::new();
        circuit.add_component(Box::new(ThreePhaseSource::wye(
            "U1",
            230.0,
            50.0,
            PhaseOrder::Abc,
            "a",
            "b",
            "c",
            "n",
        )));
        assert_eq!(circuit.devices().len(), 3);
    }

    #[test]
    fn validate_circuit_flags_missing_ground() {
        let mut circuit = Circuit::new();
        circuit.add_component(Box::new(Resistor::new("R1", "a", "b", 1000.0).unwrap()));
        let warnings = circuit.validate_circuit();
        assert!(warnings.iter().any(|w| w.message.contains("ground")));
    }

    #[test]
    fn validate_circuit_flags_implausible_values() {
        let mut circuit = Circuit::new();
        circuit.add_component(Box::new(VoltageSource::dc("V1", "a", "0", 5.0)));
        circuit.add_component(Box::new(Resistor::new("R1", "a", "0", 1e20).unwrap()));
        let warnings = circuit.validate_circuit();
        assert!(warnings.iter().any(|w| w.message.contains("implausibly large")));
    }

    #[test]
    fn run_dc_caches_result_under_dc_kind() {
        let mut circuit = Circuit::new();
        circuit.add_component(Box::new(VoltageSource::dc("V1", "in", "0", 10.0)));
        circuit.add_component(Box::new(Resistor::new("R1", "in", "mid", 1000.0).unwrap()));
        circuit.add_component(Box::new(Resistor::new("R2", "mid", "0", 1000.0).unwrap()));
        circuit.run_dc(&DcOptions::default()).unwrap();
        assert!(matches!(circuit.get_result("dc"), Some(AnalysisResult::Dc(_))));
    }

    #[test]
    fn reset_drops_devices_and_results() {
        let mut circuit = Circuit::new();
        circuit.add_component(Box::new(Resistor::new("R1", "a", "0", 1000.0).unwrap()));
        circuit.run_dc(&DcOptions::default()).unwrap();
        circuit.reset();
        assert_eq!(circuit.devices().len(), 0);
        assert!(circuit.get_result("dc").is_none());
    }
}
