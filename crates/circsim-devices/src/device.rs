//! The `Device` contract.
//!
//! Every built-in device variant implements one trait, queried once per
//! device during the MNA assembler's analysis pass: whether it needs a
//! branch-current unknown is a property of the device variant declared at
//! construction, not a runtime type match. The trait is also the open
//! extension point for user-defined devices — dispatch is dynamic (`Box<dyn
//! Device>`) so the assembler never needs to know the concrete set of
//! device types at compile time.

use std::collections::HashMap;

use circsim_core::{IntegrationMethod, Result, StampContext};

/// Distinguishes ordinary devices from the two meta-devices that expand
/// into primitives before ever reaching the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Primitive,
    MetaTransformer,
    MetaThreePhase,
}

pub trait Device: std::fmt::Debug {
    fn name(&self) -> &str;

    /// Ordered terminal node names.
    fn terminals(&self) -> Vec<String>;

    /// `DeviceKind::Primitive` unless this is a meta-device.
    fn kind(&self) -> DeviceKind {
        DeviceKind::Primitive
    }

    /// For meta-devices: the primitives this expands into. Called exactly
    /// once, at construction/add time, never during analysis.
    fn expand(&self) -> Option<Vec<Box<dyn Device>>> {
        None
    }

    /// Whether the MNA assembler must allocate a branch-current unknown
    /// for this device (voltage sources and other devices whose stamp
    /// needs a KCL/KVL-coupled row of their own).
    fn needs_branch_variable(&self) -> bool {
        false
    }

    /// Accumulate this device's contribution into `(A, b)`. Must be
    /// additive and side-effect-free on `self` — any state used here (e.g.
    /// a switch's previous `V_ds`) is refreshed beforehand via
    /// [`Device::pre_stamp`], never inside `stamp` itself.
    fn stamp(&self, ctx: &mut StampContext) -> Result<()>;

    /// Whether this device's stamp depends on state from a previous
    /// iterate (switches, diodes, voltage-controlled MOSFETs).
    fn is_nonlinear(&self) -> bool {
        false
    }

    /// For nonlinear devices: recompute internal operating-point state
    /// (e.g. `V_ds`, region) from the last accepted/iterated node
    /// voltages, before the next `stamp` call reads it.
    fn pre_stamp(&mut self, _voltages: &HashMap<String, f64>) {}

    /// Allocate/clear history and precompute companion coefficients for a
    /// transient run.
    fn init_transient(&mut self, _h: f64, _method: IntegrationMethod) {}

    /// Refresh companion-model coefficients (equivalent conductance /
    /// resistance and history sources) from the last accepted state,
    /// before the next build pass.
    fn update_companion_model(&mut self) {}

    /// Record the just-solved step's result as history for the next step.
    fn update_history(&mut self, _voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) {}

    /// Instantaneous power dissipated/delivered, if this device type
    /// defines one.
    fn power(&self, _voltages: &HashMap<String, f64>, _currents: &HashMap<String, f64>) -> Option<f64> {
        None
    }

    /// Free-form operating-status fields a device may expose in a stepped
    /// record.
    fn status(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Drive a switch-like device's gate state. Devices that do not have
    /// one return a validation error.
    fn set_gate_state(&mut self, _on: bool) -> Result<()> {
        Err(circsim_core::Error::Validation(format!(
            "device {:?} does not expose a gate state",
            self.name()
        )))
    }

    /// Drive an independent source's instantaneous/DC value.
    fn set_value(&mut self, _v: f64) -> Result<()> {
        Err(circsim_core::Error::Validation(format!(
            "device {:?} does not expose a settable value",
            self.name()
        )))
    }

    /// The branch-current device's name, if it resolves its own branch
    /// row — used by CCCS/CCVS to find a controlling device's current at
    /// assembly time. Most devices don't need this; it defaults to the
    /// device's own name.
    fn branch_name(&self) -> &str {
        self.name()
    }

    /// The component's characteristic value (resistance, capacitance,
    /// inductance), for the non-fatal "implausibly small/large value"
    /// advisory a circuit validator runs over the device list. `None` for
    /// device types with no single characteristic magnitude (sources,
    /// controlled sources, switches, diodes).
    fn characteristic_value(&self) -> Option<f64> {
        None
    }
}
