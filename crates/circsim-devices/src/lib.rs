//! Device models and MNA stamps for circsim.
//!
//! - Passive elements: R, C, L
//! - Independent sources: V, I with time-varying waveforms
//! - Linear controlled sources: VCVS (E), VCCS (G), CCCS (F), CCVS (H)
//! - Switch-level MOSFET with body diode, ideal diode, and a level-1-like
//!   voltage-controlled MOSFET
//! - Meta-devices: multi-winding transformer, three-phase source

pub mod controlled;
pub mod device;
pub mod diode;
pub mod meta;
pub mod passive;
pub mod sources;
pub mod switch;
pub mod vmosfet;

pub use circsim_core::{Error, Result};
pub use controlled::{Cccs, Ccvs, Vccs, Vcvs};
pub use device::{Device, DeviceKind};
pub use diode::IdealDiode;
pub use meta::{PhaseOrder, ThreePhaseSource, Topology, Transformer, Winding};
pub use passive::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, VoltageSource};
pub use switch::SwitchMosfet;
pub use vmosfet::{Region, VoltageControlledMosfet};
