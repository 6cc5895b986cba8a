//! Meta-devices: expanded into primitives once, before analysis, and never
//! stamped directly.

pub mod three_phase;
pub mod transformer;

pub use three_phase::{PhaseOrder, ThreePhaseSource, Topology};
pub use transformer::{Transformer, Winding};
