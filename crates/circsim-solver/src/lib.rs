//! MNA assembly, DC/transient/stepped analyzers, and the dense LU solver.

pub mod assembler;
pub mod dc;
pub mod lu;
pub mod stepped;
pub mod transient;

pub use assembler::Assembler;
pub use circsim_core::{Error, Result};
pub use dc::{DcOptions, DcResult, run_dc};
pub use lu::{LuFactorization, SINGULAR_THRESHOLD, solve};
pub use stepped::{ControlValue, StepRecord, SteppedDriver};
pub use transient::{AnalysisInfo, ProgressCallback, TransientParams, TransientResult, run_transient};
