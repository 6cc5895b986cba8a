//! Core MNA primitives for circsim: dense matrix/vector storage, node and
//! branch index maps, engineering-value parsing, waveform descriptors, and
//! the shared error type.
//!
//! This crate has no opinion about device behavior or solvers — it is the
//! vocabulary `circsim-devices` and `circsim-solver` build on.

pub mod engineering;
pub mod error;
pub mod matrix;
pub mod mna;
pub mod node;
pub mod waveform;

pub use engineering::parse_value;
pub use error::{Error, Result, Warning};
pub use matrix::{Matrix, Vector};
pub use mna::{IntegrationMethod, MnaSystem, StampContext};
pub use node::{BranchMap, NodeMap, is_ground};
pub use waveform::Waveform;
