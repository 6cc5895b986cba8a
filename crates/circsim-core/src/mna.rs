//! The MNA linear system and the stamping context devices write into.

use crate::matrix::{Matrix, Vector};
use crate::node::{BranchMap, NodeMap};

/// Discretization method for reactive companion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    BackwardEuler,
    Trapezoidal,
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::BackwardEuler
    }
}

/// The square `(A, b)` pair a build pass produces, sized `N + M`.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    pub a: Matrix,
    pub b: Vector,
    size: usize,
}

impl MnaSystem {
    pub fn zeros(size: usize) -> Self {
        Self {
            a: Matrix::zeros(size, size),
            b: Vector::zeros(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Re-zero both `A` and `b` in place for the next build pass, without
    /// reallocating the backing storage.
    pub fn clear(&mut self) {
        self.a = Matrix::zeros(self.size, self.size);
        self.b = Vector::zeros(self.size);
    }
}

/// What a device's `stamp` implementation is handed: the matrix/vector to
/// accumulate into, the node/branch index maps to resolve its terminal and
/// controlling-device names against, and the current simulation time.
pub struct StampContext<'a> {
    pub a: &'a mut Matrix,
    pub b: &'a mut Vector,
    pub nodes: &'a NodeMap,
    pub branches: &'a BranchMap,
    pub time: f64,
}

impl<'a> StampContext<'a> {
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.index_of(name)
    }

    /// Absolute row/column for a branch-current device's name, i.e. `N +
    /// local_index`.
    pub fn branch_row(&self, name: &str) -> Option<usize> {
        self.branches
            .local_index_of(name)
            .map(|local| self.nodes.len() + local)
    }

    /// Stamp a two-terminal conductance `g` between `a` and `b`. Ground
    /// terminals (`None`) contribute nothing — the usual resistor recipe.
    pub fn stamp_conductance(&mut self, a: Option<usize>, b: Option<usize>, g: f64) {
        if let Some(i) = a {
            self.a.add_at(i, i, g);
        }
        if let Some(i) = b {
            self.a.add_at(i, i, g);
        }
        if let (Some(i), Some(j)) = (a, b) {
            self.a.add_at(i, j, -g);
            self.a.add_at(j, i, -g);
        }
    }

    /// Inject a current `i` flowing from `a` to `b` into the RHS:
    /// `RHS[a] -= i`, `RHS[b] += i`.
    pub fn stamp_current(&mut self, a: Option<usize>, b: Option<usize>, i: f64) {
        if let Some(idx) = a {
            self.b.add_at(idx, -i);
        }
        if let Some(idx) = b {
            self.b.add_at(idx, i);
        }
    }

    /// Stamp the KCL coupling of a branch-current unknown at row `branch`
    /// into its two terminal rows: `+1` at `(a, branch)`, `-1` at
    /// `(b, branch)`.
    pub fn stamp_branch_kcl(&mut self, a: Option<usize>, b: Option<usize>, branch: usize) {
        if let Some(i) = a {
            self.a.add_at(i, branch, 1.0);
        }
        if let Some(i) = b {
            self.a.add_at(i, branch, -1.0);
        }
    }

    /// Stamp the transpose KVL coupling: `+1` at `(branch, a)`, `-1` at
    /// `(branch, b)`.
    pub fn stamp_branch_kvl(&mut self, branch: usize, a: Option<usize>, b: Option<usize>) {
        if let Some(i) = a {
            self.a.add_at(branch, i, 1.0);
        }
        if let Some(i) = b {
            self.a.add_at(branch, i, -1.0);
        }
    }
}
