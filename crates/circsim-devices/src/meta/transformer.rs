//! Multi-winding transformer meta-device.
//!
//! Holds `K` inductors and a `K x K` coupling-coefficient matrix. At
//! expansion time each inductor is handed the list of
//! `{other_inductor, mutual_inductance}` pairs it needs — as an index +
//! scalar into a shared vector, never an owning pointer, since the
//! inductors it expands into are independently owned `Box<dyn Device>`
//! values once handed to the assembler.

use circsim_core::Error;

use crate::device::{Device, DeviceKind};
use crate::passive::Inductor;

/// One winding: a name, its two terminal nodes, and its self-inductance.
#[derive(Debug, Clone)]
pub struct Winding {
    pub name: String,
    pub a: String,
    pub b: String,
    pub inductance: f64,
}

#[derive(Debug, Clone)]
pub struct Transformer {
    name: String,
    windings: Vec<Winding>,
    /// Row-major `K x K` coupling coefficients; only the upper triangle is
    /// consulted — coupling is always stored symmetrically by
    /// `set_coupling`.
    coupling: Vec<f64>,
}

impl Transformer {
    pub fn new(name: impl Into<String>, windings: Vec<Winding>) -> circsim_core::Result<Self> {
        let k = windings.len();
        if k < 2 {
            return Err(Error::Validation(
                "transformer requires at least two windings".to_string(),
            ));
        }
        for w in &windings {
            if w.a == w.b {
                return Err(Error::Validation(format!(
                    "winding {:?} has identical terminals {:?}",
                    w.name, w.a
                )));
            }
            if w.inductance < 0.0 {
                return Err(Error::Validation(format!(
                    "winding {:?} has negative inductance",
                    w.name
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            windings,
            coupling: vec![0.0; k * k],
        })
    }

    /// Set `k_ij` for windings `i` and `j` (clamped to `[-1, 1]` when
    /// expanded); stored symmetrically.
    pub fn set_coupling(&mut self, i: usize, j: usize, k_ij: f64) {
        let n = self.windings.len();
        self.coupling[i * n + j] = k_ij;
        self.coupling[j * n + i] = k_ij;
    }
}

impl Device for Transformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<String> {
        self.windings.iter().flat_map(|w| [w.a.clone(), w.b.clone()]).collect()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::MetaTransformer
    }

    fn expand(&self) -> Option<Vec<Box<dyn Device>>> {
        let n = self.windings.len();
        let mut inductors: Vec<Inductor> = self
            .windings
            .iter()
            .map(|w| Inductor::new(&w.name, &w.a, &w.b, w.inductance).expect("winding terminals/inductance validated in Transformer::new"))
            .collect();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let k_ij = self.coupling[i * n + j];
                if k_ij != 0.0 {
                    let other_inductance = self.windings[j].inductance;
                    inductors[i].couple_with(&self.windings[j].name, k_ij, other_inductance);
                }
            }
        }
        Some(inductors.into_iter().map(|l| Box::new(l) as Box<dyn Device>).collect())
    }

    fn stamp(&self, _ctx: &mut circsim_core::StampContext) -> circsim_core::Result<()> {
        Err(Error::Validation(format!(
            "transformer {:?} must be expanded before analysis",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_produces_one_inductor_per_winding() {
        let mut t = Transformer::new(
            "T1",
            vec![
                Winding { name: "Lp".to_string(), a: "p1".to_string(), b: "p2".to_string(), inductance: 1e-3 },
                Winding { name: "Ls".to_string(), a: "s1".to_string(), b: "s2".to_string(), inductance: 4e-3 },
            ],
        )
        .unwrap();
        t.set_coupling(0, 1, 0.99);
        let expanded = t.expand().unwrap();
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn rejects_single_winding() {
        assert!(Transformer::new(
            "T1",
            vec![Winding { name: "Lp".to_string(), a: "p1".to_string(), b: "p2".to_string(), inductance: 1e-3 }]
        )
        .is_err());
    }
}
