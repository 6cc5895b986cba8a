//! The MNA assembler: node/branch indexing and per-step stamp dispatch.

use std::collections::HashMap;

use circsim_core::{BranchMap, MnaSystem, NodeMap, Result, StampContext, Vector, is_ground};
use circsim_devices::Device;

/// Built once per simulation from the (already meta-expanded) device list.
#[derive(Debug, Clone)]
pub struct Assembler {
    nodes: NodeMap,
    branches: BranchMap,
}

impl Assembler {
    /// Analysis pass: collect every terminal name (ground excluded) and
    /// every branch-current device name, assigning indices.
    pub fn analyze(devices: &[Box<dyn Device>]) -> Self {
        let mut terminal_names: Vec<String> = Vec::new();
        let mut branch_names: Vec<String> = Vec::new();
        for d in devices {
            terminal_names.extend(d.terminals());
            if d.needs_branch_variable() {
                branch_names.push(d.name().to_string());
            }
        }
        let nodes = NodeMap::build(terminal_names.iter().map(|s| s.as_str()));
        let branches = BranchMap::build(branch_names.iter().map(|s| s.as_str()));
        Self { nodes, branches }
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn branches(&self) -> &BranchMap {
        &self.branches
    }

    pub fn size(&self) -> usize {
        self.nodes.len() + self.branches.len()
    }

    /// Build pass: zero `(A, b)`, run the nonlinear pre-stamp hook from the
    /// last accepted voltages, then visit every device exactly once.
    pub fn build(
        &self,
        devices: &mut [Box<dyn Device>],
        last_voltages: &HashMap<String, f64>,
        t: f64,
    ) -> Result<MnaSystem> {
        let mut sys = MnaSystem::zeros(self.size());
        for d in devices.iter_mut() {
            if d.is_nonlinear() {
                d.pre_stamp(last_voltages);
            }
        }
        let mut ctx = StampContext {
            a: &mut sys.a,
            b: &mut sys.b,
            nodes: &self.nodes,
            branches: &self.branches,
            time: t,
        };
        for d in devices.iter() {
            d.stamp(&mut ctx)?;
        }
        Ok(sys)
    }

    /// `name -> voltage` including the three ground aliases at `0.0`.
    pub fn extract_node_voltages(&self, x: &Vector) -> HashMap<String, f64> {
        let mut out = HashMap::with_capacity(self.nodes.len() + 3);
        for alias in ["0", "gnd", "GND"] {
            out.insert(alias.to_string(), 0.0);
        }
        for name in self.nodes.names_in_order() {
            let idx = self.nodes.index_of(name).expect("registered node");
            out.insert(name.to_string(), x.get(idx));
        }
        out
    }

    pub fn extract_branch_currents(&self, x: &Vector) -> HashMap<String, f64> {
        let mut out = HashMap::with_capacity(self.branches.len());
        for name in self.branches.names_in_order() {
            let local = self.branches.local_index_of(name).expect("registered branch");
            out.insert(name.to_string(), x.get(self.nodes.len() + local));
        }
        out
    }

    /// Floating-node advisory support: nodes that appear on exactly one
    /// device terminal.
    pub fn node_degrees(&self, devices: &[Box<dyn Device>]) -> HashMap<String, usize> {
        let mut degrees: HashMap<String, usize> = HashMap::new();
        for d in devices {
            for t in d.terminals() {
                if !is_ground(&t) {
                    *degrees.entry(t).or_insert(0) += 1;
                }
            }
        }
        degrees
    }
}
