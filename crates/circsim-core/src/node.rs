//! Node and branch-current index maps.

use indexmap::IndexMap;

/// The three recognized ground aliases: `"0"`, `"gnd"`, `"GND"`.
/// No other casing is accepted — this is a fixed, small alias set, not a
/// case-insensitive match.
pub fn is_ground(name: &str) -> bool {
    matches!(name, "0" | "gnd" | "GND")
}

/// Assigns node names (excluding ground) to indices `0..N` by sorted
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    indices: IndexMap<String, usize>,
}

impl NodeMap {
    /// Build the map from every terminal name referenced by the device
    /// list. Ground aliases are dropped; every other distinct name gets an
    /// index assigned in sorted order.
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: Vec<&str> = names.into_iter().filter(|n| !is_ground(n)).collect();
        unique.sort_unstable();
        unique.dedup();
        let indices = unique
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), i))
            .collect();
        Self { indices }
    }

    /// `None` for ground, `Some(index)` for any other recognized node.
    /// A name that was never registered during `build` also yields `None`
    /// only if it is a ground alias; an unregistered non-ground name is a
    /// caller bug and panics, since the analysis pass must have seen every
    /// terminal of every device before any stamp is attempted.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if is_ground(name) {
            return None;
        }
        Some(
            *self
                .indices
                .get(name)
                .unwrap_or_else(|| panic!("node {name:?} was not registered during the analysis pass")),
        )
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Names in index order, for voltage-vector extraction.
    pub fn names_in_order(&self) -> Vec<&str> {
        let mut pairs: Vec<(&str, usize)> =
            self.indices.iter().map(|(n, &i)| (n.as_str(), i)).collect();
        pairs.sort_by_key(|&(_, i)| i);
        pairs.into_iter().map(|(n, _)| n).collect()
    }
}

/// Assigns branch-current device names to indices `N..N+M`, stored here as
/// the local `0..M` offset (the assembler adds `N`).
#[derive(Debug, Clone, Default)]
pub struct BranchMap {
    indices: IndexMap<String, usize>,
}

impl BranchMap {
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let indices = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n.to_string(), i))
            .collect();
        Self { indices }
    }

    pub fn local_index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn names_in_order(&self) -> Vec<&str> {
        let mut pairs: Vec<(&str, usize)> =
            self.indices.iter().map(|(n, &i)| (n.as_str(), i)).collect();
        pairs.sort_by_key(|&(_, i)| i);
        pairs.into_iter().map(|(n, _)| n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_aliases_excluded() {
        let map = NodeMap::build(["0", "gnd", "GND", "in", "out"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of("0"), None);
        assert_eq!(map.index_of("gnd"), None);
        assert_eq!(map.index_of("GND"), None);
    }

    #[test]
    fn sorted_insertion_order() {
        let map = NodeMap::build(["mid", "in", "out"]);
        assert_eq!(map.index_of("in"), Some(0));
        assert_eq!(map.index_of("mid"), Some(1));
        assert_eq!(map.index_of("out"), Some(2));
    }

    #[test]
    fn branch_map_preserves_insertion_order() {
        let map = BranchMap::build(["V1", "L1"]);
        assert_eq!(map.local_index_of("V1"), Some(0));
        assert_eq!(map.local_index_of("L1"), Some(1));
    }
}
