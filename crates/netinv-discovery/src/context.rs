//! Per-run discovery state
//!
//! One [`DiscoveryContext`] is created for each run and passed explicitly to
//! every stage. Nothing in it outlives the run.

use netinv_core::EntityNode;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Entity ids known to be invalid. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(BTreeSet<u32>);

impl ExclusionSet {
    /// Mark an id excluded, returns true if it was not already
    pub fn insert(&mut self, id: u32) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Assigned addresses, one per addressed entity
#[derive(Debug, Clone, Default)]
pub struct RelativePaths {
    by_id: BTreeMap<u32, String>,
    by_address: HashMap<String, u32>,
}

impl RelativePaths {
    pub fn assign(&mut self, id: u32, address: String) {
        if let Some(previous) = self.by_id.insert(id, address.clone()) {
            self.by_address.remove(&previous);
        }
        self.by_address.insert(address, id);
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Whether any entity already owns this address
    pub fn contains_address(&self, address: &str) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.by_id.iter().map(|(id, address)| (*id, address.as_str()))
    }
}

/// Physical port to logical interface correspondence, 1:1
#[derive(Debug, Clone, Default)]
pub struct PortMapping {
    logical_by_physical: BTreeMap<u32, u32>,
    claimed: BTreeSet<u32>,
}

impl PortMapping {
    /// Claim a logical interface for a physical port. First claim wins.
    pub fn claim(&mut self, physical: u32, logical: u32) -> bool {
        if self.claimed.contains(&logical) || self.logical_by_physical.contains_key(&physical) {
            return false;
        }
        self.claimed.insert(logical);
        self.logical_by_physical.insert(physical, logical);
        true
    }

    pub fn logical(&self, physical: u32) -> Option<u32> {
        self.logical_by_physical.get(&physical).copied()
    }

    pub fn is_claimed(&self, logical: u32) -> bool {
        self.claimed.contains(&logical)
    }

    pub fn len(&self) -> usize {
        self.logical_by_physical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_by_physical.is_empty()
    }
}

/// Everything one discovery run knows about the device inventory
#[derive(Debug, Clone, Default)]
pub struct DiscoveryContext {
    /// Every classified row, retained or not
    pub nodes: BTreeMap<u32, EntityNode>,
    /// Rows of a structural class
    pub retained: BTreeSet<u32>,
    pub exclusions: ExclusionSet,
    /// Modules hidden by the module exclude pattern
    pub skipped_modules: BTreeSet<u32>,
    pub chassis: Vec<u32>,
    pub modules: Vec<u32>,
    pub ports: Vec<u32>,
    pub power_supplies: Vec<u32>,
    pub port_mapping: PortMapping,
    pub paths: RelativePaths,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: u32) -> Option<&EntityNode> {
        self.nodes.get(&id)
    }

    pub fn is_retained(&self, id: u32) -> bool {
        self.retained.contains(&id)
    }

    pub fn is_excluded(&self, id: u32) -> bool {
        self.exclusions.contains(id)
    }

    /// Retained children of a node, ordered by position then id
    pub fn children(&self, parent: u32) -> Vec<u32> {
        let mut children: Vec<&EntityNode> = self
            .retained
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| n.parent_id == parent)
            .collect();
        children.sort_by_key(|n| (n.parent_rel_pos, n.id));
        children.into_iter().map(|n| n.id).collect()
    }
}
