//! Exclusion propagation, containment repair and ancestor queries
//!
//! All of these operate on a loaded [`DiscoveryContext`]. The only
//! mutation of entity nodes in the whole engine happens in
//! [`DiscoveryContext::repair_dual_bay`].

use netinv_core::{EntityClass, EntityNode};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::Filters;
use crate::context::DiscoveryContext;
use crate::error::DiscoveryError;

const UPPER_BAY: &str = "uppermodulebay";
const LOWER_BAY: &str = "lowermodulebay";

impl DiscoveryContext {
    /// Merge a split module bay.
    ///
    /// Some devices report one module bay as two containers. When both the
    /// upper and the lower bay exist, the lower bay's children move under the
    /// upper bay, positioned after the upper bay's own children. Returns the
    /// number of re-parented nodes.
    pub fn repair_dual_bay(&mut self) -> usize {
        let mut containers: Vec<&EntityNode> = self
            .retained
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| n.class == EntityClass::Container)
            .collect();
        containers.sort_by_key(|n| (n.parent_rel_pos, n.id));

        let mut upper = None;
        let mut lower = None;
        for container in containers {
            let vendor_type = container.vendor_type.to_lowercase();
            if vendor_type.contains(UPPER_BAY) {
                upper = Some(container.id);
            }
            if vendor_type.contains(LOWER_BAY) {
                lower = Some(container.id);
            }
        }

        let (Some(upper), Some(lower)) = (upper, lower) else {
            return 0;
        };

        // Count before moving anything so the result does not depend on order
        let upper_count = self.children(upper).len() as i64;
        let mut moved = 0;
        for id in self.children(lower) {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let Some(shifted) = node.parent_rel_pos.checked_add(upper_count) else {
                warn!(
                    id,
                    position = node.parent_rel_pos,
                    "Relative position overflows after bay merge, left in place"
                );
                continue;
            };
            node.parent_id = upper;
            node.parent_rel_pos = shifted;
            moved += 1;
        }

        info!(upper, lower, moved, "Merged split module bay");
        moved
    }

    /// Fail on the first node whose parent chain loops back on itself
    pub fn check_acyclic(&self) -> Result<(), DiscoveryError> {
        let mut cleared: HashSet<u32> = HashSet::new();

        for &start in self.nodes.keys() {
            let mut path: HashSet<u32> = HashSet::new();
            let mut current = start;
            loop {
                if cleared.contains(&current) {
                    break;
                }
                if !path.insert(current) {
                    return Err(DiscoveryError::ParentCycle(current));
                }
                match self.nodes.get(&current) {
                    Some(node) if !node.is_root_adjacent() => current = node.parent_id,
                    _ => break,
                }
            }
            cleared.extend(path);
        }
        Ok(())
    }

    /// Exclude retained nodes whose parent is missing or excluded.
    ///
    /// Nodes are visited from the highest relative position down. The pass
    /// repeats until nothing changes, so calling this again on a converged
    /// context is a no-op. Root-adjacent nodes have no parent to check.
    /// Returns the number of newly excluded nodes.
    pub fn propagate_exclusions(&mut self) -> usize {
        let mut order: Vec<(i64, u32, u32)> = self
            .retained
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|n| !n.is_root_adjacent())
            .map(|n| (n.parent_rel_pos, n.id, n.parent_id))
            .collect();
        order.sort_unstable_by(|a, b| b.cmp(a));

        let mut added = 0;
        loop {
            let mut changed = false;
            for &(_, id, parent) in &order {
                if self.exclusions.contains(id) {
                    continue;
                }
                if !self.retained.contains(&parent) || self.exclusions.contains(parent) {
                    debug!(id, parent, "Excluding descendant of missing or excluded parent");
                    self.exclusions.insert(id);
                    added += 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        if added > 0 {
            info!(added, total = self.exclusions.len(), "Exclusions propagated");
        }
        added
    }

    /// Module ancestors of a node, nearest first.
    ///
    /// The walk stops at the first chassis. Other classes are stepped over.
    pub fn module_ancestors(&self, id: u32) -> Vec<u32> {
        let mut modules = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.parent_of(id);

        while let Some(parent) = current {
            if !seen.insert(parent.id) {
                break;
            }
            match parent.class {
                EntityClass::Chassis => break,
                EntityClass::Module => modules.push(parent.id),
                _ => {}
            }
            current = self.parent_of(parent.id);
        }
        modules
    }

    /// The segment a node contributes to its own address.
    ///
    /// Transparent parents lend their position to the child. A skipped or
    /// excluded parent hands the question up to its own parent.
    pub fn contributing_id(&self, id: u32) -> String {
        let mut current = id;
        let mut seen = HashSet::new();

        loop {
            let Some(node) = self.nodes.get(&current) else {
                return String::new();
            };
            let Some(parent) = self.parent_of(current) else {
                return node.parent_rel_pos.to_string();
            };

            if parent.class.is_transparent() {
                return parent.parent_rel_pos.to_string();
            }
            if (self.skipped_modules.contains(&parent.id) || self.exclusions.contains(parent.id))
                && seen.insert(parent.id)
            {
                current = parent.id;
                continue;
            }
            return node.parent_rel_pos.to_string();
        }
    }

    /// Collect the module ancestors of every discovered port.
    ///
    /// Modules whose vendor type matches the module exclude pattern are
    /// recorded as skipped and become transparent for addressing.
    pub fn collect_modules(&mut self, filters: &Filters) {
        let ports: Vec<u32> = self.ports.clone();
        for port in ports {
            for module in self.module_ancestors(port) {
                if self.modules.contains(&module) || self.skipped_modules.contains(&module) {
                    continue;
                }
                let Some(node) = self.nodes.get(&module) else {
                    continue;
                };
                if filters.is_excluded_module(&node.vendor_type) {
                    debug!(module, vendor_type = %node.vendor_type, "Module skipped by pattern");
                    self.skipped_modules.insert(module);
                } else if !self.exclusions.contains(module) {
                    self.modules.push(module);
                }
            }
        }
        debug!(
            modules = self.modules.len(),
            skipped = self.skipped_modules.len(),
            "Modules collected"
        );
    }

    fn parent_of(&self, id: u32) -> Option<&EntityNode> {
        let node = self.nodes.get(&id)?;
        if node.is_root_adjacent() {
            return None;
        }
        self.nodes.get(&node.parent_id)
    }
}
