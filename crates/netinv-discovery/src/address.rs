//! Hierarchical address assignment
//!
//! Addresses are `/`-joined segments following physical containment, for
//! example `0/1/3`. Chassis get one segment, modules and ports append their
//! contributing id to the path of their nearest addressed ancestor, and
//! power supplies get a `PP<parent>-<pos>` segment.

use std::collections::HashMap;
use tracing::{debug, warn};

use netinv_core::EntityClass;

use crate::context::DiscoveryContext;

/// Assigns addresses for one discovery run
#[derive(Debug)]
pub struct AddressBuilder {
    offset: u32,
    /// Parent paths already resolved, by node id
    cache: HashMap<u32, String>,
}

impl AddressBuilder {
    pub fn new(collision_offset: u32) -> Self {
        Self {
            offset: collision_offset,
            cache: HashMap::new(),
        }
    }

    /// Run every assignment stage in order
    pub fn assign_all(&mut self, ctx: &mut DiscoveryContext) {
        self.assign_chassis(ctx);
        self.assign_modules(ctx);
        self.assign_ports(ctx);
        self.assign_power_ports(ctx);
        debug!(addresses = ctx.paths.len(), "Addresses assigned");
    }

    /// A chassis address is its own contributing id, `-1` meaning the only chassis
    pub fn assign_chassis(&mut self, ctx: &mut DiscoveryContext) {
        for &chassis in &ctx.chassis {
            if ctx.is_excluded(chassis) {
                continue;
            }
            let mut address = ctx.contributing_id(chassis);
            if address == "-1" {
                address = "0".to_string();
            }
            ctx.paths.assign(chassis, address);
        }
    }

    pub fn assign_modules(&mut self, ctx: &mut DiscoveryContext) {
        // parent_path consults the module list, so it stays intact while addressing
        let modules = ctx.modules.clone();
        for &module in &modules {
            if ctx.is_excluded(module) {
                debug!(module, "Dropping excluded module");
                continue;
            }
            let address = format!("{}/{}", self.parent_path(ctx, module), ctx.contributing_id(module));
            ctx.paths.assign(module, address);
        }
        let exclusions = &ctx.exclusions;
        ctx.modules.retain(|&m| !exclusions.contains(m));
    }

    /// Ports that land on an existing address are moved by the collision offset
    pub fn assign_ports(&mut self, ctx: &mut DiscoveryContext) {
        let ports = std::mem::take(&mut ctx.ports);
        for port in ports {
            if ctx.is_excluded(port) {
                debug!(port, "Dropping excluded port");
                continue;
            }
            let candidate = format!("{}/{}", self.parent_path(ctx, port), ctx.contributing_id(port));
            let address = self.resolve_collision(ctx, candidate);
            ctx.paths.assign(port, address);
            ctx.ports.push(port);
        }
    }

    /// Address power supplies under their parent's path.
    ///
    /// A supply nested inside another listed supply is not a separate power
    /// port and is dropped.
    pub fn assign_power_ports(&mut self, ctx: &mut DiscoveryContext) {
        let listed = std::mem::take(&mut ctx.power_supplies);
        for &supply in &listed {
            if ctx.is_excluded(supply) {
                debug!(supply, "Dropping excluded power supply");
                continue;
            }
            let Some(node) = ctx.node(supply) else {
                continue;
            };
            let Some(parent) = ctx.node(node.parent_id) else {
                warn!(supply, parent = node.parent_id, "Power supply parent not found");
                continue;
            };
            if parent.class == EntityClass::PowerSupply && listed.contains(&parent.id) {
                debug!(supply, parent = parent.id, "Dropping nested power supply");
                continue;
            }

            let (parent_id, parent_pos, pos) = (parent.id, parent.parent_rel_pos, node.parent_rel_pos);
            let candidate = format!("{}/PP{}-{}", self.parent_path(ctx, parent_id), parent_pos, pos);
            let address = self.resolve_collision(ctx, candidate);
            ctx.paths.assign(supply, address);
            ctx.power_supplies.push(supply);
        }
    }

    /// Path of the nearest addressed ancestor of a node, extended with the
    /// ids of any module ancestors not yet addressed.
    ///
    /// Never fails: an unreachable ancestor contributes an empty path.
    pub fn parent_path(&mut self, ctx: &DiscoveryContext, id: u32) -> String {
        if let Some(cached) = self.cache.get(&id) {
            return cached.clone();
        }

        let mut segments = Vec::new();
        let mut current = id;
        let mut steps = 0;
        let base = loop {
            steps += 1;
            if steps > ctx.nodes.len() + 1 {
                warn!(id, "Parent walk did not terminate");
                break String::new();
            }
            if ctx.chassis.contains(&current) {
                break ctx.paths.get(current).unwrap_or_default().to_string();
            }
            let Some(node) = ctx.node(current) else {
                break String::new();
            };
            let parent = node.parent_id;
            if let Some(path) = ctx.paths.get(parent) {
                break path.to_string();
            }
            if ctx.node(parent).is_none() {
                break String::new();
            }
            if ctx.modules.contains(&parent) {
                segments.push(ctx.contributing_id(parent));
            }
            current = parent;
        };

        let mut path = base;
        for segment in segments.iter().rev() {
            path = format!("{}/{}", path, segment);
        }
        self.cache.insert(id, path.clone());
        path
    }

    fn resolve_collision(&self, ctx: &DiscoveryContext, mut address: String) -> String {
        while ctx.paths.contains_address(&address) {
            match bump_last_segment(&address, self.offset) {
                Some(next) => {
                    debug!(from = %address, to = %next, "Address collision resolved");
                    address = next;
                }
                None => {
                    warn!(address = %address, "Cannot offset non-numeric segment, keeping colliding address");
                    break;
                }
            }
        }
        address
    }
}

/// Add `offset` to the numeric last segment of an address
pub fn bump_last_segment(address: &str, offset: u32) -> Option<String> {
    let (head, last) = match address.rsplit_once('/') {
        Some((head, last)) => (Some(head), last),
        None => (None, address),
    };
    let value: i64 = last.trim().parse().ok()?;
    let bumped = value.checked_add(i64::from(offset))?;
    Some(match head {
        Some(head) => format!("{}/{}", head, bumped),
        None => bumped.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use netinv_core::EntityNode;

    fn node(id: u32, parent_id: u32, pos: i64, class: EntityClass) -> EntityNode {
        EntityNode {
            id,
            parent_id,
            class,
            vendor_type: String::new(),
            description: String::new(),
            name: String::new(),
            parent_rel_pos: pos,
        }
    }

    fn context(nodes: Vec<EntityNode>) -> DiscoveryContext {
        let mut ctx = DiscoveryContext::new();
        for n in nodes {
            ctx.retained.insert(n.id);
            match n.class {
                EntityClass::Chassis => ctx.chassis.push(n.id),
                EntityClass::Module => ctx.modules.push(n.id),
                EntityClass::Port => ctx.ports.push(n.id),
                EntityClass::PowerSupply => ctx.power_supplies.push(n.id),
                _ => {}
            }
            ctx.nodes.insert(n.id, n);
        }
        ctx
    }

    #[test]
    fn test_bump_last_segment() {
        assert_eq!(bump_last_segment("0/1/3", 1000), Some("0/1/1003".to_string()));
        assert_eq!(bump_last_segment("7", 1000), Some("1007".to_string()));
        assert_eq!(bump_last_segment("0/PP1-2", 1000), None);
    }

    #[test]
    fn test_hierarchy_through_container() {
        let mut ctx = context(vec![
            node(1, 0, -1, EntityClass::Chassis),
            node(2, 1, 3, EntityClass::Container),
            node(3, 2, 1, EntityClass::Module),
            node(4, 3, 1, EntityClass::Container),
            node(5, 4, 2, EntityClass::Module),
            node(6, 5, 7, EntityClass::Port),
        ]);
        let mut builder = AddressBuilder::new(1000);
        builder.assign_all(&mut ctx);

        assert_eq!(ctx.paths.get(1), Some("0"));
        assert_eq!(ctx.paths.get(3), Some("0/3"));
        // module 5 sits in container 4, which lends its position
        assert_eq!(ctx.paths.get(5), Some("0/3/1"));
        assert_eq!(ctx.paths.get(6), Some("0/3/1/7"));
    }

    #[test]
    fn test_unaddressed_module_resolved_on_demand() {
        // the sub-module is listed before its parent module
        let mut ctx = context(vec![
            node(1, 0, 1, EntityClass::Chassis),
            node(3, 2, 4, EntityClass::Module),
            node(2, 1, 2, EntityClass::Module),
        ]);
        ctx.modules = vec![3, 2];
        AddressBuilder::new(1000).assign_modules(&mut ctx);

        assert_eq!(ctx.paths.get(3), Some("1/2/4"));
        assert_eq!(ctx.paths.get(2), Some("1/2"));
    }

    #[test]
    fn test_port_collision_offset_repeats() {
        let mut ctx = context(vec![
            node(1, 0, -1, EntityClass::Chassis),
            node(10, 1, 1, EntityClass::Port),
            node(11, 1, 1, EntityClass::Port),
            node(12, 1, 1, EntityClass::Port),
        ]);
        AddressBuilder::new(1000).assign_all(&mut ctx);

        assert_eq!(ctx.paths.get(10), Some("0/1"));
        assert_eq!(ctx.paths.get(11), Some("0/1001"));
        assert_eq!(ctx.paths.get(12), Some("0/2001"));
    }

    #[test]
    fn test_excluded_entries_dropped() {
        let mut ctx = context(vec![
            node(1, 0, -1, EntityClass::Chassis),
            node(2, 1, 1, EntityClass::Module),
            node(3, 2, 1, EntityClass::Port),
        ]);
        ctx.exclusions.insert(2);
        ctx.exclusions.insert(3);
        AddressBuilder::new(1000).assign_all(&mut ctx);

        assert!(ctx.modules.is_empty());
        assert!(ctx.ports.is_empty());
        assert_eq!(ctx.paths.get(3), None);
    }

    #[test]
    fn test_power_ports() {
        let mut ctx = context(vec![
            node(1, 0, -1, EntityClass::Chassis),
            node(2, 1, 5, EntityClass::Container),
            node(3, 2, 1, EntityClass::PowerSupply),
            node(4, 3, 1, EntityClass::PowerSupply),
            node(5, 2, 2, EntityClass::PowerSupply),
        ]);
        AddressBuilder::new(1000).assign_all(&mut ctx);

        assert_eq!(ctx.power_supplies, vec![3, 5]);
        assert_eq!(ctx.paths.get(3), Some("0/PP5-1"));
        assert_eq!(ctx.paths.get(5), Some("0/PP5-2"));
        assert_eq!(ctx.paths.get(4), None);
    }

    #[test]
    fn test_unreachable_parent_gives_empty_path() {
        let ctx = context(vec![node(7, 42, 3, EntityClass::Port)]);
        let mut builder = AddressBuilder::new(1000);
        assert_eq!(builder.parent_path(&ctx, 7), "");
    }
}
