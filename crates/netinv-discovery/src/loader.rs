//! Physical inventory loading and classification
//!
//! Each inventory row is classified once into a [`RowOutcome`]; the outcome
//! is then folded into the [`DiscoveryContext`], which indexes chassis,
//! ports and power supplies as it goes.

use netinv_core::{mib, EntityClass, EntityNode, FieldType, PropertyValue, RowIndex, TableSource};
use tracing::{debug, info, warn};

use crate::config::Filters;
use crate::context::DiscoveryContext;
use crate::correlate::map_physical_to_logical;
use crate::error::DiscoveryError;
use crate::tables::DeviceTables;

const CRITICAL_FIELDS: &[(&str, FieldType)] = &[
    (mib::ENT_CONTAINED_IN, FieldType::Str),
    (mib::ENT_CLASS, FieldType::Str),
    (mib::ENT_VENDOR_TYPE, FieldType::Str),
];

const DESCRIPTIVE_FIELDS: &[(&str, FieldType)] = &[
    (mib::ENT_DESCR, FieldType::Str),
    (mib::ENT_NAME, FieldType::Str),
];

/// Why a row was excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    MissingPosition,
    InvalidPosition(String),
    MissingParent,
    Blacklisted,
    QueryFailed(String),
}

/// Classification result for one inventory row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Excluded { id: u32, reason: ExclusionReason },
    /// Class unset and no vendor type to infer it from
    Unclassified { id: u32 },
    Classified(EntityNode),
}

pub struct EntityLoader<'a, S: TableSource + ?Sized> {
    source: &'a S,
    tables: &'a DeviceTables,
    filters: &'a Filters,
}

impl<'a, S: TableSource + ?Sized> EntityLoader<'a, S> {
    pub fn new(source: &'a S, tables: &'a DeviceTables, filters: &'a Filters) -> Self {
        Self {
            source,
            tables,
            filters,
        }
    }

    /// Walk the inventory table and fill the context
    pub fn load(&self, ctx: &mut DiscoveryContext) -> Result<(), DiscoveryError> {
        let positions = self
            .source
            .get_table(mib::ENTITY, mib::ENT_PARENT_REL_POS)?;
        if positions.is_empty() {
            return Err(DiscoveryError::EmptyInventory);
        }

        for (index, row) in &positions {
            let Some(id) = index.as_u32() else {
                warn!(index = %index, "Skipping inventory row with non-numeric index");
                continue;
            };
            let position = row
                .get(mib::ENT_PARENT_REL_POS)
                .map(String::as_str)
                .unwrap_or_default();

            let outcome = self.classify(id, index, position);
            self.apply(ctx, outcome);
        }

        info!(
            rows = positions.len(),
            retained = ctx.retained.len(),
            excluded = ctx.exclusions.len(),
            chassis = ctx.chassis.len(),
            ports = ctx.ports.len(),
            power_supplies = ctx.power_supplies.len(),
            "Entity table loaded"
        );
        Ok(())
    }

    /// Classify one row, fetching only what is needed to decide
    pub fn classify(&self, id: u32, index: &RowIndex, position: &str) -> RowOutcome {
        if position.trim().is_empty() {
            return RowOutcome::Excluded {
                id,
                reason: ExclusionReason::MissingPosition,
            };
        }
        let Ok(parent_rel_pos) = position.trim().parse::<i64>() else {
            return RowOutcome::Excluded {
                id,
                reason: ExclusionReason::InvalidPosition(position.to_string()),
            };
        };

        let critical = match self.fetch(index, CRITICAL_FIELDS) {
            Ok(fields) => fields,
            Err(reason) => return RowOutcome::Excluded { id, reason },
        };
        let contained_in = text(&critical, mib::ENT_CONTAINED_IN);
        let vendor_type = text(&critical, mib::ENT_VENDOR_TYPE);

        let Ok(parent_id) = contained_in.trim().parse::<u32>() else {
            return RowOutcome::Excluded {
                id,
                reason: ExclusionReason::MissingParent,
            };
        };
        if self.filters.is_blacklisted(&vendor_type) {
            return RowOutcome::Excluded {
                id,
                reason: ExclusionReason::Blacklisted,
            };
        }

        let descriptive = match self.fetch(index, DESCRIPTIVE_FIELDS) {
            Ok(fields) => fields,
            Err(reason) => return RowOutcome::Excluded { id, reason },
        };

        let class = match EntityClass::parse_wire(&text(&critical, mib::ENT_CLASS)) {
            Some(class) => class,
            None if vendor_type.is_empty() => return RowOutcome::Unclassified { id },
            None => EntityClass::infer_from_vendor_type(&vendor_type).unwrap_or(EntityClass::Unknown),
        };

        RowOutcome::Classified(EntityNode {
            id,
            parent_id,
            class,
            vendor_type,
            description: text(&descriptive, mib::ENT_DESCR),
            name: text(&descriptive, mib::ENT_NAME),
            parent_rel_pos,
        })
    }

    fn fetch(
        &self,
        index: &RowIndex,
        fields: &[(&str, FieldType)],
    ) -> Result<netinv_core::Properties, ExclusionReason> {
        self.source
            .get_properties(mib::ENTITY, index, fields)
            .map_err(|e| ExclusionReason::QueryFailed(e.to_string()))
            .map(|mut rows| rows.remove(index).unwrap_or_default())
    }

    /// Fold one outcome into the context
    pub fn apply(&self, ctx: &mut DiscoveryContext, outcome: RowOutcome) {
        let node = match outcome {
            RowOutcome::Excluded { id, reason } => {
                debug!(id, ?reason, "Entity excluded");
                ctx.exclusions.insert(id);
                return;
            }
            RowOutcome::Unclassified { id } => {
                debug!(id, "Entity has no class or vendor type");
                return;
            }
            RowOutcome::Classified(node) => node,
        };

        let id = node.id;
        if node.class.is_structural() {
            ctx.retained.insert(id);
        }

        match node.class {
            EntityClass::Chassis => ctx.chassis.push(id),
            EntityClass::PowerSupply => ctx.power_supplies.push(id),
            EntityClass::Port => self.register_port(ctx, &node),
            _ => {}
        }

        ctx.nodes.insert(id, node);
    }

    /// Add a port if it is discoverable and maps to an unclaimed interface
    fn register_port(&self, ctx: &mut DiscoveryContext, node: &EntityNode) {
        if self.filters.is_excluded_port(&node.name, &node.description) {
            debug!(id = node.id, name = %node.name, "Port matches exclude pattern");
            return;
        }

        let Some(logical) = map_physical_to_logical(self.source, self.tables, node.id, &node.description)
        else {
            debug!(id = node.id, descr = %node.description, "No interface for port");
            return;
        };

        if !self.tables.has_interface(logical) {
            debug!(id = node.id, logical, "Mapped interface missing from interface table");
            return;
        }

        if ctx.port_mapping.claim(node.id, logical) {
            ctx.ports.push(node.id);
        } else {
            debug!(id = node.id, logical, "Interface already claimed by another port");
        }
    }
}

fn text(fields: &netinv_core::Properties, name: &str) -> String {
    fields
        .get(name)
        .map(PropertyValue::to_text)
        .unwrap_or_default()
}
