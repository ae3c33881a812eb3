//! Resource assembly
//!
//! Turns the addressed context into descriptors and attribute records.
//! Resources are appended in a fixed category order: chassis, modules,
//! ports, power ports, port channels.

use netinv_core::{
    mib, ChassisResource, DiscoveryResult, FieldType, ModuleResource, PortChannelResource,
    PortResource, PowerPortResource, Properties, PropertyValue, RowIndex, TableSource,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::context::DiscoveryContext;
use crate::correlate::{associated_ports, interface_details, ip_addresses, port_channels};
use crate::neighbors::adjacent;
use crate::tables::DeviceTables;

static TRAILING_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+$").expect("Invalid regex pattern"));

const PORT_FIELDS: &[(&str, FieldType)] = &[
    (mib::IF_TYPE, FieldType::Str),
    (mib::IF_PHYS_ADDRESS, FieldType::Str),
    (mib::IF_MTU, FieldType::Int),
    (mib::IF_SPEED, FieldType::Int),
];

pub struct Assembler<'a, S: TableSource + ?Sized> {
    source: &'a S,
    tables: &'a DeviceTables,
    ctx: &'a DiscoveryContext,
    device_model: &'a str,
}

impl<'a, S: TableSource + ?Sized> Assembler<'a, S> {
    pub fn new(
        source: &'a S,
        tables: &'a DeviceTables,
        ctx: &'a DiscoveryContext,
        device_model: &'a str,
    ) -> Self {
        Self {
            source,
            tables,
            ctx,
            device_model,
        }
    }

    /// Append every resource category to `result`
    pub fn assemble(&self, result: &mut DiscoveryResult) {
        self.chassis(result);
        self.modules(result);
        self.ports(result);
        self.power_ports(result);
        self.port_channels(result);
    }

    fn entity_property(&self, field: &str, id: u32) -> String {
        self.source
            .get_property(mib::ENTITY, field, &RowIndex::from(id))
    }

    pub fn chassis(&self, result: &mut DiscoveryResult) {
        info!("Start loading Chassis");
        for &chassis in &self.ctx.chassis {
            let (Some(address), Some(node)) = (self.ctx.paths.get(chassis), self.ctx.node(chassis))
            else {
                continue;
            };

            let mut model = self.entity_property(mib::ENT_MODEL_NAME, chassis);
            if model.is_empty() {
                model = node.description.clone();
            }
            let resource = ChassisResource {
                address: address.to_string(),
                model,
                serial_number: self.entity_property(mib::ENT_SERIAL_NUM, chassis),
            };
            result.push(&resource, self.device_model);
            info!(address = %address, descr = %node.description, "Added chassis");
        }
    }

    pub fn modules(&self, result: &mut DiscoveryResult) {
        info!("Start loading Modules");
        for &module in &self.ctx.modules {
            let (Some(address), Some(node)) = (self.ctx.paths.get(module), self.ctx.node(module))
            else {
                continue;
            };

            let index = self.ctx.contributing_id(module);
            let top_level = address.contains('/') && address.split('/').count() < 3;
            let name = if top_level {
                format!("Module {}", index)
            } else {
                format!("Sub Module {}", index)
            };

            let resource = ModuleResource {
                name,
                address: address.to_string(),
                sub_module: !top_level,
                model: node.description.clone(),
                version: self.entity_property(mib::ENT_SOFTWARE_REV, module),
                serial_number: self.entity_property(mib::ENT_SERIAL_NUM, module),
            };
            result.push(&resource, self.device_model);
            info!(address = %address, descr = %node.description, "Added module");
        }
    }

    pub fn ports(&self, result: &mut DiscoveryResult) {
        info!("Start loading Ports");
        for &port in &self.ctx.ports {
            let (Some(address), Some(node), Some(if_index)) = (
                self.ctx.paths.get(port),
                self.ctx.node(port),
                self.ctx.port_mapping.logical(port),
            ) else {
                continue;
            };

            let mut name = self
                .tables
                .interface_descr(if_index)
                .unwrap_or_default()
                .replace('\'', "");
            if name.is_empty() {
                name = node.name.clone();
            }
            if name.is_empty() {
                debug!(port, if_index, "Port has no usable name, skipping");
                continue;
            }

            let props = self.interface_properties(if_index);
            let (duplex, auto_negotiation) = interface_details(self.source, self.tables, if_index);
            let (ipv4_address, ipv6_address) = ip_addresses(self.tables, if_index);

            let resource = PortResource {
                name: name.clone(),
                address: address.to_string(),
                l2_protocol_type: text(&props, mib::IF_TYPE).replace(['/', '\''], ""),
                mac: text(&props, mib::IF_PHYS_ADDRESS),
                mtu: int(&props, mib::IF_MTU),
                bandwidth: int(&props, mib::IF_SPEED),
                description: self
                    .source
                    .get_property(mib::IF, mib::IF_ALIAS, &RowIndex::from(if_index)),
                adjacent: adjacent(self.tables, if_index),
                duplex,
                auto_negotiation,
                ipv4_address,
                ipv6_address,
            };
            result.push(&resource, self.device_model);
            info!(address = %address, name = %name, "Added port");
        }
    }

    fn interface_properties(&self, if_index: u32) -> Properties {
        let index = RowIndex::from(if_index);
        match self.source.get_properties(mib::IF, &index, PORT_FIELDS) {
            Ok(mut rows) => rows.remove(&index).unwrap_or_default(),
            Err(e) => {
                warn!(if_index, error = %e, "Failed to load interface properties");
                Properties::new()
            }
        }
    }

    pub fn power_ports(&self, result: &mut DiscoveryResult) {
        info!("Start loading Power Ports");
        for (ordinal, &supply) in self.ctx.power_supplies.iter().enumerate() {
            let (Some(address), Some(node)) = (self.ctx.paths.get(supply), self.ctx.node(supply))
            else {
                continue;
            };

            let resource = PowerPortResource {
                name: format!("PP{}", ordinal),
                address: address.to_string(),
                model: self.entity_property(mib::ENT_MODEL_NAME, supply),
                description: self.entity_property(mib::ENT_DESCR, supply),
                version: self.entity_property(mib::ENT_HARDWARE_REV, supply),
                serial_number: self.entity_property(mib::ENT_SERIAL_NUM, supply),
            };
            result.push(&resource, self.device_model);
            info!(address = %address, name = %node.name.trim(), "Added power port");
        }
    }

    pub fn port_channels(&self, result: &mut DiscoveryResult) {
        info!("Start loading Port Channels");
        for (if_index, descr) in port_channels(self.tables) {
            let Some(number) = TRAILING_DIGITS_RE.find(&descr) else {
                error!(name = %descr, "Adding port channel failed, name is invalid");
                continue;
            };

            let (ipv4_address, ipv6_address) = ip_addresses(self.tables, if_index);
            let resource = PortChannelResource {
                name: descr.clone(),
                address: format!("PC{}", number.as_str()),
                description: self
                    .source
                    .get_property(mib::IF, mib::IF_ALIAS, &RowIndex::from(if_index)),
                associated_ports: associated_ports(self.tables, if_index),
                ipv4_address,
                ipv6_address,
            };
            result.push(&resource, self.device_model);
            info!(address = %resource.address, name = %descr, "Added port channel");
        }
    }
}

fn text(props: &Properties, field: &str) -> String {
    props.get(field).map(PropertyValue::to_text).unwrap_or_default()
}

fn int(props: &Properties, field: &str) -> i64 {
    props.get(field).and_then(PropertyValue::as_int).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netinv_core::{attr, EntityClass, EntityNode, ResourceCategory, SnapshotSource};

    fn node(id: u32, parent_id: u32, pos: i64, class: EntityClass, name: &str) -> EntityNode {
        EntityNode {
            id,
            parent_id,
            class,
            vendor_type: String::new(),
            description: format!("{} descr", name),
            name: name.to_string(),
            parent_rel_pos: pos,
        }
    }

    fn fixture() -> (SnapshotSource, DiscoveryContext) {
        let source = SnapshotSource::new()
            .with_column(mib::IF, mib::IF_DESCR, 5u32, "GigabitEthernet1/0/1")
            .with_column(mib::IF, mib::IF_DESCR, 6u32, "Port-channel12")
            .with_column(mib::IF, mib::IF_DESCR, 7u32, "Port-channel")
            .with_column(mib::IF, mib::IF_TYPE, 5u32, "'ethernetCsmacd'")
            .with_column(mib::IF, mib::IF_MTU, 5u32, "1500")
            .with_column(mib::IF, mib::IF_SPEED, 5u32, "1000000000")
            .with_column(mib::IF, mib::IF_ALIAS, 5u32, "uplink")
            .with_column(mib::ENTITY, mib::ENT_SERIAL_NUM, 1u32, "FOC1234")
            .with_column(mib::ENTITY, mib::ENT_SOFTWARE_REV, 2u32, "1.2")
            .with_column(mib::LAG, mib::LAG_ATTACHED_AGG_ID, 5u32, "6");

        let mut ctx = DiscoveryContext::new();
        for n in [
            node(1, 0, -1, EntityClass::Chassis, "chassis"),
            node(2, 1, 1, EntityClass::Module, "module"),
            node(3, 2, 4, EntityClass::Module, "sub"),
            node(4, 3, 1, EntityClass::Port, "Gi1/0/1"),
            node(8, 1, 2, EntityClass::PowerSupply, "PS A"),
        ] {
            ctx.retained.insert(n.id);
            ctx.nodes.insert(n.id, n);
        }
        ctx.chassis = vec![1];
        ctx.modules = vec![2, 3];
        ctx.ports = vec![4];
        ctx.power_supplies = vec![8];
        ctx.port_mapping.claim(4, 5);
        ctx.paths.assign(1, "0".to_string());
        ctx.paths.assign(2, "0/1".to_string());
        ctx.paths.assign(3, "0/1/4".to_string());
        ctx.paths.assign(4, "0/1/4/1".to_string());
        ctx.paths.assign(8, "0/PP-1-2".to_string());
        (source, ctx)
    }

    fn assemble() -> DiscoveryResult {
        let (source, ctx) = fixture();
        let mut tables = DeviceTables::load_interfaces(&source).unwrap();
        tables.load_auxiliary(&source).unwrap();
        let mut result = DiscoveryResult::empty();
        Assembler::new(&source, &tables, &ctx, "Cisco3750").assemble(&mut result);
        result
    }

    #[test]
    fn test_category_order() {
        let result = assemble();
        let categories: Vec<ResourceCategory> = result.resources.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                ResourceCategory::Chassis,
                ResourceCategory::Module,
                ResourceCategory::SubModule,
                ResourceCategory::Port,
                ResourceCategory::PowerPort,
                ResourceCategory::PortChannel,
            ]
        );
    }

    #[test]
    fn test_chassis_model_falls_back_to_description() {
        let result = assemble();
        assert_eq!(result.attribute("0", attr::MODEL), Some("chassis descr"));
        assert_eq!(result.attribute("0", attr::SERIAL_NUMBER), Some("FOC1234"));
        assert_eq!(result.resource("0").unwrap().name, "Chassis 0");
    }

    #[test]
    fn test_module_naming() {
        let result = assemble();
        assert_eq!(result.resource("0/1").unwrap().name, "Module 1");
        assert_eq!(result.resource("0/1/4").unwrap().name, "Sub Module 4");
        assert_eq!(result.resource("0/1/4").unwrap().model, "Generic Sub Module");
        assert_eq!(result.attribute("0/1", attr::VERSION), Some("1.2"));
    }

    #[test]
    fn test_port_attributes() {
        let result = assemble();
        let port = result.resource("0/1/4/1").unwrap();
        assert_eq!(port.name, "GigabitEthernet1-0-1");
        assert_eq!(result.attribute("0/1/4/1", attr::L2_PROTOCOL_TYPE), Some("ethernetCsmacd"));
        assert_eq!(result.attribute("0/1/4/1", attr::MTU), Some("1500"));
        assert_eq!(result.attribute("0/1/4/1", attr::BANDWIDTH), Some("1000000000"));
        assert_eq!(result.attribute("0/1/4/1", attr::PORT_DESCRIPTION), Some("uplink"));
        assert_eq!(result.attribute("0/1/4/1", attr::DUPLEX), Some("Full"));
        assert_eq!(result.attribute("0/1/4/1", attr::AUTO_NEGOTIATION), Some("False"));
    }

    #[test]
    fn test_power_port_and_port_channel() {
        let result = assemble();
        assert_eq!(result.resource("0/PP-1-2").unwrap().name, "PP0");

        // "Port-channel" has no number and is skipped
        let channels: Vec<_> = result
            .resources
            .iter()
            .filter(|r| r.category == ResourceCategory::PortChannel)
            .collect();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].address, "PC12");
        assert_eq!(
            result.attribute("PC12", attr::ASSOCIATED_PORTS),
            Some("GigabitEthernet1-0-1")
        );
    }
}
