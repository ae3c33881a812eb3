//! Resource descriptors and attribute records emitted by discovery
//!
//! These are append-only output values. Each discovered element is built as
//! one of the `*Resource` structs, which knows its own descriptor and the
//! attribute records it contributes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of discovered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Chassis,
    Module,
    SubModule,
    Port,
    PowerPort,
    PortChannel,
}

impl ResourceCategory {
    /// Model name reported for resources of this kind
    pub fn generic_model(self) -> &'static str {
        match self {
            Self::Chassis => "Generic Chassis",
            Self::Module => "Generic Module",
            Self::SubModule => "Generic Sub Module",
            Self::Port => "Generic Port",
            Self::PowerPort => "Generic Power Port",
            Self::PortChannel => "Generic Port Channel",
        }
    }
}

/// Identity of one discovered resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub category: ResourceCategory,
    pub model: String,
    pub name: String,
    /// Hierarchical address, e.g. `0/1/3`
    pub address: String,
    pub unique_id: String,
}

/// A named attribute value attached to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub address: String,
    pub name: String,
    pub value: String,
}

impl AttributeRecord {
    pub fn new(address: &str, name: &str, value: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Output of one discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub resources: Vec<ResourceDescriptor>,
    pub attributes: Vec<AttributeRecord>,
}

impl DiscoveryResult {
    /// Result for a device with no usable chassis
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.attributes.is_empty()
    }

    /// Append a resource and its attributes
    pub fn push(&mut self, resource: &dyn AutoloadResource, device_model: &str) {
        self.resources.push(resource.descriptor(device_model));
        self.attributes.extend(resource.attributes());
    }

    /// Find a resource by address
    pub fn resource(&self, address: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.address == address)
    }

    /// Find an attribute value by address and name
    pub fn attribute(&self, address: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.address == address && a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Stable identifier for a resource: first 16 hex digits of
/// SHA-256 over device model, resource model and address.
pub fn unique_id(device_model: &str, model: &str, address: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(device_model.as_bytes());
    hasher.update(b"|");
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(address.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// A discovered element that can describe itself
pub trait AutoloadResource {
    fn category(&self) -> ResourceCategory;
    fn name(&self) -> String;
    fn address(&self) -> &str;
    fn attributes(&self) -> Vec<AttributeRecord>;

    fn descriptor(&self, device_model: &str) -> ResourceDescriptor {
        let model = self.category().generic_model();
        ResourceDescriptor {
            category: self.category(),
            model: model.to_string(),
            name: self.name(),
            address: self.address().to_string(),
            unique_id: unique_id(device_model, model, self.address()),
        }
    }
}

/// Attribute names
pub mod attr {
    pub const MODEL: &str = "Model";
    pub const SERIAL_NUMBER: &str = "Serial Number";
    pub const VERSION: &str = "Version";
    pub const PORT_DESCRIPTION: &str = "Port Description";
    pub const L2_PROTOCOL_TYPE: &str = "L2 Protocol Type";
    pub const MAC_ADDRESS: &str = "MAC Address";
    pub const MTU: &str = "MTU";
    pub const BANDWIDTH: &str = "Bandwidth";
    pub const IPV4_ADDRESS: &str = "IPv4 Address";
    pub const IPV6_ADDRESS: &str = "IPv6 Address";
    pub const DUPLEX: &str = "Duplex";
    pub const AUTO_NEGOTIATION: &str = "Auto Negotiation";
    pub const ADJACENT: &str = "Adjacent";
    pub const ASSOCIATED_PORTS: &str = "Associated Ports";
    pub const SYSTEM_NAME: &str = "System Name";
    pub const VENDOR: &str = "Vendor";
    pub const LOCATION: &str = "Location";
    pub const CONTACT_NAME: &str = "Contact Name";
    pub const OS_VERSION: &str = "OS Version";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChassisResource {
    pub address: String,
    pub model: String,
    pub serial_number: String,
}

impl AutoloadResource for ChassisResource {
    fn category(&self) -> ResourceCategory {
        ResourceCategory::Chassis
    }

    fn name(&self) -> String {
        format!("Chassis {}", self.address)
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn attributes(&self) -> Vec<AttributeRecord> {
        vec![
            AttributeRecord::new(&self.address, attr::MODEL, &self.model),
            AttributeRecord::new(&self.address, attr::SERIAL_NUMBER, &self.serial_number),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResource {
    pub name: String,
    pub address: String,
    /// Nested below another module
    pub sub_module: bool,
    pub model: String,
    pub version: String,
    pub serial_number: String,
}

impl AutoloadResource for ModuleResource {
    fn category(&self) -> ResourceCategory {
        if self.sub_module {
            ResourceCategory::SubModule
        } else {
            ResourceCategory::Module
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn attributes(&self) -> Vec<AttributeRecord> {
        vec![
            AttributeRecord::new(&self.address, attr::MODEL, &self.model),
            AttributeRecord::new(&self.address, attr::VERSION, &self.version),
            AttributeRecord::new(&self.address, attr::SERIAL_NUMBER, &self.serial_number),
        ]
    }
}

/// Link duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Duplex {
    #[default]
    Full,
    Half,
}

impl std::fmt::Display for Duplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "Full"),
            Self::Half => write!(f, "Half"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortResource {
    pub name: String,
    pub address: String,
    pub l2_protocol_type: String,
    pub mac: String,
    pub mtu: i64,
    pub bandwidth: i64,
    pub description: String,
    pub adjacent: String,
    pub duplex: Duplex,
    pub auto_negotiation: bool,
    pub ipv4_address: String,
    pub ipv6_address: String,
}

impl AutoloadResource for PortResource {
    fn category(&self) -> ResourceCategory {
        ResourceCategory::Port
    }

    fn name(&self) -> String {
        self.name.replace('/', "-")
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn attributes(&self) -> Vec<AttributeRecord> {
        let auto_negotiation = if self.auto_negotiation { "True" } else { "False" };
        vec![
            AttributeRecord::new(&self.address, attr::PORT_DESCRIPTION, &self.description),
            AttributeRecord::new(&self.address, attr::L2_PROTOCOL_TYPE, &self.l2_protocol_type),
            AttributeRecord::new(&self.address, attr::MAC_ADDRESS, &self.mac),
            AttributeRecord::new(&self.address, attr::MTU, self.mtu.to_string()),
            AttributeRecord::new(&self.address, attr::BANDWIDTH, self.bandwidth.to_string()),
            AttributeRecord::new(&self.address, attr::DUPLEX, self.duplex.to_string()),
            AttributeRecord::new(&self.address, attr::AUTO_NEGOTIATION, auto_negotiation),
            AttributeRecord::new(&self.address, attr::ADJACENT, &self.adjacent),
            AttributeRecord::new(&self.address, attr::IPV4_ADDRESS, &self.ipv4_address),
            AttributeRecord::new(&self.address, attr::IPV6_ADDRESS, &self.ipv6_address),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerPortResource {
    pub name: String,
    pub address: String,
    pub model: String,
    pub description: String,
    pub version: String,
    pub serial_number: String,
}

impl AutoloadResource for PowerPortResource {
    fn category(&self) -> ResourceCategory {
        ResourceCategory::PowerPort
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn attributes(&self) -> Vec<AttributeRecord> {
        vec![
            AttributeRecord::new(&self.address, attr::MODEL, &self.model),
            AttributeRecord::new(&self.address, attr::PORT_DESCRIPTION, &self.description),
            AttributeRecord::new(&self.address, attr::VERSION, &self.version),
            AttributeRecord::new(&self.address, attr::SERIAL_NUMBER, &self.serial_number),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortChannelResource {
    pub name: String,
    pub address: String,
    pub description: String,
    /// Member interfaces, `; ` separated
    pub associated_ports: String,
    pub ipv4_address: String,
    pub ipv6_address: String,
}

impl AutoloadResource for PortChannelResource {
    fn category(&self) -> ResourceCategory {
        ResourceCategory::PortChannel
    }

    fn name(&self) -> String {
        self.name.replace('/', "-")
    }

    fn address(&self) -> &str {
        &self.address
    }

    fn attributes(&self) -> Vec<AttributeRecord> {
        vec![
            AttributeRecord::new(&self.address, attr::PORT_DESCRIPTION, &self.description),
            AttributeRecord::new(&self.address, attr::ASSOCIATED_PORTS, &self.associated_ports),
            AttributeRecord::new(&self.address, attr::IPV4_ADDRESS, &self.ipv4_address),
            AttributeRecord::new(&self.address, attr::IPV6_ADDRESS, &self.ipv6_address),
        ]
    }
}

/// Device-level attributes, attached to the root (empty) address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RootAttributes {
    pub system_name: String,
    pub vendor: String,
    pub model: String,
    pub location: String,
    pub contact: String,
    pub os_version: String,
}

impl RootAttributes {
    pub fn attributes(&self) -> Vec<AttributeRecord> {
        vec![
            AttributeRecord::new("", attr::SYSTEM_NAME, &self.system_name),
            AttributeRecord::new("", attr::VENDOR, &self.vendor),
            AttributeRecord::new("", attr::MODEL, &self.model),
            AttributeRecord::new("", attr::LOCATION, &self.location),
            AttributeRecord::new("", attr::CONTACT_NAME, &self.contact),
            AttributeRecord::new("", attr::OS_VERSION, &self.os_version),
        ]
    }
}
