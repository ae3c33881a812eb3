//! Physical inventory entities and their classification

use serde::{Deserialize, Serialize};

/// Physical class of an inventory row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityClass {
    Other,
    Unknown,
    Chassis,
    Backplane,
    Container,
    PowerSupply,
    Fan,
    Sensor,
    Module,
    Port,
    Stack,
    Cpu,
}

impl EntityClass {
    /// Parse the class as reported by the device.
    ///
    /// Accepts the symbolic name (`chassis`, `'port'`, `powerSupply(6)`) or the
    /// numeric code. Returns `None` when the device left the class unset.
    pub fn parse_wire(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().replace(['\'', '"'], "");
        if cleaned.is_empty() {
            return None;
        }

        // "powerSupply(6)" -> "powerSupply"
        let name = cleaned.split('(').next().unwrap_or_default().trim();
        if let Ok(code) = name.parse::<u8>() {
            return Some(Self::from_code(code));
        }

        let class = match name.to_ascii_lowercase().as_str() {
            "other" => Self::Other,
            "unknown" => Self::Unknown,
            "chassis" => Self::Chassis,
            "backplane" => Self::Backplane,
            "container" => Self::Container,
            "powersupply" => Self::PowerSupply,
            "fan" => Self::Fan,
            "sensor" => Self::Sensor,
            "module" => Self::Module,
            "port" => Self::Port,
            "stack" => Self::Stack,
            "cpu" => Self::Cpu,
            _ => Self::Other,
        };
        Some(class)
    }

    /// PhysicalClass textual convention codes
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Other,
            3 => Self::Chassis,
            4 => Self::Backplane,
            5 => Self::Container,
            6 => Self::PowerSupply,
            7 => Self::Fan,
            8 => Self::Sensor,
            9 => Self::Module,
            10 => Self::Port,
            11 => Self::Stack,
            12 => Self::Cpu,
            _ => Self::Unknown,
        }
    }

    /// Infer a class from vendor-type keyword families
    pub fn infer_from_vendor_type(vendor_type: &str) -> Option<Self> {
        let vendor_type = vendor_type.to_lowercase();
        if vendor_type.contains("cevcontainer") {
            Some(Self::Container)
        } else if vendor_type.contains("cevchassis") {
            Some(Self::Chassis)
        } else if vendor_type.contains("cevmodule") {
            Some(Self::Module)
        } else if vendor_type.contains("cevport") {
            Some(Self::Port)
        } else if vendor_type.contains("cevpowersupply") {
            Some(Self::PowerSupply)
        } else {
            None
        }
    }

    /// Classes kept in the structural inventory
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Chassis
                | Self::Module
                | Self::Port
                | Self::PowerSupply
                | Self::Container
                | Self::Backplane
                | Self::Stack
        )
    }

    /// Classes collapsed out of hierarchical addresses
    pub fn is_transparent(self) -> bool {
        matches!(self, Self::Container | Self::Backplane)
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Other => "other",
            Self::Unknown => "unknown",
            Self::Chassis => "chassis",
            Self::Backplane => "backplane",
            Self::Container => "container",
            Self::PowerSupply => "powerSupply",
            Self::Fan => "fan",
            Self::Sensor => "sensor",
            Self::Module => "module",
            Self::Port => "port",
            Self::Stack => "stack",
            Self::Cpu => "cpu",
        };
        write!(f, "{}", name)
    }
}

/// One row of the physical inventory table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    /// Row index, unique within one discovery run
    pub id: u32,
    /// Containing entity, 0 when the row has no parent
    pub parent_id: u32,
    pub class: EntityClass,
    pub vendor_type: String,
    pub description: String,
    pub name: String,
    /// Sibling position under the parent
    pub parent_rel_pos: i64,
}

impl EntityNode {
    /// Whether the row sits directly under the root
    pub fn is_root_adjacent(&self) -> bool {
        self.parent_id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_forms() {
        assert_eq!(EntityClass::parse_wire("chassis"), Some(EntityClass::Chassis));
        assert_eq!(EntityClass::parse_wire("'port'"), Some(EntityClass::Port));
        assert_eq!(EntityClass::parse_wire("powerSupply(6)"), Some(EntityClass::PowerSupply));
        assert_eq!(EntityClass::parse_wire("9"), Some(EntityClass::Module));
        assert_eq!(EntityClass::parse_wire("gizmo"), Some(EntityClass::Other));
        assert_eq!(EntityClass::parse_wire("  "), None);
    }

    #[test]
    fn test_infer_from_vendor_type() {
        assert_eq!(
            EntityClass::infer_from_vendor_type("CISCO-ENTITY-VENDORTYPE-OID-MIB::cevContainerSlot"),
            Some(EntityClass::Container)
        );
        assert_eq!(
            EntityClass::infer_from_vendor_type("cevPortGe"),
            Some(EntityClass::Port)
        );
        assert_eq!(
            EntityClass::infer_from_vendor_type("cevPowerSupplyAC"),
            Some(EntityClass::PowerSupply)
        );
        assert_eq!(EntityClass::infer_from_vendor_type("cevFanTray"), None);
    }

    #[test]
    fn test_structural_families() {
        assert!(EntityClass::Stack.is_structural());
        assert!(EntityClass::Backplane.is_structural());
        assert!(!EntityClass::Fan.is_structural());
        assert!(!EntityClass::Unknown.is_structural());
        assert!(EntityClass::Container.is_transparent());
        assert!(!EntityClass::Module.is_transparent());
    }
}
