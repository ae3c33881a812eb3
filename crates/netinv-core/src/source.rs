//! Table source contract for reading device management tables
//!
//! The discovery engine never talks to a device directly. Every read goes
//! through a [`TableSource`], which hands back flat, index-keyed tables and
//! scalar values. Retry and timeout policy belong to the implementation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No such object: {namespace}::{field}")]
    NoSuchObject { namespace: String, field: String },
    #[error("{namespace} unavailable: {reason}")]
    Unavailable { namespace: String, reason: String },
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },
}

/// Index of a table row, e.g. `"5"`, `"12.3"` or `"10.0.0.1"`
///
/// Rows order like an OID walk: dotted components compare numerically when
/// both sides are numbers, so `"2"` sorts before `"10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIndex(pub String);

impl RowIndex {
    pub fn new(index: impl Into<String>) -> Self {
        Self(index.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the whole index as an integer id
    pub fn as_u32(&self) -> Option<u32> {
        self.0.trim().parse().ok()
    }

    /// Numeric value of the first dotted component, if it is numeric
    pub fn leading_number(&self) -> Option<u32> {
        let digits: String = self.0.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    /// Dotted components of the index
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl From<u32> for RowIndex {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RowIndex {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for RowIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ord for RowIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.0.split('.');
        let mut right = other.0.split('.');
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => {
                    // Numeric components sort ahead of named ones
                    let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        (Ok(_), Err(_)) => Ordering::Less,
                        (Err(_), Ok(_)) => Ordering::Greater,
                        (Err(_), Err(_)) => a.cmp(b),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                // "01" and "1" are numerically equal but distinct keys
                (None, None) => return self.0.cmp(&other.0),
            }
        }
    }
}

impl PartialOrd for RowIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A table row: field name to raw string value
pub type Row = BTreeMap<String, String>;

/// A table keyed by row index
pub type Table = BTreeMap<RowIndex, Row>;

/// Requested type of a batched property fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
}

/// Typed property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
}

impl PropertyValue {
    /// Render the value the way it would appear in a raw table
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }
}

/// Properties of one row: field name to typed value
pub type Properties = BTreeMap<String, PropertyValue>;

/// Read access to a device's management tables
pub trait TableSource {
    /// Read a single scalar, e.g. `("SNMPv2-MIB", "sysDescr.0")`
    fn get_scalar(&self, namespace: &str, field: &str) -> Result<String, QueryError>;

    /// Walk a table or a single column. An empty table is not an error.
    fn get_table(&self, namespace: &str, field: &str) -> Result<Table, QueryError>;

    /// Fetch several typed fields of one row in a single request
    fn get_properties(
        &self,
        namespace: &str,
        index: &RowIndex,
        fields: &[(&str, FieldType)],
    ) -> Result<BTreeMap<RowIndex, Properties>, QueryError>;

    /// Fetch one field of one row, empty string when not present
    fn get_property(&self, namespace: &str, field: &str, index: &RowIndex) -> String;
}

/// Namespaces and field names read during discovery
pub mod mib {
    pub const SNMPV2: &str = "SNMPv2-MIB";
    pub const SYS_DESCR: &str = "sysDescr";
    pub const SYS_NAME: &str = "sysName";
    pub const SYS_LOCATION: &str = "sysLocation";
    pub const SYS_CONTACT: &str = "sysContact";
    pub const SYS_OBJECT_ID: &str = "sysObjectID";

    pub const ENTITY: &str = "ENTITY-MIB";
    pub const ENT_PARENT_REL_POS: &str = "entPhysicalParentRelPos";
    pub const ENT_CONTAINED_IN: &str = "entPhysicalContainedIn";
    pub const ENT_CLASS: &str = "entPhysicalClass";
    pub const ENT_VENDOR_TYPE: &str = "entPhysicalVendorType";
    pub const ENT_DESCR: &str = "entPhysicalDescr";
    pub const ENT_NAME: &str = "entPhysicalName";
    pub const ENT_MODEL_NAME: &str = "entPhysicalModelName";
    pub const ENT_SERIAL_NUM: &str = "entPhysicalSerialNum";
    pub const ENT_SOFTWARE_REV: &str = "entPhysicalSoftwareRev";
    pub const ENT_HARDWARE_REV: &str = "entPhysicalHardwareRev";
    pub const ENT_ALIAS_MAPPING: &str = "entAliasMappingIdentifier";

    pub const IF: &str = "IF-MIB";
    pub const IF_DESCR: &str = "ifDescr";
    pub const IF_TYPE: &str = "ifType";
    pub const IF_PHYS_ADDRESS: &str = "ifPhysAddress";
    pub const IF_MTU: &str = "ifMtu";
    pub const IF_SPEED: &str = "ifSpeed";
    pub const IF_ALIAS: &str = "ifAlias";

    pub const MAU: &str = "MAU-MIB";
    pub const MAU_AUTONEG_ADMIN_STATUS: &str = "ifMauAutoNegAdminStatus";

    pub const ETHERLIKE: &str = "EtherLike-MIB";
    pub const DOT3_STATS_INDEX: &str = "dot3StatsIndex";
    pub const DOT3_DUPLEX_STATUS: &str = "dot3StatsDuplexStatus";

    pub const IP: &str = "IP-MIB";
    pub const IP_ADDR_TABLE: &str = "ipAddrTable";
    pub const IP_AD_ENT_IF_INDEX: &str = "ipAdEntIfIndex";

    pub const IPV6: &str = "IPV6-MIB";
    pub const IPV6_ADDR_ENTRY: &str = "ipv6AddrEntry";
    pub const IPV6_ADDR_IF_INDEX: &str = "ipv6AddrIfIndex";

    pub const CDP: &str = "CISCO-CDP-MIB";
    pub const CDP_CACHE_TABLE: &str = "cdpCacheTable";
    pub const CDP_CACHE_DEVICE_ID: &str = "cdpCacheDeviceId";
    pub const CDP_CACHE_DEVICE_PORT: &str = "cdpCacheDevicePort";

    pub const LLDP: &str = "LLDP-MIB";
    pub const LLDP_LOC_PORT_DESC: &str = "lldpLocPortDesc";
    pub const LLDP_REM_TABLE: &str = "lldpRemTable";
    pub const LLDP_REM_SYS_NAME: &str = "lldpRemSysName";
    pub const LLDP_REM_PORT_DESC: &str = "lldpRemPortDesc";

    pub const LAG: &str = "IEEE8023-LAG-MIB";
    pub const LAG_ATTACHED_AGG_ID: &str = "dot3adAggPortAttachedAggID";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_index_numeric_order() {
        let mut indexes: Vec<RowIndex> = ["10", "2", "1.5", "1.10", "1"]
            .into_iter()
            .map(RowIndex::from)
            .collect();
        indexes.sort();
        let sorted: Vec<&str> = indexes.iter().map(|i| i.as_str()).collect();
        assert_eq!(sorted, vec!["1", "1.5", "1.10", "2", "10"]);
    }

    #[test]
    fn test_row_index_mixed_components_total_order() {
        let nine = RowIndex::from("9");
        let ten = RowIndex::from("10");
        let named = RowIndex::from("1a");
        assert!(nine < ten);
        assert!(ten < named);
        assert!(nine < named);

        let mut indexes: Vec<RowIndex> = ["1a", "10", "fe80::1", "9", "2.x", "2.3"]
            .into_iter()
            .map(RowIndex::from)
            .collect();
        indexes.sort();
        let sorted: Vec<String> = indexes.iter().map(|i| i.to_string()).collect();
        assert_eq!(sorted, vec!["2.3", "2.x", "9", "10", "1a", "fe80::1"]);
    }

    #[test]
    fn test_row_index_distinct_keys_stay_distinct() {
        let a = RowIndex::from("01");
        let b = RowIndex::from("1");
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(RowIndex::from("12.3").leading_number(), Some(12));
        assert_eq!(RowIndex::from("7").leading_number(), Some(7));
        assert_eq!(RowIndex::from("abc").leading_number(), None);
        assert_eq!(RowIndex::from("7").as_u32(), Some(7));
        assert_eq!(RowIndex::from("10.0.0.1").as_u32(), None);
    }

    #[test]
    fn test_property_value_text() {
        assert_eq!(PropertyValue::Int(1500).to_text(), "1500");
        assert_eq!(PropertyValue::Str("42".into()).as_int(), Some(42));
    }
}
