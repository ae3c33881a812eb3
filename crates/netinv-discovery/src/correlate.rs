//! Correlation of physical ports with logical interfaces and auxiliary tables

use netinv_core::{mib, Duplex, Table, TableSource};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::tables::DeviceTables;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("Invalid regex pattern"));

/// Resolve the logical interface index of a physical port.
///
/// Reads the alias mapping record first. When the device has none, the
/// numeric tokens of the physical descriptor (`"Gi 1/0/3"` gives `1/0/3`)
/// are searched for in the interface descriptors; the first match wins.
pub fn map_physical_to_logical<S: TableSource + ?Sized>(
    source: &S,
    tables: &DeviceTables,
    physical: u32,
    description: &str,
) -> Option<u32> {
    let field = format!("{}.{}.0", mib::ENT_ALIAS_MAPPING, physical);
    match source.get_scalar(mib::ENTITY, &field) {
        Ok(identifier) => {
            // "IF-MIB::ifIndex.5" or ".1.3.6.1.2.1.2.2.1.1.5"
            if let Some(index) = identifier
                .rsplit('.')
                .next()
                .and_then(|arc| arc.trim().parse::<u32>().ok())
            {
                return Some(index);
            }
            debug!(physical, identifier = %identifier, "Unusable alias mapping, matching by descriptor");
        }
        Err(e) => {
            debug!(physical, error = %e, "No alias mapping, matching by descriptor");
        }
    }

    match_by_descriptor(tables, description)
}

/// Find the first interface whose descriptor contains the numeric token
/// sequence of a physical descriptor
pub fn match_by_descriptor(tables: &DeviceTables, description: &str) -> Option<u32> {
    let tokens: Vec<&str> = DIGITS_RE.find_iter(description).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return None;
    }
    let sequence = tokens.join("/");

    tables
        .interfaces
        .iter()
        .find(|(_, row)| {
            row.get(mib::IF_DESCR)
                .map(|descr| descr.contains(&sequence))
                .unwrap_or(false)
        })
        .and_then(|(index, _)| index.as_u32())
}

/// Duplex mode and auto-negotiation state of an interface.
///
/// Defaults to full duplex and no auto-negotiation. A failed
/// auto-negotiation query keeps the default.
pub fn interface_details<S: TableSource + ?Sized>(
    source: &S,
    tables: &DeviceTables,
    if_index: u32,
) -> (Duplex, bool) {
    let mut duplex = Duplex::Full;
    let mut auto_negotiation = false;

    let field = format!("{}.{}.1", mib::MAU_AUTONEG_ADMIN_STATUS, if_index);
    match source.get_scalar(mib::MAU, &field) {
        Ok(status) => {
            if status.to_lowercase().contains("enabled") {
                auto_negotiation = true;
            }
        }
        Err(e) => {
            warn!(if_index, error = %e, "Failed to load auto negotiation property");
        }
    }

    let wanted = if_index.to_string();
    for (index, row) in &tables.duplex {
        if row.get(mib::DOT3_STATS_INDEX).map(String::as_str) == Some(wanted.as_str()) {
            let status = source.get_property(mib::ETHERLIKE, mib::DOT3_DUPLEX_STATUS, index);
            if status.contains("halfDuplex") {
                duplex = Duplex::Half;
            }
        }
    }

    (duplex, auto_negotiation)
}

/// First IPv4 and IPv6 address bound to an interface.
///
/// Secondary addresses are not reported.
pub fn ip_addresses(tables: &DeviceTables, if_index: u32) -> (String, String) {
    let ipv4 = first_address(&tables.ipv4, mib::IP_AD_ENT_IF_INDEX, if_index);
    let ipv6 = first_address(&tables.ipv6, mib::IPV6_ADDR_IF_INDEX, if_index);
    (ipv4, ipv6)
}

fn first_address(table: &Table, if_index_field: &str, if_index: u32) -> String {
    table
        .iter()
        .find(|(_, row)| {
            row.get(if_index_field)
                .and_then(|v| v.trim().parse::<u32>().ok())
                == Some(if_index)
        })
        .map(|(address, _)| address.to_string())
        .unwrap_or_default()
}

/// Logical interfaces that represent aggregation groups
pub fn port_channels(tables: &DeviceTables) -> Vec<(u32, String)> {
    tables
        .interfaces
        .iter()
        .filter_map(|(index, row)| {
            let descr = row.get(mib::IF_DESCR)?;
            if descr.contains("channel") && !descr.contains('.') {
                Some((index.as_u32()?, descr.clone()))
            } else {
                None
            }
        })
        .collect()
}

/// Member interfaces of an aggregation group, `; ` separated
pub fn associated_ports(tables: &DeviceTables, aggregation: u32) -> String {
    tables
        .lag_members
        .iter()
        .filter(|(_, row)| {
            row.get(mib::LAG_ATTACHED_AGG_ID)
                .and_then(|v| v.trim().parse::<u32>().ok())
                == Some(aggregation)
        })
        .filter_map(|(index, _)| index.as_u32())
        .filter_map(|member| tables.interface_descr(member))
        .map(|descr| descr.replace('/', "-").replace(' ', ""))
        .collect::<Vec<_>>()
        .join("; ")
}
