//! Link-layer neighbor lookup (CDP, then LLDP)

use netinv_core::{mib, Row, RowIndex};
use tracing::debug;

use crate::tables::DeviceTables;

/// Adjacent device and port of an interface, `"<device> through <port>"`.
///
/// CDP is tried first; LLDP is consulted only when CDP has nothing and the
/// LLDP remote table holds entries. Empty when neither protocol knows.
pub fn adjacent(tables: &DeviceTables, if_index: u32) -> String {
    if let Some(neighbor) = cdp_neighbor(tables, if_index) {
        return neighbor;
    }
    if tables.lldp_remote.is_empty() {
        return String::new();
    }
    lldp_neighbor(tables, if_index).unwrap_or_default()
}

fn cdp_neighbor(tables: &DeviceTables, if_index: u32) -> Option<String> {
    // cdpCacheTable rows are indexed "<ifIndex>.<deviceIndex>"; the last entry wins
    tables
        .cdp_cache
        .iter()
        .filter(|(index, _)| index.leading_number() == Some(if_index))
        .filter_map(|(_, row)| {
            format_neighbor(row, mib::CDP_CACHE_DEVICE_ID, mib::CDP_CACHE_DEVICE_PORT)
        })
        .last()
}

fn lldp_neighbor(tables: &DeviceTables, if_index: u32) -> Option<String> {
    let interface_name = tables.interface_descr(if_index).filter(|n| !n.is_empty())?;

    let local = tables.lldp_local.iter().find(|(_, row)| {
        row.get(mib::LLDP_LOC_PORT_DESC)
            .map(|descr| descr.contains(interface_name))
            .unwrap_or(false)
    })?;
    let local_port = local.0;
    debug!(if_index, local_port = %local_port, "LLDP local port matched");

    remote_row(tables, local_port)
        .and_then(|row| format_neighbor(row, mib::LLDP_REM_SYS_NAME, mib::LLDP_REM_PORT_DESC))
}

/// Remote rows are keyed by the local port number either directly or as
/// the middle arc of `<timeMark>.<localPort>.<remIndex>`.
fn remote_row<'a>(tables: &'a DeviceTables, local_port: &RowIndex) -> Option<&'a Row> {
    if let Some(row) = tables.lldp_remote.get(local_port) {
        return Some(row);
    }
    tables
        .lldp_remote
        .iter()
        .find(|(index, _)| {
            let arcs: Vec<&str> = index.components().collect();
            arcs.len() == 3 && arcs[1] == local_port.as_str()
        })
        .map(|(_, row)| row)
}

fn format_neighbor(row: &Row, device_field: &str, port_field: &str) -> Option<String> {
    let device = row.get(device_field)?;
    let port = row.get(port_field)?;
    Some(format!("{} through {}", device, port))
}
