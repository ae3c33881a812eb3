//! Logical interface and auxiliary tables read once per run

use netinv_core::{mib, QueryError, RowIndex, Table, TableSource};
use tracing::{debug, info, warn};

/// Tables joined onto the physical inventory
#[derive(Debug, Clone, Default)]
pub struct DeviceTables {
    /// Logical interfaces (descriptor column)
    pub interfaces: Table,
    pub lldp_local: Table,
    pub lldp_remote: Table,
    pub cdp_cache: Table,
    pub duplex: Table,
    pub ipv4: Table,
    pub ipv6: Table,
    pub lag_members: Table,
}

impl DeviceTables {
    /// Load the logical interface table. Needed before port classification.
    pub fn load_interfaces<S: TableSource + ?Sized>(source: &S) -> Result<Self, QueryError> {
        let interfaces = source.get_table(mib::IF, mib::IF_DESCR)?;
        info!(rows = interfaces.len(), "{} table loaded", mib::IF_DESCR);
        Ok(Self {
            interfaces,
            ..Default::default()
        })
    }

    /// Load duplex, addressing, neighbor and aggregation tables.
    ///
    /// Neighbor tables fall back to empty when the device refuses them;
    /// the rest are required.
    pub fn load_auxiliary<S: TableSource + ?Sized>(&mut self, source: &S) -> Result<(), QueryError> {
        self.lldp_local = optional_table(source, mib::LLDP, mib::LLDP_LOC_PORT_DESC);
        self.lldp_remote = optional_table(source, mib::LLDP, mib::LLDP_REM_TABLE);
        self.cdp_cache = optional_table(source, mib::CDP, mib::CDP_CACHE_TABLE);
        self.duplex = source.get_table(mib::ETHERLIKE, mib::DOT3_STATS_INDEX)?;
        self.ipv4 = source.get_table(mib::IP, mib::IP_ADDR_TABLE)?;
        self.ipv6 = source.get_table(mib::IPV6, mib::IPV6_ADDR_ENTRY)?;
        self.lag_members = source.get_table(mib::LAG, mib::LAG_ATTACHED_AGG_ID)?;

        debug!(
            lldp = self.lldp_local.len(),
            cdp = self.cdp_cache.len(),
            ipv4 = self.ipv4.len(),
            ipv6 = self.ipv6.len(),
            lag = self.lag_members.len(),
            "Auxiliary tables loaded"
        );
        Ok(())
    }

    /// Descriptor of a logical interface
    pub fn interface_descr(&self, if_index: u32) -> Option<&str> {
        self.interfaces
            .get(&RowIndex::from(if_index))
            .and_then(|row| row.get(mib::IF_DESCR))
            .map(String::as_str)
    }

    pub fn has_interface(&self, if_index: u32) -> bool {
        self.interfaces.contains_key(&RowIndex::from(if_index))
    }
}

fn optional_table<S: TableSource + ?Sized>(source: &S, namespace: &str, field: &str) -> Table {
    match source.get_table(namespace, field) {
        Ok(table) => table,
        Err(e) => {
            warn!(namespace, field, error = %e, "Neighbor table unavailable");
            Table::new()
        }
    }
}
