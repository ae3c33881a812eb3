//! Device identification and root attributes

use netinv_core::{mib, ModelCatalog, RootAttributes, RowIndex, TableSource};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

use crate::config::{AutoloadConfig, Filters};
use crate::error::{DiscoveryError, ValidationError};

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Version\s+(\S+)\S*\s+").expect("Invalid regex pattern"));

/// Check the system description against the supported operating systems.
///
/// Runs before any table walk. An empty supported list accepts any device.
pub fn validate_os<S: TableSource + ?Sized>(
    source: &S,
    config: &AutoloadConfig,
    filters: &Filters,
) -> Result<(), DiscoveryError> {
    let description = source.get_scalar(mib::SNMPV2, &format!("{}.0", mib::SYS_DESCR))?;
    if config.supported_os.is_empty() || filters.supported_os.is_match(&description) {
        return Ok(());
    }

    info!(description = %description, "Detected system description");
    let err = ValidationError {
        description,
        supported: config.supported_os.clone(),
    };
    error!(error = %err, "Device validation failed");
    Err(err.into())
}

/// Software version from a system description, `Version 15.0(2)SE,` gives `15.0(2)SE`
pub fn os_version(description: &str) -> String {
    VERSION_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace(',', ""))
        .unwrap_or_default()
}

/// Attributes of the device itself
pub fn root_attributes<S: TableSource + ?Sized>(
    source: &S,
    vendor: &str,
    catalog: &ModelCatalog,
) -> RootAttributes {
    let instance = RowIndex::from(0u32);
    let scalar = |field: &str| source.get_property(mib::SNMPV2, field, &instance);

    let attributes = RootAttributes {
        system_name: scalar(mib::SYS_NAME),
        vendor: vendor.to_string(),
        model: catalog.device_model(&scalar(mib::SYS_OBJECT_ID)),
        location: scalar(mib::SYS_LOCATION),
        contact: scalar(mib::SYS_CONTACT),
        os_version: os_version(&scalar(mib::SYS_DESCR)),
    };
    info!(
        system_name = %attributes.system_name,
        model = %attributes.model,
        version = %attributes.os_version,
        "Device attributes loaded"
    );
    attributes
}
