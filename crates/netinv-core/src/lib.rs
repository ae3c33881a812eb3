//! netinv Core - Core types, table-source contract and device snapshots
//!
//! This crate provides the foundational types for the netinv system:
//! - Table source contract used by the discovery engine to read device tables
//! - File-backed snapshot source for offline discovery and tests
//! - Physical entity classification
//! - Resource and attribute value objects emitted by discovery
//! - Vendor model catalog for device model names

pub mod catalog;
pub mod entity;
pub mod resource;
pub mod snapshot;
pub mod source;

pub use catalog::{CatalogError, ModelCatalog, ModelEntry};
pub use entity::{EntityClass, EntityNode};
pub use resource::{
    attr, unique_id, AttributeRecord, AutoloadResource, ChassisResource, DiscoveryResult, Duplex,
    ModuleResource, PortChannelResource, PortResource, PowerPortResource, ResourceCategory,
    ResourceDescriptor, RootAttributes,
};
pub use snapshot::{SnapshotError, SnapshotSource};
pub use source::{mib, FieldType, Properties, PropertyValue, QueryError, Row, RowIndex, Table, TableSource};
