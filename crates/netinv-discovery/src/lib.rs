//! netinv Discovery - Physical topology discovery for managed network devices
//!
//! This crate rebuilds a device's containment tree from its flat inventory
//! tables and emits addressed resources with their attributes:
//! - Entity loading and classification with blacklist filtering
//! - Exclusion propagation and containment repair
//! - Deterministic hierarchical addressing with collision handling
//! - Correlation of physical ports with logical interfaces and neighbor data

pub mod address;
pub mod assemble;
pub mod autoload;
pub mod config;
pub mod context;
pub mod correlate;
pub mod device;
pub mod error;
pub mod loader;
pub mod neighbors;
pub mod resolver;
pub mod tables;

pub use address::AddressBuilder;
pub use autoload::Autoload;
pub use config::{AutoloadConfig, Filters};
pub use context::{DiscoveryContext, ExclusionSet, PortMapping, RelativePaths};
pub use error::{DiscoveryError, ValidationError};
pub use loader::{EntityLoader, ExclusionReason, RowOutcome};
pub use tables::DeviceTables;
