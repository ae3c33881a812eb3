//! Errors raised by a discovery run

use netinv_core::QueryError;
use thiserror::Error;

/// Device identification does not match a supported operating system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Incompatible device: {description:?} does not match supported OS {supported:?}")]
pub struct ValidationError {
    pub description: String,
    pub supported: Vec<String>,
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Physical inventory table is empty, discovery cannot continue")]
    EmptyInventory,
    #[error("Containment cycle detected at entity {0}")]
    ParentCycle(u32),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
