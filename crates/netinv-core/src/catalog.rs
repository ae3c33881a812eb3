//! Vendor model catalog - maps product object-id codes to product names
//!
//! The device reports its product as an object identifier such as
//! `.1.3.6.1.4.1.9.1.1745`. The trailing arc is looked up here to give a
//! readable model name for the root resource.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read model catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse model catalog: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Trailing object-id arc, e.g. "1745"
    pub code: String,
    /// Product name, e.g. "CISCO2911_K9"
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    model: Vec<ModelEntry>,
}

/// Product code to name lookup
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, String>,
}

impl ModelCatalog {
    /// Create an empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Ok(Self::from_entries(file.model))
    }

    /// Load the catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ModelEntry>) -> Self {
        Self {
            models: entries.into_iter().map(|e| (e.code, e.name)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Raw product name for a code
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.models.get(code).map(String::as_str)
    }

    /// Device model name for a product object id.
    ///
    /// Numeric ids resolve through the catalog (`CISCO2911_K9` becomes
    /// `Cisco2911k9`); symbolic ids (`CISCO-PRODUCTS-MIB::catalyst3750`)
    /// fall back to the capitalised symbol. Unknown ids give an empty string.
    pub fn device_model(&self, sys_object_id: &str) -> String {
        let object_id = sys_object_id.trim();

        let last_arc = object_id.rsplit('.').next().unwrap_or_default();
        if !last_arc.is_empty() && last_arc.chars().all(|c| c.is_ascii_digit()) {
            if let Some(name) = self.lookup(last_arc) {
                return capitalize(&name.to_lowercase().replace('_', ""));
            }
        }

        match object_id.rsplit_once("::") {
            Some((_, symbol)) if !symbol.is_empty() && !symbol.contains(char::is_whitespace) => {
                capitalize(symbol)
            }
            _ => String::new(),
        }
    }
}

/// Upper-case the first character and lower-case the rest
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
