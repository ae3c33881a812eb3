//! Captured device snapshots served through the [`TableSource`] contract
//!
//! A snapshot stores every column the discovery engine reads as
//! `namespace -> column -> row index -> value`. Named tables (for example
//! `lldpRemTable`) are listed with the columns they group, so a walk of the
//! table returns full rows while a walk of a column returns one-field rows.
//!
//! ```json
//! {
//!   "columns": { "IF-MIB": { "ifDescr": { "1": "GigabitEthernet0/1" } } },
//!   "tables": { "LLDP-MIB": { "lldpRemTable": ["lldpRemSysName", "lldpRemPortDesc"] } },
//!   "unavailable": ["MAU-MIB::ifMauAutoNegAdminStatus"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::source::{FieldType, Properties, PropertyValue, QueryError, Row, RowIndex, Table, TableSource};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse snapshot: {0}")]
    ParseError(#[from] serde_json::Error),
}

type Column = BTreeMap<RowIndex, String>;

/// In-memory device snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSource {
    /// Column values keyed by namespace, then column name
    #[serde(default)]
    columns: BTreeMap<String, BTreeMap<String, Column>>,
    /// Named tables and the columns they group
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// `namespace::field` entries that fail as if the device refused them
    #[serde(default)]
    unavailable: BTreeSet<String>,
}

impl SnapshotSource {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from a JSON string
    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            namespaces = snapshot.columns.len(),
            "Loaded device snapshot"
        );
        Ok(snapshot)
    }

    /// Serialize the snapshot to pretty JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set one cell
    pub fn insert(
        &mut self,
        namespace: &str,
        column: &str,
        index: impl Into<RowIndex>,
        value: impl Into<String>,
    ) {
        self.columns
            .entry(namespace.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default()
            .insert(index.into(), value.into());
    }

    /// Builder form of [`SnapshotSource::insert`]
    pub fn with_column(
        mut self,
        namespace: &str,
        column: &str,
        index: impl Into<RowIndex>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(namespace, column, index, value);
        self
    }

    /// Declare a named table grouping several columns
    pub fn with_table(mut self, namespace: &str, table: &str, columns: &[&str]) -> Self {
        self.tables
            .entry(namespace.to_string())
            .or_default()
            .insert(
                table.to_string(),
                columns.iter().map(|c| c.to_string()).collect(),
            );
        self
    }

    /// Make every read of `namespace::field` fail
    pub fn with_unavailable(mut self, namespace: &str, field: &str) -> Self {
        self.unavailable.insert(format!("{}::{}", namespace, field));
        self
    }

    fn check_available(&self, namespace: &str, field: &str) -> Result<(), QueryError> {
        if self.unavailable.contains(&format!("{}::{}", namespace, field)) {
            return Err(QueryError::Unavailable {
                namespace: namespace.to_string(),
                reason: format!("{} not readable", field),
            });
        }
        Ok(())
    }

    fn column(&self, namespace: &str, column: &str) -> Option<&Column> {
        self.columns.get(namespace).and_then(|cols| cols.get(column))
    }

    fn cell(&self, namespace: &str, column: &str, index: &RowIndex) -> Option<&String> {
        self.column(namespace, column).and_then(|col| col.get(index))
    }
}

impl TableSource for SnapshotSource {
    fn get_scalar(&self, namespace: &str, field: &str) -> Result<String, QueryError> {
        // "sysDescr.0" -> column "sysDescr", instance "0"
        let (column, instance) = field.split_once('.').unwrap_or((field, "0"));
        self.check_available(namespace, column)?;

        self.cell(namespace, column, &RowIndex::from(instance))
            .cloned()
            .ok_or_else(|| QueryError::NoSuchObject {
                namespace: namespace.to_string(),
                field: field.to_string(),
            })
    }

    fn get_table(&self, namespace: &str, field: &str) -> Result<Table, QueryError> {
        self.check_available(namespace, field)?;

        let columns: Vec<&str> = match self.tables.get(namespace).and_then(|t| t.get(field)) {
            Some(cols) => cols.iter().map(String::as_str).collect(),
            None => vec![field],
        };

        let mut table = Table::new();
        for column in columns {
            if let Some(values) = self.column(namespace, column) {
                for (index, value) in values {
                    table
                        .entry(index.clone())
                        .or_insert_with(Row::new)
                        .insert(column.to_string(), value.clone());
                }
            }
        }

        debug!(namespace, field, rows = table.len(), "Table walked");
        Ok(table)
    }

    fn get_properties(
        &self,
        namespace: &str,
        index: &RowIndex,
        fields: &[(&str, FieldType)],
    ) -> Result<BTreeMap<RowIndex, Properties>, QueryError> {
        let mut properties = Properties::new();
        for &(field, field_type) in fields {
            self.check_available(namespace, field)?;
            let raw = self.cell(namespace, field, index).cloned().unwrap_or_default();
            let value = match field_type {
                FieldType::Str => PropertyValue::Str(raw),
                FieldType::Int if raw.trim().is_empty() => PropertyValue::Int(0),
                FieldType::Int => {
                    let parsed = raw.trim().parse().map_err(|_| QueryError::InvalidValue {
                        field: field.to_string(),
                        value: raw.clone(),
                    })?;
                    PropertyValue::Int(parsed)
                }
            };
            properties.insert(field.to_string(), value);
        }

        let mut result = BTreeMap::new();
        result.insert(index.clone(), properties);
        Ok(result)
    }

    fn get_property(&self, namespace: &str, field: &str, index: &RowIndex) -> String {
        if self.check_available(namespace, field).is_err() {
            return String::new();
        }
        self.cell(namespace, field, index).cloned().unwrap_or_default()
    }
}
