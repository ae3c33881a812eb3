//! Printing discovery results

use anyhow::Result;
use chrono::{DateTime, Utc};
use netinv_core::DiscoveryResult;
use serde::Serialize;
use std::fmt::Write;

/// Outcome of one snapshot run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub snapshot: String,
    pub discovered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiscoveryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn success(snapshot: &str, result: DiscoveryResult) -> Self {
        Self {
            snapshot: snapshot.to_string(),
            discovered_at: Utc::now(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(snapshot: &str, error: impl ToString) -> Self {
        Self {
            snapshot: snapshot.to_string(),
            discovered_at: Utc::now(),
            result: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

pub fn render_json(reports: &[RunReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

/// Human readable listing, one block per snapshot
pub fn render_table(reports: &[RunReport]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for report in reports {
        writeln!(
            out,
            "== {} ({})",
            report.snapshot,
            report.discovered_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        if let Some(error) = &report.error {
            writeln!(out, "  FAILED: {}", error)?;
            continue;
        }
        let Some(result) = &report.result else {
            continue;
        };
        if result.is_empty() {
            writeln!(out, "  No chassis found")?;
            continue;
        }

        writeln!(
            out,
            "  {:<22} {:<28} {:<14} {}",
            "MODEL", "NAME", "ADDRESS", "UNIQUE ID"
        )?;
        for resource in &result.resources {
            writeln!(
                out,
                "  {:<22} {:<28} {:<14} {}",
                resource.model, resource.name, resource.address, resource.unique_id
            )?;
        }

        writeln!(out, "  Attributes:")?;
        for attribute in &result.attributes {
            let address = if attribute.address.is_empty() {
                "<root>"
            } else {
                attribute.address.as_str()
            };
            writeln!(out, "    {:<14} {:<18} {}", address, attribute.name, attribute.value)?;
        }
    }
    Ok(out)
}
