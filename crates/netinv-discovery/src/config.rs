//! Discovery configuration and compiled filters

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// Discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoloadConfig {
    /// Vendor reported on the root resource
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Patterns matched against the system description
    #[serde(default = "default_supported_os")]
    pub supported_os: Vec<String>,
    /// Vendor-type keywords whose rows are dropped from the inventory
    #[serde(default = "default_entity_blacklist")]
    pub entity_blacklist: Vec<String>,
    /// Port names or descriptions matching this are not discovered
    #[serde(default = "default_port_exclude_pattern")]
    pub port_exclude_pattern: String,
    /// Module vendor types matching this are folded into their children
    #[serde(default = "default_module_exclude_pattern")]
    pub module_exclude_pattern: String,
    /// Added to the last address segment of a colliding port
    #[serde(default = "default_collision_offset")]
    pub collision_offset: u32,
}

impl Default for AutoloadConfig {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            supported_os: default_supported_os(),
            entity_blacklist: default_entity_blacklist(),
            port_exclude_pattern: default_port_exclude_pattern(),
            module_exclude_pattern: default_module_exclude_pattern(),
            collision_offset: default_collision_offset(),
        }
    }
}

fn default_vendor() -> String {
    "Cisco".to_string()
}

fn default_supported_os() -> Vec<String> {
    vec!["IOS".to_string(), "NX-OS".to_string()]
}

fn default_entity_blacklist() -> Vec<String> {
    vec!["alarm".to_string(), "fan".to_string(), "sensor".to_string()]
}

fn default_port_exclude_pattern() -> String {
    "serial|stack|engine|management|mgmt|voice|foreign".to_string()
}

fn default_module_exclude_pattern() -> String {
    "cevsfp".to_string()
}

fn default_collision_offset() -> u32 {
    1000
}

/// Patterns compiled once per engine
#[derive(Debug, Clone)]
pub struct Filters {
    pub supported_os: Regex,
    pub port_exclude: Regex,
    pub module_exclude: Regex,
    /// Lower-cased blacklist keywords
    pub entity_blacklist: Vec<String>,
}

impl Filters {
    pub fn compile(config: &AutoloadConfig) -> Result<Self, DiscoveryError> {
        let supported_os = format!("({})", config.supported_os.join("|"));
        Ok(Self {
            supported_os: RegexBuilder::new(&supported_os)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()?,
            port_exclude: case_insensitive(&config.port_exclude_pattern)?,
            module_exclude: case_insensitive(&config.module_exclude_pattern)?,
            entity_blacklist: config
                .entity_blacklist
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        })
    }

    /// Vendor type hits one of the blacklisted keywords
    pub fn is_blacklisted(&self, vendor_type: &str) -> bool {
        let vendor_type = vendor_type.to_lowercase();
        self.entity_blacklist.iter().any(|k| vendor_type.contains(k.as_str()))
    }

    /// Port name or description marks it as not discoverable
    pub fn is_excluded_port(&self, name: &str, description: &str) -> bool {
        self.port_exclude.is_match(name) || self.port_exclude.is_match(description)
    }

    pub fn is_excluded_module(&self, vendor_type: &str) -> bool {
        self.module_exclude.is_match(vendor_type)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
