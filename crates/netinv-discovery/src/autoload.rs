//! Discovery engine entry point
//!
//! [`Autoload::discover`] runs the full pipeline against a table source:
//! device validation, inventory loading, containment repair, exclusion
//! propagation, addressing and resource assembly. Each call is an
//! independent run with its own [`DiscoveryContext`].

use netinv_core::{DiscoveryResult, ModelCatalog, TableSource};
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::address::AddressBuilder;
use crate::assemble::Assembler;
use crate::config::{AutoloadConfig, Filters};
use crate::context::DiscoveryContext;
use crate::device::{root_attributes, validate_os};
use crate::error::DiscoveryError;
use crate::loader::EntityLoader;
use crate::tables::DeviceTables;

/// Discovery engine bound to one device
pub struct Autoload<S: TableSource> {
    source: S,
    config: AutoloadConfig,
    filters: Filters,
    catalog: ModelCatalog,
}

impl<S: TableSource> Autoload<S> {
    /// Create an engine, compiling the configured patterns
    pub fn new(source: S, config: AutoloadConfig, catalog: ModelCatalog) -> Result<Self, DiscoveryError> {
        let filters = Filters::compile(&config)?;
        Ok(Self {
            source,
            config,
            filters,
            catalog,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &AutoloadConfig {
        &self.config
    }

    /// Load and classify the physical inventory
    pub fn build_context(&self, tables: &DeviceTables) -> Result<DiscoveryContext, DiscoveryError> {
        let mut ctx = DiscoveryContext::new();
        EntityLoader::new(&self.source, tables, &self.filters).load(&mut ctx)?;
        Ok(ctx)
    }

    /// Run a full discovery.
    ///
    /// A device without a usable chassis yields an empty result. An
    /// unreadable or empty inventory table is an error.
    pub fn discover(&self) -> Result<DiscoveryResult, DiscoveryError> {
        let run = Uuid::new_v4();
        let span = info_span!("discover", run = %run);
        let _enter = span.enter();

        validate_os(&self.source, &self.config, &self.filters)?;
        info!("Start discovery");

        let root = root_attributes(&self.source, &self.config.vendor, &self.catalog);

        let mut tables = DeviceTables::load_interfaces(&self.source)?;
        let mut ctx = self.build_context(&tables)?;
        if ctx.chassis.is_empty() {
            error!("Entity table error, no chassis found");
            return Ok(DiscoveryResult::empty());
        }

        tables.load_auxiliary(&self.source)?;

        ctx.repair_dual_bay();
        ctx.check_acyclic()?;
        ctx.propagate_exclusions();
        ctx.collect_modules(&self.filters);

        AddressBuilder::new(self.config.collision_offset).assign_all(&mut ctx);

        let mut result = DiscoveryResult::empty();
        result.attributes.extend(root.attributes());
        Assembler::new(&self.source, &tables, &ctx, &root.model).assemble(&mut result);

        log_structure(&result);
        Ok(result)
    }
}

fn log_structure(result: &DiscoveryResult) {
    info!(
        resources = result.resources.len(),
        attributes = result.attributes.len(),
        "Discovery completed"
    );
    for resource in &result.resources {
        info!(
            model = %resource.model,
            name = %resource.name,
            address = %resource.address,
            unique_id = %resource.unique_id,
            "Resource"
        );
    }
    for attribute in &result.attributes {
        info!(
            address = %attribute.address,
            name = %attribute.name,
            value = %attribute.value,
            "Attribute"
        );
    }
}
