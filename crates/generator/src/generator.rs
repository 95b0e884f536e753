//! The publishing topology generator.

use std::sync::Arc;

use metrics::counter;
use registry::PropertyRegistry;

use crate::config::DeclaredTopology;
use crate::error::Result;
use crate::expand::{expand, Plan};
use crate::validate::validate;
use crate::ConfigError;

/// Outcome of one generator run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationReport {
    /// Every configuration error found; each withheld one entity.
    pub errors: Vec<ConfigError>,
    pub clusters_published: usize,
    pub services_published: usize,
}

impl GenerationReport {
    /// The number of configuration errors. Zero means the whole declaration
    /// was published.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates, expands and publishes topology declarations.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use generator::{DeclaredTopology, TopologyGenerator};
/// use registry::MemoryRegistry;
///
/// # async fn run() -> generator::Result<()> {
/// let registry = Arc::new(MemoryRegistry::new());
/// let generator = TopologyGenerator::new(registry);
/// let config = DeclaredTopology::from_json(r#"{ "clusterServiceConfigurations": {} }"#)?;
/// let report = generator.generate(&config).await?;
/// assert_eq!(report.error_count(), 0);
/// # Ok(())
/// # }
/// ```
pub struct TopologyGenerator<R: ?Sized> {
    registry: Arc<R>,
}

impl<R: PropertyRegistry + ?Sized> TopologyGenerator<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Validate and expand `config` without touching the registry.
    pub fn plan(&self, config: &DeclaredTopology) -> Plan {
        expand(config, &validate(config))
    }

    /// Validate, expand and publish `config`.
    ///
    /// Configuration errors do not fail the run; they are logged, counted and
    /// returned in the report while every unaffected record is published.
    /// A registry failure aborts the run. Records already written stay as
    /// they are, since each write replaces one whole record.
    pub async fn generate(&self, config: &DeclaredTopology) -> Result<GenerationReport> {
        let plan = self.plan(config);
        for err in &plan.errors {
            tracing::error!(rule = %err.rule, entity = %err.entity, "{}", err.detail);
            counter!("topology_config_errors_total", "rule" => err.rule.as_str()).increment(1);
        }

        for record in plan.clusters.values() {
            self.registry.put_cluster(record).await?;
            counter!("topology_records_published_total", "kind" => "cluster").increment(1);
            tracing::debug!(cluster = %record.cluster_name, "published cluster");
        }
        for ((group, _), record) in &plan.services {
            self.registry.put_service(group.as_deref(), record).await?;
            counter!("topology_records_published_total", "kind" => "service").increment(1);
            tracing::debug!(
                service = %record.service_name,
                cluster = %record.cluster_name,
                group = ?group,
                "published service"
            );
        }

        let report = GenerationReport {
            clusters_published: plan.clusters.len(),
            services_published: plan.services.len(),
            errors: plan.errors,
        };
        tracing::info!(
            clusters = report.clusters_published,
            services = report.services_published,
            errors = report.error_count(),
            "topology generated"
        );
        Ok(report)
    }
}
