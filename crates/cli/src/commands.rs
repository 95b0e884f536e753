//! Command execution.
//!
//! Every command runs against a [`MemoryRegistry`] loaded from the snapshot
//! file named by `--registry`; `generate` writes the snapshot back.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use corelib::PartitionAccessor;
use generator::{DeclaredTopology, GenerationReport, TopologyGenerator};
use registry::{MemoryRegistry, PropertyRegistry, RegistrySnapshot};

use crate::config::{CliConfig, Command, RouteTarget, ShowTarget};

/// What a command printed and the process exit code it asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub output: String,
    pub exit_code: u8,
}

impl CommandResult {
    fn ok(output: String) -> Self {
        Self { output, exit_code: 0 }
    }
}

/// Run the configured command.
pub async fn run(config: &CliConfig) -> Result<CommandResult> {
    let snapshot = RegistrySnapshot::load(&config.registry)
        .with_context(|| format!("failed to load registry snapshot {}", config.registry.display()))?;
    let registry = Arc::new(MemoryRegistry::from_snapshot(&snapshot)?);

    match &config.command {
        Command::Generate {
            config: declaration,
            default_colo,
            dry_run,
        } => {
            let mut topology = DeclaredTopology::from_path(declaration)
                .with_context(|| format!("failed to load declaration {}", declaration.display()))?;
            if let Some(colo) = default_colo {
                topology.default_colo = Some(colo.clone());
            }
            generate(config, registry, &topology, *dry_run).await
        }
        Command::Route { cluster, target } => route(registry.as_ref(), cluster, target).await,
        Command::Show { target, group } => show(registry.as_ref(), target, group.as_deref()).await,
    }
}

async fn generate(
    config: &CliConfig,
    registry: Arc<MemoryRegistry>,
    topology: &DeclaredTopology,
    dry_run: bool,
) -> Result<CommandResult> {
    let generator = TopologyGenerator::new(registry.clone());

    let report = if dry_run {
        let plan = generator.plan(topology);
        GenerationReport {
            clusters_published: plan.clusters.len(),
            services_published: plan.services.len(),
            errors: plan.errors,
        }
    } else {
        let report = generator.generate(topology).await?;
        registry
            .snapshot()?
            .save(&config.registry)
            .with_context(|| format!("failed to save registry snapshot {}", config.registry.display()))?;
        tracing::info!(path = %config.registry.display(), "registry snapshot saved");
        report
    };

    let mut output = String::new();
    summarize(&mut output, &report, dry_run)?;
    Ok(CommandResult {
        output,
        exit_code: u8::try_from(report.error_count()).unwrap_or(u8::MAX),
    })
}

fn summarize(out: &mut impl fmt::Write, report: &GenerationReport, dry_run: bool) -> fmt::Result {
    let verb = if dry_run { "would publish" } else { "published" };
    writeln!(
        out,
        "{} {} clusters, {} services",
        verb, report.clusters_published, report.services_published
    )?;
    writeln!(out, "{} error(s)", report.error_count())?;
    report.errors.iter().try_for_each(|err| writeln!(out, "  {}", err))
}

async fn route(registry: &MemoryRegistry, cluster: &str, target: &RouteTarget) -> Result<CommandResult> {
    let record = registry
        .get_cluster(cluster)
        .await?
        .ok_or_else(|| anyhow!("unknown cluster `{}`", cluster))?;
    let accessor = record.accessor()?;

    let partition = match (&target.key, &target.uri) {
        (Some(key), _) => accessor.partition_for_key_str(key)?,
        (None, Some(uri)) => accessor.partition_for_uri(uri)?,
        (None, None) => return Err(anyhow!("either --key or --uri is required")),
    };
    Ok(CommandResult::ok(format!("{}\n", partition)))
}

async fn show(registry: &MemoryRegistry, target: &ShowTarget, group: Option<&str>) -> Result<CommandResult> {
    let json = match (&target.cluster, &target.service) {
        (Some(name), _) => {
            let record = registry
                .get_cluster(name)
                .await?
                .ok_or_else(|| anyhow!("unknown cluster `{}`", name))?;
            serde_json::to_string_pretty(&record)?
        }
        (None, Some(name)) => {
            let record = registry
                .get_service(name, group)
                .await?
                .ok_or_else(|| anyhow!("unknown service `{}` in {}", name, group.unwrap_or("global namespace")))?;
            serde_json::to_string_pretty(&record)?
        }
        (None, None) => return Err(anyhow!("either --cluster or --service is required")),
    };
    Ok(CommandResult::ok(json + "\n"))
}
