//! Generator error types.
//!
//! Two kinds of failure exist:
//! - [`ConfigError`]: one counted validation failure. A run collects these,
//!   withholds the implicated entities and still completes.
//! - [`GeneratorError`]: the run itself failed (unreadable declaration,
//!   registry unavailable) and must be retried.

use std::fmt;
use std::path::PathBuf;

use registry::RegistryError;
use thiserror::Error;

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// The validation rule a declaration broke.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigRule {
    /// A service name is declared under more than one base cluster.
    DuplicateService,
    /// A cluster variant name collides with another cluster or variant.
    NonUniqueClusterVariant,
    /// A service group lists two names resolving to the same base cluster.
    HeterogeneousServiceGroup,
    /// A service group references an undeclared cluster or variant.
    UnknownCluster,
    /// A service group has an unrecognized type tag.
    UnknownServiceGroupType,
    /// A partition spec from which no accessor can be built.
    InvalidPartitionSpec,
    /// Expansion derives a cluster or service name that another entity also
    /// derives.
    CollidingIdentity,
}

impl ConfigRule {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigRule::DuplicateService => "duplicate_service",
            ConfigRule::NonUniqueClusterVariant => "non_unique_cluster_variant",
            ConfigRule::HeterogeneousServiceGroup => "heterogeneous_service_group",
            ConfigRule::UnknownCluster => "unknown_cluster",
            ConfigRule::UnknownServiceGroupType => "unknown_service_group_type",
            ConfigRule::InvalidPartitionSpec => "invalid_partition_spec",
            ConfigRule::CollidingIdentity => "colliding_identity",
        }
    }
}

impl fmt::Display for ConfigRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One counted configuration error: `entity` is withheld because of `rule`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{rule}: `{entity}` {detail}")]
pub struct ConfigError {
    pub rule: ConfigRule,
    /// The cluster or cluster variant that will not be published.
    pub entity: String,
    pub detail: String,
}

impl ConfigError {
    pub fn new(rule: ConfigRule, entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            rule,
            entity: entity.into(),
            detail: detail.into(),
        }
    }
}

/// Errors that abort a generator run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The declaration file could not be read.
    #[error("cannot read declaration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The declaration is not a well-formed topology.
    #[error("malformed declaration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Publishing to the registry failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
