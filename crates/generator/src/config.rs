//! The declared topology.
//!
//! Operators describe clusters, their services, datacenter (colo) variants,
//! cluster variants and service groups once, in JSON. The generator expands
//! this declaration into concrete registry records; the declaration itself is
//! never stored.
//!
//! # Format
//!
//! ```json
//! {
//!   "defaultColo": "EastCoast",
//!   "clusterServiceConfigurations": {
//!     "cluster-1": {
//!       "services": ["service-1_1", "service-1_2"],
//!       "coloVariants": ["WestCoast", "EastCoast"],
//!       "masterColo": "WestCoast",
//!       "clusterVariants": { "cluster1Foo": {} }
//!     }
//!   },
//!   "serviceVariants": {
//!     "ServiceGroup1": { "type": "clusterVariantsList", "clusterList": ["cluster1Foo"] }
//!   }
//! }
//! ```
//!
//! Every map is a `BTreeMap`, so iterating a declaration (and therefore
//! expanding it) is deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use corelib::cluster::PROP_REQUEST_TIMEOUT;
use corelib::service::{
    PROP_DEFAULT_SUCCESSFUL_TRANSMISSION_WEIGHT, PROP_MAX_CLUSTER_LATENCY_WITHOUT_DEGRADING, PROP_POINTS_PER_WEIGHT,
    PROP_UPDATE_INTERVALS_MS,
};
use corelib::{ClusterRecord, PartitionSpec, ServiceRecord};
use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, Result};

/// Service group type tags the generator understands.
pub const CLUSTER_VARIANTS_LIST: &[&str] = &["clusterVariantsList", "cluster-variants-list"];

/// Suffix of the service bound to a cluster's master colo.
pub const MASTER_SUFFIX: &str = "Master";

/// A whole topology declaration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredTopology {
    /// Colo that unsuffixed service names route to.
    #[serde(default)]
    pub default_colo: Option<String>,
    #[serde(default)]
    pub cluster_defaults: ClusterDefaults,
    #[serde(default)]
    pub service_defaults: ServiceDefaults,
    /// Base cluster name to its declaration.
    #[serde(default)]
    pub cluster_service_configurations: BTreeMap<String, ClusterDeclaration>,
    /// Service group name to its declaration.
    #[serde(default)]
    pub service_variants: BTreeMap<String, ServiceGroupDeclaration>,
}

impl DeclaredTopology {
    /// Parse a declaration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a declaration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| GeneratorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The default colo, if one is set and non-empty.
    pub fn default_colo(&self) -> Option<&str> {
        self.default_colo.as_deref().filter(|colo| !colo.is_empty())
    }

    /// Names of all cluster variants declared under any base cluster, with
    /// the base that declares each.
    pub fn variants(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cluster_service_configurations.iter().flat_map(|(base, cluster)| {
            cluster
                .cluster_variants
                .keys()
                .map(move |variant| (variant.as_str(), base.as_str()))
        })
    }
}

/// Cluster settings applied unless a cluster overrides them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterDefaults {
    pub prioritized_schemes: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub banned: BTreeSet<String>,
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(PROP_REQUEST_TIMEOUT.to_string(), "10000".to_string());
        Self {
            prioritized_schemes: vec!["http".to_string()],
            properties,
            banned: BTreeSet::new(),
        }
    }
}

/// Service settings applied unless a service overrides them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDefaults {
    pub load_balancer_strategy_list: Vec<String>,
    pub load_balancer_strategy_properties: BTreeMap<String, String>,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        let properties = [
            (PROP_MAX_CLUSTER_LATENCY_WITHOUT_DEGRADING, "500"),
            (PROP_UPDATE_INTERVALS_MS, "5000"),
            (PROP_DEFAULT_SUCCESSFUL_TRANSMISSION_WEIGHT, "1.0"),
            (PROP_POINTS_PER_WEIGHT, "100"),
        ];
        Self {
            load_balancer_strategy_list: vec!["degrader".to_string(), "degraderV3".to_string()],
            load_balancer_strategy_properties: properties
                .iter()
                .map(|(key, val)| (key.to_string(), val.to_string()))
                .collect(),
        }
    }
}

/// Services of a cluster: either bare names or names with overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServicesDeclaration {
    Names(Vec<String>),
    Detailed(BTreeMap<String, ServiceDeclaration>),
}

impl Default for ServicesDeclaration {
    fn default() -> Self {
        ServicesDeclaration::Names(Vec::new())
    }
}

impl ServicesDeclaration {
    /// Declared service names, in declaration order for lists.
    pub fn names(&self) -> Vec<&str> {
        match self {
            ServicesDeclaration::Names(names) => names.iter().map(String::as_str).collect(),
            ServicesDeclaration::Detailed(services) => services.keys().map(String::as_str).collect(),
        }
    }

    /// Overrides declared for `name`.
    pub fn overrides(&self, name: &str) -> Option<&ServiceDeclaration> {
        match self {
            ServicesDeclaration::Names(_) => None,
            ServicesDeclaration::Detailed(services) => services.get(name),
        }
    }
}

/// Per-service overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeclaration {
    /// Path prefix; `/<service name>` when absent.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub load_balancer_strategy_list: Option<Vec<String>>,
    /// Merged over the defaults key by key.
    #[serde(default)]
    pub load_balancer_strategy_properties: Option<BTreeMap<String, String>>,
}

/// Settings a cluster variant may change relative to its base cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOverrides {
    #[serde(default)]
    pub prioritized_schemes: Option<Vec<String>>,
    /// Merged over the base properties key by key.
    #[serde(default)]
    pub properties: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub banned: Option<BTreeSet<String>>,
    #[serde(default)]
    pub partition_properties: Option<PartitionSpec>,
}

/// One base cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeclaration {
    #[serde(default)]
    pub services: ServicesDeclaration,
    /// Colos this cluster is deployed in. Colo expansion happens only when
    /// this is non-empty.
    #[serde(default)]
    pub colo_variants: Vec<String>,
    #[serde(default)]
    pub master_colo: Option<String>,
    /// Cluster settings on top of the defaults.
    #[serde(flatten)]
    pub settings: ClusterOverrides,
    /// Variant name to the settings it changes.
    #[serde(default)]
    pub cluster_variants: BTreeMap<String, ClusterOverrides>,
}

impl ClusterDeclaration {
    /// Colo variants, ignoring empty names.
    pub fn colos(&self) -> Vec<&str> {
        self.colo_variants
            .iter()
            .map(String::as_str)
            .filter(|colo| !colo.is_empty())
            .collect()
    }

    /// The master colo, if one is set and non-empty.
    pub fn master_colo(&self) -> Option<&str> {
        self.master_colo.as_deref().filter(|colo| !colo.is_empty())
    }

    /// Partition spec of the base cluster.
    pub fn partition_spec(&self) -> PartitionSpec {
        self.settings.partition_properties.clone().unwrap_or_default()
    }

    /// Partition spec of a variant: its own, else the base's.
    pub fn variant_partition_spec(&self, overrides: &ClusterOverrides) -> PartitionSpec {
        overrides
            .partition_properties
            .clone()
            .unwrap_or_else(|| self.partition_spec())
    }

    /// The base cluster's record, named `name`.
    pub fn cluster_record(&self, name: &str, defaults: &ClusterDefaults) -> ClusterRecord {
        let mut record = ClusterRecord::new(name, defaults.prioritized_schemes.clone());
        record.properties = defaults.properties.clone();
        record.banned = defaults.banned.clone();
        apply_overrides(&mut record, &self.settings);
        record
    }

    /// A variant's record: the base record with `overrides` applied.
    pub fn variant_record(&self, name: &str, overrides: &ClusterOverrides, defaults: &ClusterDefaults) -> ClusterRecord {
        let mut record = self.cluster_record(name, defaults);
        apply_overrides(&mut record, overrides);
        record
    }

    /// A record for service `service` bound to `cluster` under `name`.
    pub fn service_record(&self, service: &str, name: &str, cluster: &str, defaults: &ServiceDefaults) -> ServiceRecord {
        let overrides = self.services.overrides(service);
        let path = overrides
            .and_then(|decl| decl.path.clone())
            .unwrap_or_else(|| format!("/{}", service));
        let strategies = overrides
            .and_then(|decl| decl.load_balancer_strategy_list.clone())
            .unwrap_or_else(|| defaults.load_balancer_strategy_list.clone());
        let mut properties = defaults.load_balancer_strategy_properties.clone();
        if let Some(extra) = overrides.and_then(|decl| decl.load_balancer_strategy_properties.as_ref()) {
            properties.extend(extra.iter().map(|(key, val)| (key.clone(), val.clone())));
        }

        ServiceRecord {
            service_name: name.to_string(),
            cluster_name: cluster.to_string(),
            path,
            load_balancer_strategy_list: strategies,
            load_balancer_strategy_properties: properties,
        }
    }
}

fn apply_overrides(record: &mut ClusterRecord, overrides: &ClusterOverrides) {
    if let Some(schemes) = &overrides.prioritized_schemes {
        record.prioritized_schemes = schemes.clone();
    }
    if let Some(properties) = &overrides.properties {
        record
            .properties
            .extend(properties.iter().map(|(key, val)| (key.clone(), val.clone())));
    }
    if let Some(banned) = &overrides.banned {
        record.banned = banned.clone();
    }
    if let Some(spec) = &overrides.partition_properties {
        record.partition_properties = spec.clone();
    }
}

/// A service group: a namespace binding every service of the listed clusters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroupDeclaration {
    /// Group type tag; unknown tags are reported, not rejected at parse time.
    #[serde(rename = "type")]
    pub kind: String,
    /// Cluster or cluster variant names the group binds.
    #[serde(default)]
    pub cluster_list: Vec<String>,
}

impl ServiceGroupDeclaration {
    pub fn is_known_type(&self) -> bool {
        CLUSTER_VARIANTS_LIST.contains(&self.kind.as_str())
    }
}
