//! Cluster records.
//!
//! A cluster is a named group of interchangeable endpoints behind one routing
//! identity. Its record is written whole by the generator and read by clients
//! when they build a partition accessor or pick a transport scheme.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::partition::{accessor_for, PartitionAccessor, PartitionSpec};

/// Property holding the request timeout in milliseconds.
pub const PROP_REQUEST_TIMEOUT: &str = "requestTimeout";

/// The registry entry for one cluster.
///
/// Maps and sets are ordered so that encoding the same record twice yields
/// identical bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRecord {
    /// Globally unique cluster name.
    pub cluster_name: String,
    /// Transport schemes in client preference order.
    pub prioritized_schemes: Vec<String>,
    /// Free-form properties; always carries `requestTimeout`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// How the cluster's key space is partitioned.
    #[serde(default)]
    pub partition_properties: PartitionSpec,
    /// Endpoint URIs clients must never route to.
    #[serde(default)]
    pub banned: BTreeSet<String>,
}

impl ClusterRecord {
    /// Create an unpartitioned record with no properties.
    pub fn new(name: impl Into<String>, prioritized_schemes: Vec<String>) -> Self {
        Self {
            cluster_name: name.into(),
            prioritized_schemes,
            properties: BTreeMap::new(),
            partition_properties: PartitionSpec::None,
            banned: BTreeSet::new(),
        }
    }

    /// Copy of this record published under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            cluster_name: name.into(),
            ..self.clone()
        }
    }

    /// The request timeout in milliseconds, if present and numeric.
    pub fn request_timeout(&self) -> Option<u64> {
        self.properties.get(PROP_REQUEST_TIMEOUT).and_then(|val| val.parse().ok())
    }

    /// True if clients must not route to `uri`.
    pub fn is_banned(&self, uri: &str) -> bool {
        self.banned.contains(uri)
    }

    /// Build the accessor clients use to route requests to this cluster.
    pub fn accessor(&self) -> Result<Box<dyn PartitionAccessor>> {
        accessor_for(&self.partition_properties)
    }
}
