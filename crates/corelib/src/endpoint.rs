//! Endpoint records for the consistent view of a cluster's live hosts.
//!
//! Each announcer contributes a mapping from endpoint URI to per-partition
//! weights. The registry merges every live contribution for a cluster into one
//! [`EndpointRecord`], which is what clients read.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::partition::{PartitionId, DEFAULT_PARTITION_ID};

/// Partition id to non-negative weight.
pub type PartitionWeights = BTreeMap<PartitionId, f64>;

/// Weights for an endpoint of an unpartitioned cluster.
pub fn default_weights(weight: f64) -> PartitionWeights {
    let mut weights = PartitionWeights::new();
    weights.insert(DEFAULT_PARTITION_ID, weight);
    weights
}

/// Scheme of an endpoint URI (the text before the first `:`).
pub fn scheme_of(uri: &str) -> Option<&str> {
    uri.split_once(':').map(|(scheme, _)| scheme).filter(|scheme| !scheme.is_empty())
}

/// The merged set of live endpoints for one cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    pub cluster_name: String,
    /// Endpoint URI to the partitions it serves.
    #[serde(default)]
    pub endpoints: BTreeMap<String, PartitionWeights>,
}

impl EndpointRecord {
    /// An empty record for `cluster_name`.
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            endpoints: BTreeMap::new(),
        }
    }

    /// All endpoint URIs.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// The partition weights advertised by `uri`.
    pub fn partition_weights(&self, uri: &str) -> Option<&PartitionWeights> {
        self.endpoints.get(uri)
    }

    /// The weight `uri` carries for `partition`.
    pub fn weight(&self, uri: &str, partition: PartitionId) -> Option<f64> {
        self.endpoints.get(uri).and_then(|weights| weights.get(&partition)).copied()
    }

    /// Endpoints with the given scheme that serve `partition`.
    pub fn uris_for(&self, scheme: &str, partition: PartitionId) -> BTreeSet<String> {
        self.endpoints
            .iter()
            .filter(|(uri, weights)| scheme_of(uri) == Some(scheme) && weights.contains_key(&partition))
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
