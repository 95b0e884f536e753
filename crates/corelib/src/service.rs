//! Service records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Latency ceiling (ms) above which the degrader starts shedding load.
pub const PROP_MAX_CLUSTER_LATENCY_WITHOUT_DEGRADING: &str = "maxClusterLatencyWithoutDegrading";
/// Interval (ms) between load balancer state updates.
pub const PROP_UPDATE_INTERVALS_MS: &str = "updateIntervalsMs";
/// Weight given to a successful transmission.
pub const PROP_DEFAULT_SUCCESSFUL_TRANSMISSION_WEIGHT: &str = "defaultSuccessfulTransmissionWeight";
/// Hash ring points allotted per unit of endpoint weight.
pub const PROP_POINTS_PER_WEIGHT: &str = "pointsPerWeight";

/// The registry entry for one service.
///
/// Service names are unique across the whole registry, not per cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub service_name: String,
    /// The cluster serving this service.
    pub cluster_name: String,
    /// Routable path prefix, e.g. `/profiles`.
    pub path: String,
    /// Load balancer strategies, tried in order.
    pub load_balancer_strategy_list: Vec<String>,
    #[serde(default)]
    pub load_balancer_strategy_properties: BTreeMap<String, String>,
}

impl ServiceRecord {
    pub fn max_cluster_latency_without_degrading(&self) -> Option<u64> {
        self.knob(PROP_MAX_CLUSTER_LATENCY_WITHOUT_DEGRADING)
    }

    pub fn update_intervals_ms(&self) -> Option<u64> {
        self.knob(PROP_UPDATE_INTERVALS_MS)
    }

    pub fn default_successful_transmission_weight(&self) -> Option<f64> {
        self.knob(PROP_DEFAULT_SUCCESSFUL_TRANSMISSION_WEIGHT)
    }

    pub fn points_per_weight(&self) -> Option<u32> {
        self.knob(PROP_POINTS_PER_WEIGHT)
    }

    fn knob<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.load_balancer_strategy_properties.get(name).and_then(|val| val.parse().ok())
    }
}
