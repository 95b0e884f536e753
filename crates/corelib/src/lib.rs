//! Core library for service topology and partition routing.
//!
//! This crate provides the fundamental abstractions shared by the registry,
//! the topology generator and routing clients:
//! - Cluster, service and endpoint records
//! - Partition specs and the accessors that route keys to partitions
//! - Partition key extraction from request URIs
//! - The suffix naming rule used by datacenter and variant expansion

pub mod cluster;
pub mod endpoint;
pub mod error;
pub mod naming;
pub mod partition;
pub mod service;

pub use cluster::ClusterRecord;
pub use endpoint::{EndpointRecord, PartitionWeights};
pub use error::{PartitionError, Result};
pub use naming::add_suffix;
pub use partition::{accessor_for, PartitionAccessor, PartitionId, PartitionSpec};
pub use service::ServiceRecord;
