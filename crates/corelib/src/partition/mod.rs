//! Partition accessor abstraction.
//!
//! Accessors are responsible for converting request keys (or request URIs)
//! into the id of the partition that serves them:
//! - [`DefaultPartitionAccessor`]: unpartitioned clusters, always partition 0
//! - [`RangePartitionAccessor`]: fixed-size key ranges
//! - [`HashPartitionAccessor`]: keys hashed into buckets

pub mod default;
pub mod hash;
pub mod key;
pub mod range;
pub mod spec;
pub mod traits;

pub use default::DefaultPartitionAccessor;
pub use hash::HashPartitionAccessor;
pub use key::{parse_key, KeyExtractor};
pub use range::RangePartitionAccessor;
pub use spec::{HashAlgorithm, HashSpec, PartitionId, PartitionSpec, RangeSpec, DEFAULT_PARTITION_ID};
pub use traits::PartitionAccessor;

use crate::error::Result;

/// Build the accessor described by `spec`.
///
/// This is the only place a [`PartitionSpec`] is turned into routing logic;
/// every variant is checked here, so a spec that builds an accessor can route
/// any request without further validation.
pub fn accessor_for(spec: &PartitionSpec) -> Result<Box<dyn PartitionAccessor>> {
    Ok(match spec {
        PartitionSpec::None => Box::new(DefaultPartitionAccessor),
        PartitionSpec::Range(range) => Box::new(RangePartitionAccessor::new(range)?),
        PartitionSpec::Hash(hash) => Box::new(HashPartitionAccessor::new(hash)?),
    })
}
