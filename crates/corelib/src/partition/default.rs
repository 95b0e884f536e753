//! Accessor for unpartitioned clusters.

use crate::error::Result;
use crate::partition::spec::{PartitionId, DEFAULT_PARTITION_ID};
use crate::partition::traits::PartitionAccessor;

/// Routes every key and every URI to partition 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPartitionAccessor;

impl PartitionAccessor for DefaultPartitionAccessor {
    fn partition_for_key(&self, _key: i64) -> Result<PartitionId> {
        Ok(DEFAULT_PARTITION_ID)
    }

    fn partition_for_uri(&self, _uri: &str) -> Result<PartitionId> {
        Ok(DEFAULT_PARTITION_ID)
    }

    fn partition_count(&self) -> u32 {
        1
    }

    fn name(&self) -> &'static str {
        "DefaultPartitionAccessor"
    }
}
