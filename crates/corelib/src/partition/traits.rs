//! Core partition accessor trait definitions.

use std::fmt::Debug;

use crate::error::Result;
use crate::partition::key::parse_key;
use crate::partition::spec::PartitionId;

/// A partition accessor maps request keys onto partition ids.
///
/// Accessors are pure and immutable once built, so a single instance can be
/// shared across threads and queried without synchronization.
pub trait PartitionAccessor: Send + Sync + Debug + 'static {
    /// Map a numeric key to its partition.
    ///
    /// # Arguments
    ///
    /// * `key` - The request key
    ///
    /// # Returns
    ///
    /// The partition id, or `OutOfRange` if no partition covers the key
    fn partition_for_key(&self, key: i64) -> Result<PartitionId>;

    /// Extract the key from a request URI and map it to its partition.
    fn partition_for_uri(&self, uri: &str) -> Result<PartitionId>;

    /// Parse a decimal key and map it to its partition.
    fn partition_for_key_str(&self, text: &str) -> Result<PartitionId> {
        self.partition_for_key(parse_key(text)?)
    }

    /// Returns the number of partitions this accessor routes to.
    fn partition_count(&self) -> u32;

    /// Returns the name of this accessor.
    fn name(&self) -> &'static str;
}
