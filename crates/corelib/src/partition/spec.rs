//! Partition specifications as stored inside a cluster record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, Result};
use crate::partition::accessor_for;

/// Numbered shard of a cluster's key space.
pub type PartitionId = u32;

/// The partition every key maps to when a cluster is not partitioned.
pub const DEFAULT_PARTITION_ID: PartitionId = 0;

/// How a cluster's key space is split into partitions.
///
/// Serialized with a `partitionType` tag (`NONE`, `RANGE`, `HASH`). An unknown
/// tag is rejected when the record is decoded, never at routing time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "partitionType", rename_all = "UPPERCASE")]
pub enum PartitionSpec {
    /// A single implicit partition, id 0.
    #[default]
    None,
    /// Contiguous key ranges of equal size.
    Range(RangeSpec),
    /// Keys hashed into a fixed number of buckets.
    Hash(HashSpec),
}

impl PartitionSpec {
    /// Check that an accessor can be built from this spec.
    ///
    /// The generator calls this before publishing a cluster so that a record
    /// which no client could route with never reaches the registry.
    pub fn validate(&self) -> Result<()> {
        accessor_for(self).map(|_| ())
    }

    /// Number of partitions described by this spec.
    pub fn partition_count(&self) -> u32 {
        match self {
            PartitionSpec::None => 1,
            PartitionSpec::Range(range) => range.partition_count,
            PartitionSpec::Hash(hash) => hash.partition_count,
        }
    }

    /// True for the unpartitioned variant.
    pub fn is_none(&self) -> bool {
        matches!(self, PartitionSpec::None)
    }
}

/// Range partitioning: `id = (key - key_range_start) / partition_size`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSpec {
    pub key_range_start: i64,
    pub partition_size: i64,
    pub partition_count: u32,
    /// Pattern with one capture group selecting the key inside a URI.
    pub partition_key_regex: String,
}

/// Hash partitioning: `id = hash(key) mod partition_count`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashSpec {
    pub partition_count: u32,
    /// Name of the hash function; checked against [`HashAlgorithm`] when an
    /// accessor is built.
    pub hash_algorithm: String,
    /// Pattern with one capture group selecting the key inside a URI.
    pub partition_key_regex: String,
}

/// Allow-list of hash functions usable by [`HashSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// `key mod partition_count`.
    Modulo,
}

impl HashAlgorithm {
    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Modulo => "modulo",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = PartitionError;

    fn from_str(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case("modulo") {
            Ok(HashAlgorithm::Modulo)
        } else {
            Err(PartitionError::UnknownHashAlgorithm(name.to_string()))
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
