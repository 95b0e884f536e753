//! Hash-based partition accessor.

use crate::error::{PartitionError, Result};
use crate::partition::key::KeyExtractor;
use crate::partition::spec::{HashAlgorithm, HashSpec, PartitionId};
use crate::partition::traits::PartitionAccessor;

/// Hash partition accessor.
///
/// The algorithm is resolved against the [`HashAlgorithm`] allow-list when the
/// accessor is built, so an unknown name fails here and not on the first
/// request.
#[derive(Clone, Debug)]
pub struct HashPartitionAccessor {
    partition_count: u32,
    algorithm: HashAlgorithm,
    extractor: KeyExtractor,
}

impl HashPartitionAccessor {
    pub fn new(spec: &HashSpec) -> Result<Self> {
        if spec.partition_count == 0 {
            return Err(PartitionError::InvalidSpec("hash partition count must be positive".to_string()));
        }
        Ok(Self {
            partition_count: spec.partition_count,
            algorithm: spec.hash_algorithm.parse()?,
            extractor: KeyExtractor::new(&spec.partition_key_regex)?,
        })
    }

    /// The resolved hash function.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl PartitionAccessor for HashPartitionAccessor {
    fn partition_for_key(&self, key: i64) -> Result<PartitionId> {
        match self.algorithm {
            // Euclidean remainder keeps negative keys inside [0, count).
            HashAlgorithm::Modulo => Ok(key.rem_euclid(i64::from(self.partition_count)) as PartitionId),
        }
    }

    fn partition_for_uri(&self, uri: &str) -> Result<PartitionId> {
        let key = self.extractor.extract(uri)?;
        self.partition_for_key(key)
    }

    fn partition_count(&self) -> u32 {
        self.partition_count
    }

    fn name(&self) -> &'static str {
        "HashPartitionAccessor"
    }
}
