//! Range-based partition accessor.
//!
//! The key space starting at `key_range_start` is cut into `partition_count`
//! consecutive ranges of `partition_size` keys each:
//!
//! ```text
//! key_range_start                                          end (exclusive)
//! |----- p0 -----|----- p1 -----| ... |----- p(n-1) -----|
//!       size           size                 size
//! ```
//!
//! Keys before the start or past the last range have no partition.

use crate::error::{PartitionError, Result};
use crate::partition::key::KeyExtractor;
use crate::partition::spec::{PartitionId, RangeSpec};
use crate::partition::traits::PartitionAccessor;

/// Range partition accessor.
#[derive(Clone, Debug)]
pub struct RangePartitionAccessor {
    key_range_start: i64,
    partition_size: i64,
    partition_count: u32,
    extractor: KeyExtractor,
}

impl RangePartitionAccessor {
    /// Build an accessor, rejecting non-positive sizes or counts and bad
    /// key patterns.
    pub fn new(spec: &RangeSpec) -> Result<Self> {
        if spec.partition_size <= 0 {
            return Err(PartitionError::InvalidSpec(format!(
                "range partition size must be positive, got {}",
                spec.partition_size
            )));
        }
        if spec.partition_count == 0 {
            return Err(PartitionError::InvalidSpec("range partition count must be positive".to_string()));
        }
        Ok(Self {
            key_range_start: spec.key_range_start,
            partition_size: spec.partition_size,
            partition_count: spec.partition_count,
            extractor: KeyExtractor::new(&spec.partition_key_regex)?,
        })
    }
}

impl PartitionAccessor for RangePartitionAccessor {
    fn partition_for_key(&self, key: i64) -> Result<PartitionId> {
        if key < self.key_range_start {
            return Err(PartitionError::OutOfRange { key });
        }
        // 128-bit so that `key - start` cannot overflow for any pair of i64s.
        let offset = i128::from(key) - i128::from(self.key_range_start);
        let id = offset / i128::from(self.partition_size);
        if id >= i128::from(self.partition_count) {
            return Err(PartitionError::OutOfRange { key });
        }
        // Bounded by partition_count above.
        Ok(id as PartitionId)
    }

    fn partition_for_uri(&self, uri: &str) -> Result<PartitionId> {
        let key = self.extractor.extract(uri)?;
        self.partition_for_key(key)
    }

    fn partition_count(&self) -> u32 {
        self.partition_count
    }

    fn name(&self) -> &'static str {
        "RangePartitionAccessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(start: i64, size: i64, count: u32) -> RangeSpec {
        RangeSpec {
            key_range_start: start,
            partition_size: size,
            partition_count: count,
            partition_key_regex: r"\bid\b=(\d+)".to_string(),
        }
    }

    #[test]
    fn test_range_boundaries() {
        let accessor = RangePartitionAccessor::new(&spec(0, 100, 10)).unwrap();
        assert_eq!(accessor.partition_for_key(0).unwrap(), 0);
        assert_eq!(accessor.partition_for_key(99).unwrap(), 0);
        assert_eq!(accessor.partition_for_key(176).unwrap(), 1);
        assert_eq!(accessor.partition_for_key(833).unwrap(), 8);
        assert_eq!(accessor.partition_for_key(999).unwrap(), 9);
        assert_eq!(accessor.partition_for_key(-1), Err(PartitionError::OutOfRange { key: -1 }));
        assert_eq!(accessor.partition_for_key(1000), Err(PartitionError::OutOfRange { key: 1000 }));
    }

    #[test]
    fn test_range_with_offset_start() {
        let accessor = RangePartitionAccessor::new(&spec(-500, 250, 4)).unwrap();
        assert_eq!(accessor.partition_for_key(-500).unwrap(), 0);
        assert_eq!(accessor.partition_for_key(-251).unwrap(), 0);
        assert_eq!(accessor.partition_for_key(-250).unwrap(), 1);
        assert_eq!(accessor.partition_for_key(499).unwrap(), 3);
        assert!(accessor.partition_for_key(500).is_err());
    }

    #[test]
    fn test_range_extreme_keys_do_not_overflow() {
        let accessor = RangePartitionAccessor::new(&spec(i64::MIN, i64::MAX, 3)).unwrap();
        assert_eq!(accessor.partition_for_key(i64::MIN).unwrap(), 0);
        assert_eq!(accessor.partition_for_key(i64::MAX).unwrap(), 2);
    }

    #[test]
    fn test_range_invalid_specs() {
        assert!(matches!(RangePartitionAccessor::new(&spec(0, 0, 10)), Err(PartitionError::InvalidSpec(_))));
        assert!(matches!(RangePartitionAccessor::new(&spec(0, -5, 10)), Err(PartitionError::InvalidSpec(_))));
        assert!(matches!(RangePartitionAccessor::new(&spec(0, 100, 0)), Err(PartitionError::InvalidSpec(_))));
    }
}
