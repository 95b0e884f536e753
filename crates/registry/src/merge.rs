//! Endpoint merge.
//!
//! The endpoint record a client reads is derived state: the merge of every
//! live session's contribution for a cluster. It is recomputed from scratch on
//! each membership change, so the merge is a pure function of the current
//! contribution set.
//!
//! # Algorithm
//!
//! 1. Flatten all contributions into `(sequence, session, uri, weights)`
//! 2. Sort by announcement sequence (oldest first)
//! 3. Fold into one `uri -> weights` map, extending each URI's partitions
//!
//! A URI announced by only one session passes through unchanged. A URI
//! announced by several live sessions gets the union of their partitions;
//! where two sessions name the same partition, the most recent announcement
//! wins. Neither contribution is dropped, so retracting one session leaves
//! the other's weights in place.

use std::collections::BTreeMap;

use corelib::{EndpointRecord, PartitionWeights};

use crate::session::SessionId;

/// One URI as announced by one session.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub weights: PartitionWeights,
    /// Registry-wide announcement order.
    pub sequence: u64,
}

/// Everything one session announced for one cluster, keyed by URI.
pub type Contribution = BTreeMap<String, Announcement>;

/// A merged record plus the URIs that more than one session announced.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    pub record: EndpointRecord,
    pub conflicts: Vec<String>,
}

/// Merge the live contributions for `cluster`.
pub fn merge_contributions<'a, I>(cluster: &str, contributions: I) -> MergeOutcome
where
    I: IntoIterator<Item = (&'a SessionId, &'a Contribution)>,
{
    let mut announced: Vec<(u64, SessionId, &str, &PartitionWeights)> = contributions
        .into_iter()
        .flat_map(|(session, contribution)| {
            contribution
                .iter()
                .map(move |(uri, announcement)| (announcement.sequence, *session, uri.as_str(), &announcement.weights))
        })
        .collect();
    announced.sort_by_key(|(sequence, session, _, _)| (*sequence, *session));

    let mut record = EndpointRecord::new(cluster);
    let mut owners: BTreeMap<&str, SessionId> = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (_, session, uri, weights) in announced {
        match owners.get(uri) {
            Some(owner) if *owner != session => {
                if !conflicts.iter().any(|seen: &String| seen == uri) {
                    conflicts.push(uri.to_string());
                }
            }
            Some(_) => (),
            None => {
                owners.insert(uri, session);
            }
        }
        record
            .endpoints
            .entry(uri.to_string())
            .or_default()
            .extend(weights.iter().map(|(partition, weight)| (*partition, *weight)));
    }

    MergeOutcome { record, conflicts }
}
