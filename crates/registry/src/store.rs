//! The coordination-service seam.
//!
//! [`PropertyRegistry`] is everything the generator and routing clients need
//! from the coordination service:
//!
//! - **Durable records**: cluster and service records, whole-record
//!   last-writer-wins writes visible as soon as the write is acknowledged
//! - **Session-scoped announcements**: per-session endpoint contributions that
//!   vanish when the session ends
//! - **Merged endpoint views**: the union of all live contributions per
//!   cluster, readable and watchable
//!
//! Components receive the registry as an injected dependency; there is no
//! process-wide instance.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{ClusterRecord, EndpointRecord, PartitionId, PartitionWeights, ServiceRecord};
use tokio::sync::watch;

use crate::error::Result;
use crate::session::SessionId;

/// Typed read/write/merge façade over the coordination service.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the generator and any number of
/// announcers share one registry concurrently.
#[async_trait]
pub trait PropertyRegistry: Send + Sync {
    /// Write a cluster record, replacing any previous one with that name.
    async fn put_cluster(&self, record: &ClusterRecord) -> Result<()>;

    /// Read a cluster record.
    async fn get_cluster(&self, name: &str) -> Result<Option<ClusterRecord>>;

    /// Names of all stored clusters, sorted.
    async fn list_clusters(&self) -> Result<Vec<String>>;

    /// Write a service record into `group`'s namespace (`None` is the global
    /// namespace), replacing any previous one with that name.
    async fn put_service(&self, group: Option<&str>, record: &ServiceRecord) -> Result<()>;

    /// Read a service record from `group`'s namespace.
    async fn get_service(&self, name: &str, group: Option<&str>) -> Result<Option<ServiceRecord>>;

    /// Names of all services stored in `group`'s namespace, sorted.
    async fn list_services(&self, group: Option<&str>) -> Result<Vec<String>>;

    /// Start a new announcer session.
    async fn open_session(&self) -> Result<SessionId>;

    /// End a session. Everything it announced is retracted and the affected
    /// endpoint views are re-merged. Closing an unknown session is a no-op.
    async fn close_session(&self, session: SessionId) -> Result<()>;

    /// Announce `uri` for `cluster` under `session`, replacing whatever that
    /// session previously announced for the URI.
    async fn announce_endpoint(
        &self,
        session: SessionId,
        cluster: &str,
        uri: &str,
        weights: PartitionWeights,
    ) -> Result<()>;

    /// Retract `uri` from `session`'s contribution to `cluster`.
    ///
    /// # Returns
    /// `true` if the session had announced the URI
    async fn retract_endpoint(&self, session: SessionId, cluster: &str, uri: &str) -> Result<bool>;

    /// The current merged endpoint view of `cluster`. Empty if nothing is
    /// announced.
    async fn get_endpoints(&self, cluster: &str) -> Result<Arc<EndpointRecord>>;

    /// Subscribe to the merged endpoint view of `cluster`. The receiver holds
    /// the current view and is notified on every re-merge.
    async fn watch_endpoints(&self, cluster: &str) -> Result<watch::Receiver<Arc<EndpointRecord>>>;

    /// Endpoints of `cluster` using `scheme` that serve `partition`.
    async fn query_by_partition(
        &self,
        cluster: &str,
        scheme: &str,
        partition: PartitionId,
    ) -> Result<BTreeSet<String>> {
        let record = self.get_endpoints(cluster).await?;
        Ok(record.uris_for(scheme, partition))
    }
}
