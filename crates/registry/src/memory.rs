//! In-memory registry.
//!
//! [`MemoryRegistry`] implements [`PropertyRegistry`] entirely in process. It
//! backs the CLI (through snapshots) and every test that needs a registry.
//!
//! # Storage
//!
//! - **Durable records** are held *encoded*, exactly as a coordination service
//!   would hold them, so every put/get round-trips through the codec
//! - **Contributions** are kept per cluster as a map keyed by [`SessionId`],
//!   guarded by one mutex so session close and announce never interleave
//! - **Merged views** are published per cluster through an [`ArcSwap`]; a
//!   reader loads a complete `Arc<EndpointRecord>` without taking the mutex
//!
//! # Recompute
//!
//! Any change to a cluster's contribution set recomputes the whole merge with
//! [`merge_contributions`], swaps it in, then notifies watchers. A cluster
//! left with no contributions and no watchers has its state released.
//!
//! Expired session ids are remembered up to [`MAX_EXPIRED_SESSIONS`], newest
//! first; older ones report [`RegistryError::UnknownSession`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use corelib::endpoint::scheme_of;
use corelib::{ClusterRecord, EndpointRecord, PartitionWeights, ServiceRecord};
use dashmap::DashMap;
use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::codec::{decode, encode};
use crate::error::{RegistryError, Result};
use crate::merge::{merge_contributions, Announcement, Contribution};
use crate::session::SessionId;
use crate::snapshot::RegistrySnapshot;
use crate::store::PropertyRegistry;

/// How many expired session ids are kept to answer `SessionExpired`.
pub const MAX_EXPIRED_SESSIONS: usize = 1024;

/// Service namespace (`None` is global) plus service name.
type ServiceKey = (Option<String>, String);

/// Live announcements for one cluster.
struct ClusterEndpoints {
    contributions: BTreeMap<SessionId, Contribution>,
    notify: watch::Sender<Arc<EndpointRecord>>,
}

impl ClusterEndpoints {
    fn new(cluster: &str) -> Self {
        let (notify, _) = watch::channel(Arc::new(EndpointRecord::new(cluster)));
        Self {
            contributions: BTreeMap::new(),
            notify,
        }
    }
}

/// Everything session-scoped.
#[derive(Default)]
struct EphemeralState {
    /// Live sessions and the clusters each has contributed to.
    sessions: HashMap<SessionId, BTreeSet<String>>,
    /// Sessions that ended by expiry rather than an explicit close.
    expired: BTreeSet<SessionId>,
    clusters: HashMap<String, ClusterEndpoints>,
}

/// A [`PropertyRegistry`] held in process memory.
pub struct MemoryRegistry {
    clusters: DashMap<String, Vec<u8>>,
    services: DashMap<ServiceKey, Vec<u8>>,
    ephemeral: Mutex<EphemeralState>,
    views: DashMap<String, Arc<ArcSwap<EndpointRecord>>>,
    next_session: AtomicU64,
    next_sequence: AtomicU64,
    unavailable: AtomicBool,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            clusters: DashMap::new(),
            services: DashMap::new(),
            ephemeral: Mutex::new(EphemeralState::default()),
            views: DashMap::new(),
            next_session: AtomicU64::new(1),
            next_sequence: AtomicU64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Create a registry holding the durable records of `snapshot`.
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Result<Self> {
        let registry = Self::new();
        for record in snapshot.clusters.values() {
            registry.clusters.insert(record.cluster_name.clone(), encode(record)?);
        }
        for record in snapshot.services.values() {
            registry.services.insert((None, record.service_name.clone()), encode(record)?);
        }
        for (group, services) in &snapshot.service_groups {
            for record in services.values() {
                registry
                    .services
                    .insert((Some(group.clone()), record.service_name.clone()), encode(record)?);
            }
        }
        Ok(registry)
    }

    /// Copy out every durable record. Session-scoped state is not included.
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let mut snapshot = RegistrySnapshot::default();
        for entry in self.clusters.iter() {
            let record: ClusterRecord = decode(entry.value())?;
            snapshot.clusters.insert(entry.key().clone(), record);
        }
        for entry in self.services.iter() {
            let record: ServiceRecord = decode(entry.value())?;
            let (group, name) = entry.key();
            match group {
                None => {
                    snapshot.services.insert(name.clone(), record);
                }
                Some(group) => {
                    snapshot
                        .service_groups
                        .entry(group.clone())
                        .or_default()
                        .insert(name.clone(), record);
                }
            }
        }
        Ok(snapshot)
    }

    /// Make every subsequent operation fail with [`RegistryError::Unavailable`]
    /// (or succeed again). Simulates losing the coordination service.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// End `session` as if the coordination service had timed it out. Its
    /// contributions are retracted like on close, and further use of the id
    /// fails with [`RegistryError::SessionExpired`].
    pub fn expire_session(&self, session: SessionId) {
        let mut state = self.ephemeral.lock();
        if state.sessions.contains_key(&session) {
            self.end_session(&mut state, session);
            state.expired.insert(session);
            while state.expired.len() > MAX_EXPIRED_SESSIONS {
                state.expired.pop_first();
            }
            tracing::warn!(session = %session, "session expired");
        }
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.ephemeral.lock().sessions.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("coordination service unreachable".to_string()));
        }
        Ok(())
    }

    fn check_session(state: &EphemeralState, session: SessionId) -> Result<()> {
        if state.sessions.contains_key(&session) {
            Ok(())
        } else if state.expired.contains(&session) {
            Err(RegistryError::SessionExpired(session))
        } else {
            Err(RegistryError::UnknownSession(session))
        }
    }

    fn validate_announcement(uri: &str, weights: &PartitionWeights) -> Result<()> {
        if scheme_of(uri).is_none() {
            return Err(RegistryError::InvalidAnnouncement {
                uri: uri.to_string(),
                reason: "missing scheme".to_string(),
            });
        }
        if let Some((partition, weight)) = weights.iter().find(|(_, weight)| !weight.is_finite() || **weight < 0.0) {
            return Err(RegistryError::InvalidAnnouncement {
                uri: uri.to_string(),
                reason: format!("partition {} has weight {}", partition, weight),
            });
        }
        Ok(())
    }

    fn view(&self, cluster: &str) -> Arc<ArcSwap<EndpointRecord>> {
        self.views
            .entry(cluster.to_string())
            .or_insert_with(|| Arc::new(ArcSwap::from_pointee(EndpointRecord::new(cluster))))
            .clone()
    }

    /// Recompute and publish the merged view of `cluster`. Must be called
    /// with the ephemeral lock held.
    fn remerge(&self, state: &mut EphemeralState, cluster: &str) {
        let endpoints = state
            .clusters
            .entry(cluster.to_string())
            .or_insert_with(|| ClusterEndpoints::new(cluster));
        if endpoints.contributions.is_empty() && endpoints.notify.receiver_count() == 0 {
            state.clusters.remove(cluster);
            self.views.remove(cluster);
            tracing::debug!(cluster = %cluster, "endpoint state released");
            return;
        }

        let outcome = merge_contributions(cluster, endpoints.contributions.iter());
        counter!("registry_endpoint_merges_total").increment(1);
        if !outcome.conflicts.is_empty() {
            counter!("registry_endpoint_conflicts_total").increment(outcome.conflicts.len() as u64);
            tracing::warn!(
                cluster = %cluster,
                uris = ?outcome.conflicts,
                "uri announced by more than one live session, merging per partition"
            );
        }

        let merged = Arc::new(outcome.record);
        self.view(cluster).store(merged.clone());
        endpoints.notify.send_replace(merged);
        tracing::debug!(cluster = %cluster, "endpoint view re-merged");
    }

    fn end_session(&self, state: &mut EphemeralState, session: SessionId) {
        let Some(touched) = state.sessions.remove(&session) else {
            return;
        };
        for cluster in touched {
            let removed = state
                .clusters
                .get_mut(&cluster)
                .and_then(|endpoints| endpoints.contributions.remove(&session))
                .is_some();
            if removed {
                self.remerge(state, &cluster);
            }
        }
    }
}

#[async_trait]
impl PropertyRegistry for MemoryRegistry {
    async fn put_cluster(&self, record: &ClusterRecord) -> Result<()> {
        self.check_available()?;
        self.clusters.insert(record.cluster_name.clone(), encode(record)?);
        Ok(())
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<ClusterRecord>> {
        self.check_available()?;
        match self.clusters.get(name) {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn list_clusters(&self) -> Result<Vec<String>> {
        self.check_available()?;
        let mut names: Vec<String> = self.clusters.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn put_service(&self, group: Option<&str>, record: &ServiceRecord) -> Result<()> {
        self.check_available()?;
        let key = (group.map(str::to_string), record.service_name.clone());
        self.services.insert(key, encode(record)?);
        Ok(())
    }

    async fn get_service(&self, name: &str, group: Option<&str>) -> Result<Option<ServiceRecord>> {
        self.check_available()?;
        let key = (group.map(str::to_string), name.to_string());
        match self.services.get(&key) {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn list_services(&self, group: Option<&str>) -> Result<Vec<String>> {
        self.check_available()?;
        let mut names: Vec<String> = self
            .services
            .iter()
            .filter(|entry| entry.key().0.as_deref() == group)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn open_session(&self) -> Result<SessionId> {
        self.check_available()?;
        let session = SessionId(self.next_session.fetch_add(1, Ordering::SeqCst));
        self.ephemeral.lock().sessions.insert(session, BTreeSet::new());
        tracing::info!(session = %session, "session opened");
        Ok(session)
    }

    async fn close_session(&self, session: SessionId) -> Result<()> {
        self.check_available()?;
        let mut state = self.ephemeral.lock();
        if state.sessions.contains_key(&session) {
            self.end_session(&mut state, session);
            tracing::info!(session = %session, "session closed");
        }
        Ok(())
    }

    async fn announce_endpoint(
        &self,
        session: SessionId,
        cluster: &str,
        uri: &str,
        weights: PartitionWeights,
    ) -> Result<()> {
        self.check_available()?;
        Self::validate_announcement(uri, &weights)?;

        let mut state = self.ephemeral.lock();
        Self::check_session(&state, session)?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        if let Some(touched) = state.sessions.get_mut(&session) {
            touched.insert(cluster.to_string());
        }
        state
            .clusters
            .entry(cluster.to_string())
            .or_insert_with(|| ClusterEndpoints::new(cluster))
            .contributions
            .entry(session)
            .or_default()
            .insert(uri.to_string(), Announcement { weights, sequence });
        tracing::info!(session = %session, cluster = %cluster, uri = %uri, "endpoint announced");

        self.remerge(&mut state, cluster);
        Ok(())
    }

    async fn retract_endpoint(&self, session: SessionId, cluster: &str, uri: &str) -> Result<bool> {
        self.check_available()?;

        let mut state = self.ephemeral.lock();
        Self::check_session(&state, session)?;
        let removed = state
            .clusters
            .get_mut(cluster)
            .and_then(|endpoints| endpoints.contributions.get_mut(&session))
            .and_then(|contribution| contribution.remove(uri))
            .is_some();
        if !removed {
            return Ok(false);
        }

        let now_empty = state
            .clusters
            .get(cluster)
            .and_then(|endpoints| endpoints.contributions.get(&session))
            .map_or(false, |contribution| contribution.is_empty());
        if now_empty {
            if let Some(endpoints) = state.clusters.get_mut(cluster) {
                endpoints.contributions.remove(&session);
            }
            if let Some(touched) = state.sessions.get_mut(&session) {
                touched.remove(cluster);
            }
        }
        tracing::info!(session = %session, cluster = %cluster, uri = %uri, "endpoint retracted");

        self.remerge(&mut state, cluster);
        Ok(true)
    }

    async fn get_endpoints(&self, cluster: &str) -> Result<Arc<EndpointRecord>> {
        self.check_available()?;
        Ok(match self.views.get(cluster) {
            Some(view) => view.load_full(),
            None => Arc::new(EndpointRecord::new(cluster)),
        })
    }

    async fn watch_endpoints(&self, cluster: &str) -> Result<watch::Receiver<Arc<EndpointRecord>>> {
        self.check_available()?;
        let mut state = self.ephemeral.lock();
        let endpoints = state
            .clusters
            .entry(cluster.to_string())
            .or_insert_with(|| ClusterEndpoints::new(cluster));
        Ok(endpoints.notify.subscribe())
    }
}
