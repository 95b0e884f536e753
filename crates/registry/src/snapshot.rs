//! Registry snapshots.
//!
//! A snapshot is the durable half of a registry written to a JSON file. The
//! CLI uses one as its registry target: load, run, save. Endpoint
//! announcements are session-scoped and never appear in a snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use corelib::{ClusterRecord, ServiceRecord};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::Result;

/// All durable records of a registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    /// Cluster name to record.
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterRecord>,
    /// Global service namespace.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceRecord>,
    /// Service group name to that group's service namespace.
    #[serde(default)]
    pub service_groups: BTreeMap<String, BTreeMap<String, ServiceRecord>>,
}

impl RegistrySnapshot {
    /// Read a snapshot file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot yet, starting empty");
            return Ok(Self::default());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the snapshot, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.clusters.len() + self.services.len() + self.service_groups.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = RegistrySnapshot::load(&dir.path().join("absent.json")).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut snapshot = RegistrySnapshot::default();
        snapshot
            .clusters
            .insert("c1".to_string(), ClusterRecord::new("c1", vec!["http".to_string()]));
        let service = ServiceRecord {
            service_name: "s".to_string(),
            cluster_name: "c1".to_string(),
            path: "/s".to_string(),
            load_balancer_strategy_list: vec!["degrader".to_string()],
            load_balancer_strategy_properties: BTreeMap::new(),
        };
        snapshot
            .service_groups
            .entry("g".to_string())
            .or_default()
            .insert("s".to_string(), service.clone());
        snapshot.services.insert("s".to_string(), service);
        snapshot.save(&path).unwrap();

        let loaded = RegistrySnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_corrupt_file_is_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(RegistrySnapshot::load(&path), Err(crate::RegistryError::Codec(_))));
    }
}
