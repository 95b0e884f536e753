//! Datacenter and variant expansion.
//!
//! Expansion turns a validated declaration into the flat set of records to
//! publish. It performs no I/O and is a pure function of its inputs.
//!
//! # Naming
//!
//! For a cluster identity `X` (a base cluster or a cluster variant) with
//! colos `[D1, D2]`, master colo `M` and run default colo `F`:
//!
//! | record                 | cluster      |
//! |------------------------|--------------|
//! | `X-D1`, `X-D2`         | per colo     |
//! | `X-M`                  | master       |
//! | `X-F`                  | default colo |
//!
//! and for each service `s` of the base cluster:
//!
//! | service        | bound to | namespace      |
//! |----------------|----------|----------------|
//! | `s-D`          | `X-D`    | global / group |
//! | `sMaster`      | `X-M`    | global / group |
//! | `s`            | `X-F`    | global         |
//! | `s`            | `X-M`    | group          |
//!
//! Without colos, `X` itself is the only cluster and `s` binds to it. Records
//! that name the same identity (the master colo is usually also a colo) are
//! emitted once. A name produced by two different entities, or twice with
//! different contents, is a collision; [`validate`](crate::validate::validate) withholds
//! every entity involved.

use std::collections::BTreeMap;

use corelib::{add_suffix, ClusterRecord, ServiceRecord};

use crate::config::{ClusterDeclaration, DeclaredTopology, MASTER_SUFFIX};
use crate::error::ConfigError;
use crate::validate::{resolve_names, Validation};

/// Service namespace (`None` is global) and service name.
pub type ServiceKey = (Option<String>, String);

/// Everything one generator run would publish.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Plan {
    /// Cluster records by name.
    pub clusters: BTreeMap<String, ClusterRecord>,
    /// Service records by namespace and name.
    pub services: BTreeMap<ServiceKey, ServiceRecord>,
    /// Configuration errors found while validating.
    pub errors: Vec<ConfigError>,
}

impl Plan {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterRecord> {
        self.clusters.get(name)
    }

    pub fn service(&self, name: &str, group: Option<&str>) -> Option<&ServiceRecord> {
        self.services.get(&(group.map(str::to_string), name.to_string()))
    }
}

/// A plan under construction, tracking which declared entity produced each
/// record.
#[derive(Default)]
struct Expansion {
    plan: Plan,
    cluster_owners: BTreeMap<String, String>,
    service_owners: BTreeMap<ServiceKey, String>,
    /// Entities whose records clash with another record, with the reason.
    collisions: BTreeMap<String, String>,
}

impl Expansion {
    fn add_cluster(&mut self, owner: &str, record: ClusterRecord) {
        let what = format!("cluster `{}`", record.cluster_name);
        let name = record.cluster_name.clone();
        if let Some(previous) = claim(&mut self.plan.clusters, &mut self.cluster_owners, name, owner, record) {
            self.collide(&previous, owner, &what);
        }
    }

    fn add_service(&mut self, owner: &str, group: Option<&str>, record: ServiceRecord) {
        let what = match group {
            Some(group) => format!("service `{}` in group `{}`", record.service_name, group),
            None => format!("service `{}`", record.service_name),
        };
        let key = (group.map(str::to_string), record.service_name.clone());
        if let Some(previous) = claim(&mut self.plan.services, &mut self.service_owners, key, owner, record) {
            self.collide(&previous, owner, &what);
        }
    }

    fn collide(&mut self, previous: &str, owner: &str, what: &str) {
        if previous == owner {
            self.collisions
                .entry(owner.to_string())
                .or_insert_with(|| format!("derives {} twice with different contents", what));
            return;
        }
        self.collisions
            .entry(previous.to_string())
            .or_insert_with(|| format!("derives {} that `{}` also derives", what, owner));
        self.collisions
            .entry(owner.to_string())
            .or_insert_with(|| format!("derives {} that `{}` also derives", what, previous));
    }
}

/// Insert `record` under `key` unless another record already holds it.
///
/// Re-inserting an identical record from the same owner is a no-op. Any other
/// clash keeps the first record and returns the owner holding it.
fn claim<K: Ord + Clone, V: PartialEq>(
    records: &mut BTreeMap<K, V>,
    owners: &mut BTreeMap<K, String>,
    key: K,
    owner: &str,
    record: V,
) -> Option<String> {
    match owners.get(&key) {
        Some(previous) if previous == owner && records.get(&key) == Some(&record) => None,
        Some(previous) => Some(previous.clone()),
        None => {
            owners.insert(key.clone(), owner.to_string());
            records.insert(key, record);
            None
        }
    }
}

/// Where the identities derived from one cluster name live.
struct Placement<'a> {
    colos: Vec<&'a str>,
    master: Option<&'a str>,
    default: Option<&'a str>,
}

impl<'a> Placement<'a> {
    fn new(cluster: &'a ClusterDeclaration, default_colo: Option<&'a str>) -> Self {
        Self {
            colos: cluster.colos(),
            master: cluster.master_colo(),
            default: default_colo,
        }
    }

    fn is_colocated(&self) -> bool {
        !self.colos.is_empty()
    }

    /// Every cluster name derived from `identity`.
    fn cluster_names(&self, identity: &str) -> Vec<String> {
        if !self.is_colocated() {
            return vec![identity.to_string()];
        }
        self.colos
            .iter()
            .copied()
            .chain(self.master)
            .chain(self.default)
            .map(|colo| add_suffix(identity, Some(colo)))
            .collect()
    }
}

/// Expand `config` into the records to publish, skipping everything
/// `validation` withholds.
pub fn expand(config: &DeclaredTopology, validation: &Validation) -> Plan {
    expand_all(config, validation).plan
}

/// The entities whose expanded records would clash with another entity's
/// (or with their own), each with the reason.
pub(crate) fn collisions(config: &DeclaredTopology, validation: &Validation) -> BTreeMap<String, String> {
    expand_all(config, validation).collisions
}

fn expand_all(config: &DeclaredTopology, validation: &Validation) -> Expansion {
    let mut expansion = Expansion::default();
    expansion.plan.errors = validation.errors().cloned().collect();
    let default_colo = config.default_colo();

    for (base, cluster) in &config.cluster_service_configurations {
        if validation.is_withheld(base) {
            continue;
        }
        let placement = Placement::new(cluster, default_colo);

        let record = cluster.cluster_record(base, &config.cluster_defaults);
        add_clusters(&mut expansion, &placement, base, &record);
        add_global_services(&mut expansion, &placement, config, base, cluster);

        for (variant, overrides) in &cluster.cluster_variants {
            if validation.is_withheld(variant) {
                continue;
            }
            let record = cluster.variant_record(variant, overrides, &config.cluster_defaults);
            add_clusters(&mut expansion, &placement, variant, &record);
        }
    }

    let names = resolve_names(config);
    for (group, declaration) in &config.service_variants {
        for identity in &declaration.cluster_list {
            if validation.is_withheld(identity) {
                continue;
            }
            let Some(base) = names.get(identity.as_str()) else {
                continue;
            };
            let Some(cluster) = config.cluster_service_configurations.get(*base) else {
                continue;
            };
            if validation.is_withheld(base) {
                continue;
            }
            let placement = Placement::new(cluster, default_colo);
            add_group_services(&mut expansion, &placement, config, group, identity, cluster);
        }
    }

    expansion
}

fn add_clusters(expansion: &mut Expansion, placement: &Placement<'_>, identity: &str, record: &ClusterRecord) {
    for name in placement.cluster_names(identity) {
        expansion.add_cluster(identity, record.renamed(name));
    }
}

fn add_global_services(
    expansion: &mut Expansion,
    placement: &Placement<'_>,
    config: &DeclaredTopology,
    base: &str,
    cluster: &ClusterDeclaration,
) {
    let defaults = &config.service_defaults;
    for service in cluster.services.names() {
        if !placement.is_colocated() {
            expansion.add_service(base, None, cluster.service_record(service, service, base, defaults));
            continue;
        }
        for colo in placement.colos.iter().copied() {
            let name = add_suffix(service, Some(colo));
            let target = add_suffix(base, Some(colo));
            expansion.add_service(base, None, cluster.service_record(service, &name, &target, defaults));
        }
        if let Some(master) = placement.master {
            let name = format!("{}{}", service, MASTER_SUFFIX);
            let target = add_suffix(base, Some(master));
            expansion.add_service(base, None, cluster.service_record(service, &name, &target, defaults));
        }
        if let Some(default) = placement.default {
            let target = add_suffix(base, Some(default));
            expansion.add_service(base, None, cluster.service_record(service, service, &target, defaults));
        }
    }
}

fn add_group_services(
    expansion: &mut Expansion,
    placement: &Placement<'_>,
    config: &DeclaredTopology,
    group: &str,
    identity: &str,
    cluster: &ClusterDeclaration,
) {
    let defaults = &config.service_defaults;
    let group = Some(group);
    for service in cluster.services.names() {
        if !placement.is_colocated() {
            expansion.add_service(identity, group, cluster.service_record(service, service, identity, defaults));
            continue;
        }
        for colo in placement.colos.iter().copied() {
            let name = add_suffix(service, Some(colo));
            let target = add_suffix(identity, Some(colo));
            expansion.add_service(identity, group, cluster.service_record(service, &name, &target, defaults));
        }
        if let Some(master) = placement.master {
            let name = format!("{}{}", service, MASTER_SUFFIX);
            let target = add_suffix(identity, Some(master));
            expansion.add_service(identity, group, cluster.service_record(service, &name, &target, defaults));
        }
        if let Some(home) = placement.master.or(placement.default) {
            let target = add_suffix(identity, Some(home));
            expansion.add_service(identity, group, cluster.service_record(service, service, &target, defaults));
        }
    }
}
