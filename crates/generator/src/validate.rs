//! Declaration validation.
//!
//! Validation is exhaustive: every rule runs over the whole declaration and
//! every failure is recorded before anything is published. Each failure names
//! one entity (a base cluster or a cluster variant) that is then withheld;
//! independent, valid clusters still publish.
//!
//! # Rules
//!
//! 1. **Duplicate service**: a service name declared under several base
//!    clusters implicates each of those clusters
//! 2. **Non-unique cluster variant**: a variant name equal to any other base
//!    or variant name implicates the declaring base and all its variants
//! 3. **Heterogeneous service group**: two names in one group resolving to
//!    the same base cluster
//! 4. **Unknown cluster**: a group references an undeclared name
//! 5. **Unknown service group type**
//! 6. **Invalid partition spec**: no accessor can be built from a cluster's
//!    (or variant's) partition properties
//! 7. **Colliding identity**: after colo and variant expansion, two entities
//!    produce the same cluster name or the same service name in one
//!    namespace (e.g. colo cluster `c1-West` and a declared `c1-West`, or
//!    service `svc` in colo `West` and a declared `svc-West`). Every entity
//!    involved is implicated. Entities already withheld by rules 1-6 do not
//!    take part.
//!
//! Rules 3-5 reject the service-group section as a unit: when one fires, every
//! name referenced by any group is implicated.
//!
//! Errors are de-duplicated per `(rule, entity)`.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::DeclaredTopology;
use crate::error::{ConfigError, ConfigRule};
use crate::expand::collisions;

/// The outcome of validating a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validation {
    errors: BTreeMap<(ConfigRule, String), ConfigError>,
    withheld: BTreeSet<String>,
}

impl Validation {
    /// All errors, ordered by rule then entity.
    pub fn errors(&self) -> impl Iterator<Item = &ConfigError> {
        self.errors.values()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if the cluster or variant `name` must not be published.
    pub fn is_withheld(&self, name: &str) -> bool {
        self.withheld.contains(name)
    }

    /// Record an error implicating `entity` and withhold it.
    fn reject(&mut self, rule: ConfigRule, entity: &str, detail: String) {
        self.withheld.insert(entity.to_string());
        self.errors
            .entry((rule, entity.to_string()))
            .or_insert_with(|| ConfigError::new(rule, entity, detail));
    }

    /// Withhold `entity` without counting another error.
    fn withhold(&mut self, entity: &str) {
        self.withheld.insert(entity.to_string());
    }
}

/// Validate `config` against every rule.
pub fn validate(config: &DeclaredTopology) -> Validation {
    let mut validation = Validation::default();
    check_duplicate_services(config, &mut validation);
    check_variant_names(config, &mut validation);
    check_service_groups(config, &mut validation);
    check_partition_specs(config, &mut validation);
    withhold_variants(config, &mut validation);

    check_collisions(config, &mut validation);
    withhold_variants(config, &mut validation);
    validation
}

/// A withheld base takes its variants with it.
fn withhold_variants(config: &DeclaredTopology, validation: &mut Validation) {
    for (variant, base) in config.variants() {
        if validation.is_withheld(base) {
            validation.withhold(variant);
        }
    }
}

/// Map every declared base and variant name to its base cluster.
///
/// A name declared more than once resolves to the first declaration; rule 2
/// reports the collision.
pub fn resolve_names(config: &DeclaredTopology) -> BTreeMap<&str, &str> {
    let mut names = BTreeMap::new();
    for base in config.cluster_service_configurations.keys() {
        names.insert(base.as_str(), base.as_str());
    }
    for (variant, base) in config.variants() {
        names.entry(variant).or_insert(base);
    }
    names
}

fn check_duplicate_services(config: &DeclaredTopology, validation: &mut Validation) {
    let mut declared_by: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (base, cluster) in &config.cluster_service_configurations {
        for service in cluster.services.names() {
            declared_by.entry(service).or_default().insert(base.as_str());
        }
    }

    for (service, bases) in declared_by.iter().filter(|(_, bases)| bases.len() > 1) {
        let all: Vec<&str> = bases.iter().copied().collect();
        for base in bases {
            validation.reject(
                ConfigRule::DuplicateService,
                base,
                format!("declares service `{}`, also declared by {:?}", service, all),
            );
        }
    }
}

fn check_variant_names(config: &DeclaredTopology, validation: &mut Validation) {
    let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
    for base in config.cluster_service_configurations.keys() {
        *occurrences.entry(base.as_str()).or_default() += 1;
    }
    for (variant, _) in config.variants() {
        *occurrences.entry(variant).or_default() += 1;
    }

    for (base, cluster) in &config.cluster_service_configurations {
        let colliding: Vec<&str> = cluster
            .cluster_variants
            .keys()
            .map(String::as_str)
            .filter(|variant| occurrences.get(variant).copied().unwrap_or(0) > 1)
            .collect();
        if colliding.is_empty() {
            continue;
        }

        let detail = format!("introduces cluster variant(s) {:?} that are not unique", colliding);
        validation.reject(ConfigRule::NonUniqueClusterVariant, base, detail.clone());
        for variant in cluster.cluster_variants.keys() {
            validation.reject(ConfigRule::NonUniqueClusterVariant, variant, detail.clone());
        }
    }
}

fn check_service_groups(config: &DeclaredTopology, validation: &mut Validation) {
    let names = resolve_names(config);
    let mut fired: Vec<(ConfigRule, String)> = Vec::new();

    for (group, declaration) in &config.service_variants {
        if !declaration.is_known_type() {
            fired.push((
                ConfigRule::UnknownServiceGroupType,
                format!("service group `{}` has unknown type `{}`", group, declaration.kind),
            ));
        }

        let mut bases: BTreeMap<&str, &str> = BTreeMap::new();
        for name in &declaration.cluster_list {
            match names.get(name.as_str()) {
                None => fired.push((
                    ConfigRule::UnknownCluster,
                    format!("service group `{}` references unknown cluster `{}`", group, name),
                )),
                Some(&base) => {
                    if let Some(previous) = bases.insert(base, name.as_str()) {
                        if previous != name {
                            fired.push((
                                ConfigRule::HeterogeneousServiceGroup,
                                format!(
                                    "service group `{}` lists `{}` and `{}`, both variants of `{}`",
                                    group, previous, name, base
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    if fired.is_empty() {
        return;
    }
    let referenced: BTreeSet<&str> = config
        .service_variants
        .values()
        .flat_map(|declaration| declaration.cluster_list.iter().map(String::as_str))
        .collect();
    for (rule, detail) in fired {
        for name in &referenced {
            validation.reject(rule, name, detail.clone());
        }
    }
}

fn check_partition_specs(config: &DeclaredTopology, validation: &mut Validation) {
    for (base, cluster) in &config.cluster_service_configurations {
        if let Err(err) = cluster.partition_spec().validate() {
            validation.reject(ConfigRule::InvalidPartitionSpec, base, err.to_string());
        }
        for (variant, overrides) in &cluster.cluster_variants {
            if overrides.partition_properties.is_none() {
                continue;
            }
            if let Err(err) = cluster.variant_partition_spec(overrides).validate() {
                validation.reject(ConfigRule::InvalidPartitionSpec, variant, err.to_string());
            }
        }
    }
}

fn check_collisions(config: &DeclaredTopology, validation: &mut Validation) {
    for (entity, detail) in collisions(config, validation) {
        validation.reject(ConfigRule::CollidingIdentity, &entity, detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DeclaredTopology {
        DeclaredTopology::from_json(json).unwrap()
    }

    fn entities(validation: &Validation, rule: ConfigRule) -> Vec<String> {
        validation
            .errors()
            .filter(|err| err.rule == rule)
            .map(|err| err.entity.clone())
            .collect()
    }

    #[test]
    fn test_clean_declaration() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "cluster-1": { "services": ["service-1_1", "service-1_2"] },
                "cluster-2": { "services": ["service-2_1"] }
            } }"#,
        );
        let validation = validate(&config);
        assert!(validation.is_clean());
        assert!(!validation.is_withheld("cluster-1"));
    }

    #[test]
    fn test_duplicate_service_implicates_every_declarer() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "cluster-1": { "services": ["service-1_1"] },
                "cluster-2": { "services": ["service-2_1", "service-3_2"] },
                "cluster-3": { "services": ["service-3_1", "service-3_2"] }
            } }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert_eq!(entities(&validation, ConfigRule::DuplicateService), vec!["cluster-2", "cluster-3"]);
        assert!(validation.is_withheld("cluster-2"));
        assert!(validation.is_withheld("cluster-3"));
        assert!(!validation.is_withheld("cluster-1"));
    }

    #[test]
    fn test_same_service_twice_in_one_cluster_is_not_a_duplicate() {
        let config = parse(r#"{ "clusterServiceConfigurations": { "c": { "services": ["s", "s"] } } }"#);
        assert!(validate(&config).is_clean());
    }

    #[test]
    fn test_variant_named_like_base() {
        let config = parse(
            r#"{
                "clusterServiceConfigurations": {
                    "Cluster#1": { "services": ["service"], "clusterVariants": { "Cluster#1": {}, "Cluster#2": {} } }
                },
                "serviceVariants": {
                    "ServiceGroup1": { "type": "clusterVariantsList", "clusterList": ["Cluster#1"] },
                    "ServiceGroup2": { "type": "clusterVariantsList", "clusterList": ["Cluster#2"] }
                }
            }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert!(validation.is_withheld("Cluster#1"));
        assert!(validation.is_withheld("Cluster#2"));
    }

    #[test]
    fn test_variant_shared_between_bases() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "a": { "services": ["sa"], "clusterVariants": { "alias": {} } },
                "b": { "services": ["sb"], "clusterVariants": { "alias": {}, "bOnly": {} } },
                "c": { "services": ["sc"] }
            } }"#,
        );
        let validation = validate(&config);
        assert_eq!(
            entities(&validation, ConfigRule::NonUniqueClusterVariant),
            vec!["a", "alias", "b", "bOnly"]
        );
        assert!(!validation.is_withheld("c"));
    }

    #[test]
    fn test_group_with_two_variants_of_one_base() {
        let config = parse(
            r#"{
                "clusterServiceConfigurations": {
                    "zServices": { "services": ["service1", "service2"], "clusterVariants": { "zCluster1": {}, "zCluster2": {} } }
                },
                "serviceVariants": {
                    "ServiceGroup1": { "type": "clusterVariantsList", "clusterList": ["zCluster1"] },
                    "ServiceGroup2": { "type": "clusterVariantsList", "clusterList": ["zCluster2", "zCluster1"] }
                }
            }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert_eq!(
            entities(&validation, ConfigRule::HeterogeneousServiceGroup),
            vec!["zCluster1", "zCluster2"]
        );
        assert!(!validation.is_withheld("zServices"));
    }

    #[test]
    fn test_unknown_cluster_reference() {
        let config = parse(
            r#"{
                "clusterServiceConfigurations": {
                    "zServices": { "services": ["service1"], "clusterVariants": { "cluster1": {} } }
                },
                "serviceVariants": {
                    "ServiceGroup1": { "type": "clusterVariantsList", "clusterList": ["cluster1"] },
                    "ServiceGroup2": { "type": "clusterVariantsList", "clusterList": ["zCluster2"] }
                }
            }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert_eq!(entities(&validation, ConfigRule::UnknownCluster), vec!["cluster1", "zCluster2"]);
    }

    #[test]
    fn test_unknown_group_type() {
        let config = parse(
            r#"{
                "clusterServiceConfigurations": {
                    "zServices": { "services": ["service1"], "clusterVariants": { "cluster1": {}, "cluster2": {} } }
                },
                "serviceVariants": {
                    "ServiceGroup1": { "type": "clusterVariantsList", "clusterList": ["cluster1"] },
                    "ServiceGroup2": { "type": "someVariantsList", "clusterList": ["cluster2"] }
                }
            }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert_eq!(
            entities(&validation, ConfigRule::UnknownServiceGroupType),
            vec!["cluster1", "cluster2"]
        );
    }

    #[test]
    fn test_all_rules_are_evaluated() {
        let config = parse(
            r#"{
                "clusterServiceConfigurations": {
                    "a": { "services": ["shared"] },
                    "b": { "services": ["shared"], "clusterVariants": { "bAlias": {} } }
                },
                "serviceVariants": {
                    "G": { "type": "bogus", "clusterList": ["bAlias"] }
                }
            }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 3);
        assert_eq!(entities(&validation, ConfigRule::DuplicateService), vec!["a", "b"]);
        assert_eq!(entities(&validation, ConfigRule::UnknownServiceGroupType), vec!["bAlias"]);
    }

    #[test]
    fn test_invalid_partition_spec_withholds_cluster_and_variants() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "p": {
                    "services": ["ps"],
                    "partitionProperties": { "partitionType": "HASH", "partitionCount": 0, "hashAlgorithm": "modulo", "partitionKeyRegex": "id=(\\d+)" },
                    "clusterVariants": { "pAlias": {} }
                },
                "q": {
                    "services": ["qs"],
                    "clusterVariants": {
                        "qAlias": { "partitionProperties": { "partitionType": "HASH", "partitionCount": 4, "hashAlgorithm": "md5", "partitionKeyRegex": "id=(\\d+)" } }
                    }
                }
            } }"#,
        );
        let validation = validate(&config);
        assert_eq!(entities(&validation, ConfigRule::InvalidPartitionSpec), vec!["p", "qAlias"]);
        assert!(validation.is_withheld("pAlias"));
        assert!(!validation.is_withheld("q"));
    }

    #[test]
    fn test_expanded_names_must_be_unique() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "c1": { "services": ["s1"], "coloVariants": ["West"], "masterColo": "West",
                        "clusterVariants": { "c1Alias": {} } },
                "c1-West": { "services": ["s2"] },
                "c2": { "services": ["s3"] }
            } }"#,
        );
        let validation = validate(&config);
        assert_eq!(entities(&validation, ConfigRule::CollidingIdentity), vec!["c1", "c1-West"]);
        assert!(validation.is_withheld("c1Alias"));
        assert!(!validation.is_withheld("c2"));
    }

    #[test]
    fn test_rule_violations_do_not_count_as_collisions() {
        // Rule 1 already withholds both declarers of `dup`.
        let config = parse(
            r#"{ "clusterServiceConfigurations": {
                "a": { "services": ["dup"] },
                "b": { "services": ["dup"] }
            } }"#,
        );
        let validation = validate(&config);
        assert_eq!(validation.error_count(), 2);
        assert!(entities(&validation, ConfigRule::CollidingIdentity).is_empty());
    }

    #[test]
    fn test_resolve_names() {
        let config = parse(
            r#"{ "clusterServiceConfigurations": { "base": { "clusterVariants": { "v1": {}, "v2": {} } } } }"#,
        );
        let names = resolve_names(&config);
        assert_eq!(names.get("base"), Some(&"base"));
        assert_eq!(names.get("v2"), Some(&"base"));
        assert_eq!(names.get("missing"), None);
    }
}
