//! Topology generation.
//!
//! This crate turns an operator's topology declaration into registry records:
//! - The declaration model and its JSON form
//! - Validation of global naming invariants
//! - Pure datacenter and cluster-variant expansion
//! - Publishing the result through a [`registry::PropertyRegistry`]

pub mod config;
pub mod error;
pub mod expand;
pub mod generator;
pub mod validate;

pub use config::{ClusterDeclaration, DeclaredTopology, ServiceGroupDeclaration};
pub use error::{ConfigError, ConfigRule, GeneratorError, Result};
pub use expand::{expand, Plan};
pub use generator::{GenerationReport, TopologyGenerator};
pub use validate::{validate, Validation};
