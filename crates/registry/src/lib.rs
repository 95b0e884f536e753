//! Property registry for service topology records.
//!
//! This crate is the boundary to the coordination service:
//! - The [`PropertyRegistry`] trait every component is handed
//! - Session-scoped endpoint announcements and their pure merge
//! - The record codec shared by all stored records
//! - An in-memory registry with file snapshots

pub mod codec;
pub mod error;
pub mod memory;
pub mod merge;
pub mod session;
pub mod snapshot;
pub mod store;

pub use error::{RegistryError, Result};
pub use memory::MemoryRegistry;
pub use merge::{merge_contributions, Announcement, Contribution, MergeOutcome};
pub use session::SessionId;
pub use snapshot::RegistrySnapshot;
pub use store::PropertyRegistry;
