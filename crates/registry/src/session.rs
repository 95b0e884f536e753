//! Announcer sessions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a coordination-service session.
///
/// Every endpoint announcement is owned by exactly one session; when the
/// session ends, its announcements disappear with it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
