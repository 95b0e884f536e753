//! Record encoding used between the registry and its backing store.
//!
//! Records are JSON. Ordered lists stay ordered, integer partition ids stay
//! integers and reals round-trip exactly (`float_roundtrip`).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encode a record for storage.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Decode a stored record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}
