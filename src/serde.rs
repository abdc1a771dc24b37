//! # Serde module for Sketch
//!
//! `Sketch` is serialized as a tuple of its two logical parts, exactly one of which is
//! present for a non-empty sketch: `(Option<Vec<u64>>, Option<Vec<u8>>)`.
//!
//! - the first element holds the exact tier hashes in ascending order
//! - the second element holds the dense tier registers packed 6 bits each
//!
//! Deserialization rejects input carrying both parts or a packed buffer of the wrong
//! length instead of repairing it.
//!
//! Refer to the serde documentation for more details on custom serialization and deserialization:
//! - [Serialization](https://serde.rs/impl-serialize.html)
//! - [Deserialization](https://serde.rs/impl-deserialize.html)
use std::hash::Hasher;

use log::warn;
use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::sketch::Sketch;

impl<H: Hasher + Default> Serialize for Sketch<H> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (exact, dense) = self.to_parts();

        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&exact)?;
        tup.serialize_element(&dense)?;
        tup.end()
    }
}

impl<'de, H: Hasher + Default> Deserialize<'de> for Sketch<H> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (exact, dense): (Option<Vec<u64>>, Option<Vec<u8>>) =
            Deserialize::deserialize(deserializer)?;
        Sketch::from_parts(exact, dense).map_err(|e| {
            warn!("rejecting corrupted sketch: {}", e);
            Error::custom(e)
        })
    }
}
