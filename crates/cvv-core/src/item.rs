//! Provenance-tagged items.

use crate::error::Result;
use crate::id::{ReplicaId, Version};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A stored value together with its provenance.
///
/// `owner` and `version` identify the write that produced `value`; the owner
/// is not necessarily the replica holding the item.
///
/// On the wire an item is the 4-element array `[key, value, owner, version]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Item<V> {
    pub key: String,
    pub value: V,
    pub owner: ReplicaId,
    pub version: Version,
}

impl<V> Item<V> {
    pub fn new(key: impl Into<String>, value: V, owner: ReplicaId, version: Version) -> Self {
        Item {
            key: key.into(),
            value,
            owner,
            version,
        }
    }

    /// Build an item from untyped provenance, validating owner and version.
    pub fn from_raw(key: impl Into<String>, value: V, owner: &str, version: f64) -> Result<Self> {
        Ok(Item {
            key: key.into(),
            value,
            owner: ReplicaId::new(owner)?,
            version: Version::new(version)?,
        })
    }

    /// The `(owner, version)` pair.
    pub fn provenance(&self) -> (&ReplicaId, Version) {
        (&self.owner, self.version)
    }

    /// True when both items were produced by the same write.
    pub fn same_write(&self, other: &Item<V>) -> bool {
        self.owner == other.owner && self.version == other.version
    }
}

impl<V: Serialize> Serialize for Item<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.key, &self.value, &self.owner, &self.version).serialize(serializer)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Item<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (key, value, owner, version) =
            <(String, V, ReplicaId, Version)>::deserialize(deserializer)?;
        Ok(Item {
            key,
            value,
            owner,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_wire_form_is_positional() {
        let item = Item::from_raw("k", json!("v1"), "id", 5.0).unwrap();
        let encoded = serde_json::to_value(&item).unwrap();
        assert_eq!(encoded, json!(["k", "v1", "id", 5.0]));
    }

    #[test]
    fn test_item_decode_rejects_bad_provenance() {
        assert!(serde_json::from_value::<Item<i32>>(json!(["k", 1, "", 5])).is_err());
        assert!(serde_json::from_value::<Item<i32>>(json!(["k", 1, "id", "5"])).is_err());
        assert!(serde_json::from_value::<Item<i32>>(json!(["k", 1, "id"])).is_err());

        let item: Item<i32> = serde_json::from_value(json!(["k", 1, "id", 5])).unwrap();
        assert_eq!(item.owner.as_str(), "id");
        assert_eq!(item.version.as_f64(), 5.0);
    }

    #[test]
    fn test_from_raw_validates() {
        assert!(Item::from_raw("k", 1, "", 1.0).is_err());
        assert!(Item::from_raw("k", 1, "id", f64::NAN).is_err());
    }
}
