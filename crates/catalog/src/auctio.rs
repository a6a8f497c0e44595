//! Auctio lot metadata.

use tradelink_core::{entity, Collection, Value};

entity! {
    /// One key/value pair attached to a lot.
    pub struct MetaData {
        pub key: Option<String>,
        pub value: Option<Value>,
    }
}

entity! {
    /// Metadata set of a single lot.
    pub struct LotMetaData {
        pub id: Option<i64>,
        pub metadata: Collection<MetaData>,
    }
}

pub type LotMetaDataList = Collection<LotMetaData>;

impl LotMetaData {
    /// Value stored under `key`, if any.
    pub fn value_of(&self, key: &str) -> Option<&Value> {
        self.metadata
            .entries()
            .map(|(_, entry)| entry)
            .find(|entry| entry.key.as_deref() == Some(key))
            .and_then(|entry| entry.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tradelink_core::Entity;

    #[test]
    fn populates_nested_metadata_collection() {
        let lot = LotMetaData::from_raw(&json!({
            "id": 12,
            "metadata": [
                {"key": "condition", "value": "mint"},
                {"key": "weight", "value": 1.5}
            ]
        }))
        .unwrap();

        assert_eq!(lot.id, Some(12));
        assert_eq!(lot.metadata.count(), 2);
        assert_eq!(lot.value_of("weight"), Some(&json!(1.5)));
        assert_eq!(lot.value_of("colour"), None);
    }

    #[test]
    fn encodes_back_to_the_wire_shape() {
        let raw = json!({
            "id": 12,
            "metadata": [{"key": "condition", "value": "mint"}]
        });
        let lot = LotMetaData::from_raw(&raw).unwrap();
        assert_eq!(lot.encode_value(false).unwrap(), raw);
    }
}
