//! End-to-end marshaling of catalog schemas: raw JSON in, typed objects,
//! filtered JSON out.

use proptest::prelude::*;
use serde_json::{json, Value};

use tradelink_catalog::{batch_payload, LotMetaData, LotMetaDataList, Product, ProductList, VehicleList};
use tradelink_core::{entity, Collection, Date, Entity, MarshalError, MetadataRegistry};

entity! {
    struct Identified {
        id: Option<i64>,
    }
}

fn init_logging() {
    tradelink_observability::init();
}

#[test]
fn identified_collection_round_trips() {
    init_logging();
    let raw = json!([{"id": 1}, {"id": 2}]);

    let items = Collection::<Identified>::from_raw(&raw).unwrap();

    assert_eq!(items.count(), 2);
    assert_eq!(items.get(0).unwrap().id, Some(1));
    assert_eq!(items.get(1).unwrap().id, Some(2));
    assert_eq!(items.encode(true).unwrap(), r#"[{"id":1},{"id":2}]"#);
}

#[test]
fn lot_metadata_list_from_api_response() {
    init_logging();
    let response = json!([
        {"id": 1, "metadata": [{"key": "artist", "value": "Mondriaan"}]},
        {"id": 2, "metadata": []},
        {"id": 3, "metadata": [{"key": "year", "value": 1921}], "etag": "ignored"}
    ]);

    let lots = LotMetaDataList::from_raw(&response).unwrap();

    assert_eq!(lots.count(), 3);
    assert_eq!(lots[0].value_of("artist"), Some(&json!("Mondriaan")));
    assert_eq!(lots[2].value_of("year"), Some(&json!(1921)));

    let with_metadata = lots.filter(|lot| !lot.metadata.is_empty());
    assert_eq!(with_metadata.len(), 2);

    let encoded: Value = serde_json::from_str(&lots.encode(false).unwrap()).unwrap();
    assert_eq!(
        encoded,
        json!([
            {"id": 1, "metadata": [{"key": "artist", "value": "Mondriaan"}]},
            {"id": 2, "metadata": []},
            {"id": 3, "metadata": [{"key": "year", "value": 1921}]}
        ])
    );
}

#[test]
fn set_and_unset_on_product_list() {
    let mut products = ProductList::new();
    products.populate(&json!([{"variantId": "A"}, {"variantId": "B"}])).unwrap();

    let before = products.count();
    products.set(None, &json!({"variantId": "C", "price": 5.5})).unwrap();
    assert_eq!(products.count(), before + 1);
    assert_eq!(products.get(products.count() - 1).unwrap().variant_id.as_deref(), Some("C"));

    products.unset(1);
    assert!(!products.exists(1));
    assert_eq!(products.count(), before);
    assert_eq!(products.get(0).unwrap().variant_id.as_deref(), Some("A"));
    assert_eq!(products.get(2).unwrap().variant_id.as_deref(), Some("C"));
    assert!(matches!(products.get(1), Err(MarshalError::OutOfRange(1))));
}

#[test]
fn product_batch_from_typed_list() {
    let products = ProductList::from_raw(&json!([
        {"id": 1, "variantId": "A", "updatedAt": "2024-01-01T00:00:00Z"},
        {"id": 2, "variantId": "B", "availableFrom": "2024-02-01"}
    ]))
    .unwrap();

    let batch: Vec<Product> = products.iter().cloned().collect();
    let payload = batch_payload(&batch).unwrap();
    assert_eq!(
        payload,
        r#"[{"variantId":"A"},{"variantId":"B","availableFrom":"2024-02-01"}]"#
    );
}

#[test]
fn vehicles_reject_malformed_feeds() {
    let err = VehicleList::from_raw(&json!({"stocknumber": "H-1"})).unwrap_err();
    assert!(matches!(err, MarshalError::Validation(_)));

    let err = VehicleList::from_raw(&json!([{"buildDate": "yesterday-ish"}])).unwrap_err();
    match err {
        MarshalError::Validation(msg) => {
            assert!(msg.contains("field '0'"));
            assert!(msg.contains("field 'buildDate'"));
        }
        other => panic!("Expected Validation error, got {other:?}"),
    }
}

#[test]
fn catalog_field_tables_are_well_formed() {
    let registry = MetadataRegistry::new();
    registry.check::<LotMetaData>().unwrap();
    registry.check::<Product>().unwrap();
    registry.check::<tradelink_catalog::Vehicle>().unwrap();
    registry.check::<tradelink_catalog::MetaData>().unwrap();

    assert_eq!(
        &*registry.exportable_fields::<Product>(),
        &["variantId", "externalId", "name", "price", "inStock", "availableFrom"]
    );
}

#[test]
fn empty_date_field_is_null_in_getters() {
    let product = Product::from_raw(&json!({"name": "Lamp"})).unwrap();
    assert_eq!(product.available_from, Date::new());
    assert_eq!(product.call_getter("getAvailableFrom").unwrap(), Value::Null);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Property: read-only fields never reach the encoded output.
    #[test]
    fn read_only_fields_never_encoded(
        id in any::<i64>(),
        name in proptest::option::of("[a-z]{1,10}"),
        allow_null in any::<bool>(),
    ) {
        let product = Product::from_raw(&json!({
            "id": id,
            "name": name,
            "updatedAt": "2024-05-05T05:05:05Z"
        })).unwrap();

        let encoded = product.encode_value(allow_null).unwrap();
        let object = encoded.as_object().unwrap();
        prop_assert!(!object.contains_key("id"));
        prop_assert!(!object.contains_key("updatedAt"));
    }

    /// Property: appending grows the list by one and the new element is last.
    #[test]
    fn append_grows_by_one(names in proptest::collection::vec("[a-z]{1,8}", 0..12)) {
        let mut products = ProductList::new();
        for name in &names {
            let before = products.count();
            products.set(None, &json!({"name": name})).unwrap();
            prop_assert_eq!(products.count(), before + 1);
            let last = products.get(products.count() - 1).unwrap();
            prop_assert_eq!(last.name.as_deref(), Some(name.as_str()));
        }
        prop_assert_eq!(products.iter().count(), names.len());
    }
}
