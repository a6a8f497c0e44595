//! AdCurve shop products and the outbound batch payload.

use tradelink_core::{entity, AsText, Collection, Date, DateTime, Entity, MarshalError, MarshalResult, Value};
use uuid::Uuid;

entity! {
    /// A shop product variant.
    ///
    /// `id` and `updatedAt` are assigned by AdCurve and never sent back.
    pub struct Product {
        pub id: Option<i64> [read_only],
        pub variant_id: Option<String> as "variantId",
        pub external_id: AsText<Uuid> as "externalId",
        pub name: Option<String>,
        pub price: Option<f64>,
        pub in_stock: Option<bool> as "inStock",
        pub available_from: Date as "availableFrom",
        pub updated_at: DateTime as "updatedAt" [read_only],
    }
}

pub type ProductList = Collection<Product>;

/// JSON body of a product batch upload.
///
/// Every product is encoded without null fields. An empty batch or an empty
/// product is rejected before anything is serialized.
pub fn batch_payload(products: &[Product]) -> MarshalResult<String> {
    if products.is_empty() {
        return Err(MarshalError::validation("no valid input"));
    }

    let mut encoded = Vec::with_capacity(products.len());
    for (index, product) in products.iter().enumerate() {
        match product.encode_value(false)? {
            Value::Null => {
                tracing::warn!(index, "refusing empty product in batch");
                return Err(MarshalError::validation("no valid input").in_field(&index.to_string()));
            }
            value => encoded.push(value),
        }
    }

    tracing::debug!(products = encoded.len(), "prepared product batch");
    Ok(serde_json::to_string(&Value::Array(encoded))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> Value {
        json!({
            "id": 501,
            "variantId": "SKU-001-RED",
            "externalId": "0190a3e2-7c1a-7cc0-8c1e-4b0a6a3f1d2e",
            "name": "Desk lamp",
            "price": 49.95,
            "inStock": true,
            "availableFrom": "2024-03-15T10:00:00+02:00",
            "updatedAt": "2024-03-20T08:15:00Z"
        })
    }

    #[test]
    fn read_only_fields_are_populated_but_not_encoded() {
        let product = Product::from_raw(&product_json()).unwrap();
        assert_eq!(product.id, Some(501));
        assert_eq!(product.updated_at.encode().as_deref(), Some("2024-03-20T09:15:00+01:00"));

        let encoded = product.encode_value(true).unwrap();
        assert_eq!(
            encoded,
            json!({
                "variantId": "SKU-001-RED",
                "externalId": "0190a3e2-7c1a-7cc0-8c1e-4b0a6a3f1d2e",
                "name": "Desk lamp",
                "price": 49.95,
                "inStock": true,
                "availableFrom": "2024-03-15"
            })
        );
    }

    #[test]
    fn getters_read_current_values() {
        let product = Product::from_raw(&product_json()).unwrap();
        assert_eq!(product.call_getter("getVariantId").unwrap(), json!("SKU-001-RED"));
        assert_eq!(product.call_getter("getUpdatedAt").unwrap(), json!("2024-03-20T09:15:00+01:00"));
        assert!(product.call_getter("getColour").is_err());
    }

    #[test]
    fn batch_payload_omits_nulls() {
        let product = Product::from_raw(&json!({"variantId": "A", "price": 10.0})).unwrap();
        let payload = batch_payload(&[product]).unwrap();
        assert_eq!(payload, r#"[{"variantId":"A","price":10.0}]"#);
    }

    #[test]
    fn batch_payload_rejects_empty_input() {
        let err = batch_payload(&[]).unwrap_err();
        assert!(matches!(err, MarshalError::Validation(msg) if msg == "no valid input"));

        let err = batch_payload(&[Product::default()]).unwrap_err();
        assert!(matches!(err, MarshalError::Validation(msg) if msg.contains("no valid input")));
    }

    #[test]
    fn invalid_dates_are_validation_errors() {
        let err = Product::from_raw(&json!({"availableFrom": "soon"})).unwrap_err();
        match err {
            MarshalError::Validation(msg) => assert!(msg.contains("field 'availableFrom'")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
