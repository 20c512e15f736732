//! Domain types for ERP order records.
//!
//! Every descriptive field is an opaque scalar: the engine compares them, it
//! never interprets them. Dates (`tarih`, `sevktar`) stay in the source
//! string format verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Natural key
// ---------------------------------------------------------------------------

/// Composite natural key for an order line: `(sipno, sipsr)` — order number
/// plus sub-order number. Exactly one persisted order may exist per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub sipno: i64,
    pub sipsr: i64,
}

impl OrderKey {
    pub fn new(sipno: i64, sipsr: i64) -> Self {
        Self { sipno, sipsr }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sipno, self.sipsr)
    }
}

// ---------------------------------------------------------------------------
// Descriptive attributes
// ---------------------------------------------------------------------------

/// The fixed descriptive attribute set of an order line.
///
/// `stkno` is normalized to its string representation while decoding, so a
/// numeric `0` in the export becomes `Some("0")` and an absent stock number
/// stays `None` — the two are distinct values and must never be conflated.
/// With that single rule applied up front, equality between an incoming
/// record and a persisted row is derived structural equality.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderAttributes {
    /// Company name.
    #[serde(default)]
    pub firma: Option<String>,
    /// Customer name.
    #[serde(default)]
    pub musadi: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub mail: Option<String>,
    /// Order date, source format preserved verbatim.
    #[serde(default)]
    pub tarih: Option<String>,
    /// Product name.
    #[serde(default)]
    pub urunadi: Option<String>,
    /// Output flag.
    #[serde(default)]
    pub out: Option<String>,
    /// Stock number, normalized to its string form when present.
    #[serde(default, deserialize_with = "stkno_as_string")]
    pub stkno: Option<String>,
    /// Planned shipment date, source format preserved verbatim.
    #[serde(default)]
    pub sevktar: Option<String>,
    /// Quantity.
    #[serde(default)]
    pub mik: Option<f64>,
    /// Module code.
    #[serde(default)]
    pub modul: Option<String>,
    /// Fabric code.
    #[serde(default)]
    pub kumas: Option<String>,
    /// Free-form note text.
    #[serde(default)]
    pub acik: Option<String>,
    /// Leg/foot code.
    #[serde(default)]
    pub ayak: Option<String>,
    /// Cushion code.
    #[serde(default)]
    pub kirlent: Option<String>,
    /// Type code.
    #[serde(default)]
    pub tip: Option<String>,
}

/// Accept the stock number as a JSON string or number; store the string form.
fn stkno_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "stkno must be a string or number, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Incoming + persisted orders
// ---------------------------------------------------------------------------

/// One order line decoded from the ERP export's `wtemp` array.
///
/// The key fields are required and must be numeric; every descriptive field
/// is individually optional so a sparse export row still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingOrder {
    pub sipno: i64,
    pub sipsr: i64,
    #[serde(flatten)]
    pub attributes: OrderAttributes,
}

impl IncomingOrder {
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.sipno, self.sipsr)
    }
}

/// The stored counterpart of an [`IncomingOrder`].
///
/// `mail_sent` / `mail_sent_at` belong to the reporting workflow; the
/// reconciliation engine never writes them. `updated_at` is the modification
/// marker downstream consumers use to detect real changes, which is why an
/// unchanged record must skip the write entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedOrder {
    /// Surrogate identity assigned by the store.
    pub id: i64,
    pub sipno: i64,
    pub sipsr: i64,
    #[serde(flatten)]
    pub attributes: OrderAttributes,
    pub mail_sent: bool,
    pub mail_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedOrder {
    pub fn key(&self) -> OrderKey {
        OrderKey::new(self.sipno, self.sipsr)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn key_display() {
        assert_eq!(OrderKey::new(100, 1).to_string(), "100-1");
    }

    #[test]
    fn incoming_order_decodes_full_record() {
        let order: IncomingOrder = serde_json::from_value(json!({
            "sipno": 100,
            "sipsr": 1,
            "firma": "A",
            "musadi": "Customer",
            "mail": "qc@example.com",
            "tarih": "01.08.2026",
            "urunadi": "Sofa",
            "out": "E",
            "stkno": "STK-9",
            "sevktar": "15.08.2026",
            "mik": 5,
            "modul": "M1",
            "kumas": "K2",
            "acik": "note",
            "ayak": "A3",
            "kirlent": "KR1",
            "tip": "T"
        }))
        .expect("decode");

        assert_eq!(order.key(), OrderKey::new(100, 1));
        assert_eq!(order.attributes.firma.as_deref(), Some("A"));
        assert_eq!(order.attributes.mik, Some(5.0));
    }

    #[test]
    fn sparse_record_decodes_with_defaults() {
        let order: IncomingOrder =
            serde_json::from_value(json!({"sipno": 7, "sipsr": 2})).expect("decode");
        assert_eq!(order.attributes, OrderAttributes::default());
    }

    #[test]
    fn missing_key_field_is_a_decode_error() {
        let result = serde_json::from_value::<IncomingOrder>(json!({"sipno": 7, "firma": "A"}));
        assert!(result.is_err(), "sipsr is required");
    }

    #[rstest]
    #[case(json!(0), Some("0"))]
    #[case(json!(1234), Some("1234"))]
    #[case(json!("STK-1"), Some("STK-1"))]
    #[case(json!(null), None)]
    fn stkno_normalizes_to_string(#[case] raw: serde_json::Value, #[case] expected: Option<&str>) {
        let order: IncomingOrder =
            serde_json::from_value(json!({"sipno": 1, "sipsr": 1, "stkno": raw})).expect("decode");
        assert_eq!(order.attributes.stkno.as_deref(), expected);
    }

    #[test]
    fn zero_stkno_differs_from_absent_stkno() {
        let zero: IncomingOrder =
            serde_json::from_value(json!({"sipno": 1, "sipsr": 1, "stkno": 0})).expect("decode");
        let absent: IncomingOrder =
            serde_json::from_value(json!({"sipno": 1, "sipsr": 1})).expect("decode");
        assert_ne!(zero.attributes, absent.attributes);
    }

    #[test]
    fn attribute_equality_detects_single_field_change() {
        let base: IncomingOrder =
            serde_json::from_value(json!({"sipno": 1, "sipsr": 1, "firma": "A", "mik": 5}))
                .expect("decode");
        let changed: IncomingOrder =
            serde_json::from_value(json!({"sipno": 1, "sipsr": 1, "firma": "A", "mik": 7}))
                .expect("decode");
        assert_ne!(base.attributes, changed.attributes);
        assert_eq!(base.attributes, base.clone().attributes);
    }

    #[test]
    fn persisted_order_serializes_flat() {
        let order = PersistedOrder {
            id: 1,
            sipno: 100,
            sipsr: 1,
            attributes: OrderAttributes {
                firma: Some("A".into()),
                ..OrderAttributes::default()
            },
            mail_sent: false,
            mail_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&order).expect("serialize");
        // Attributes flatten into the top-level object, like the export rows.
        assert_eq!(value["firma"], json!("A"));
        assert_eq!(value["sipno"], json!(100));
        assert_eq!(value["mail_sent"], json!(false));
    }
}
