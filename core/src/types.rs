//! Domain DTOs for the courier backend.
//!
//! # Design
//! These types mirror the backend's wire schema but are defined independently
//! from the mock-server crate. Integration tests catch any schema drift.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A courier location as listed by the branch directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Parcel size categories offered by the lodging form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemSize {
    Small,
    Medium,
    Large,
}

impl ItemSize {
    pub const ALL: [ItemSize; 3] = [ItemSize::Small, ItemSize::Medium, ItemSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemSize::Small => "small",
            ItemSize::Medium => "medium",
            ItemSize::Large => "large",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for ItemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping methods offered by the lodging form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 2] = [ShippingMethod::Standard, ShippingMethod::Express];

    pub fn as_str(self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::Express => "express",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs the pricing service needs. Branch ids stay optional so an
/// incomplete selection can still be described (and refused).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteRequest {
    pub item_size: ItemSize,
    pub origin_branch_id: Option<String>,
    pub destination_branch_id: Option<String>,
    pub shipping_method: ShippingMethod,
}

impl QuoteRequest {
    /// Both branch ids are present and non-empty.
    pub fn is_routable(&self) -> bool {
        let present = |id: &Option<String>| id.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.origin_branch_id) && present(&self.destination_branch_id)
    }
}

/// A price returned for exactly the `basis` request.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub amount: f64,
    pub currency: String,
    pub basis: QuoteRequest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub contact: String,
}

/// The payload lodged with the parcel service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParcelRecord {
    pub sender_info: ContactInfo,
    pub receiver_info: ContactInfo,
    pub item_size: ItemSize,
    pub origin_branch_id: String,
    pub destination_branch_id: String,
    pub shipping_method: ShippingMethod,
    pub quoted_amount: f64,
}

/// Acknowledgement of a lodged parcel. `data` is whatever the service
/// returned alongside its message.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl SubmissionReceipt {
    pub fn tracking_number(&self) -> Option<&str> {
        self.data
            .pointer("/parcel/trackingNo")
            .or_else(|| self.data.get("trackingNo"))
            .and_then(Value::as_str)
    }
}

/// A parcel row from the lodging table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LodgedParcel {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub tracking_no: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub record: ParcelRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_accepts_either_id_key() {
        let a: Branch = serde_json::from_str(r#"{"_id":"B1","location":"Kandy"}"#).unwrap();
        let b: Branch = serde_json::from_str(r#"{"id":"B1","location":"Kandy"}"#).unwrap();
        assert_eq!(a, b);
        assert!(a.contact.is_none());
    }

    #[test]
    fn parcel_record_uses_camel_case_fields() {
        let record = ParcelRecord {
            sender_info: ContactInfo {
                name: "Amal".to_string(),
                contact: "0771234567".to_string(),
            },
            receiver_info: ContactInfo {
                name: "Nimal".to_string(),
                contact: "+94712345678".to_string(),
            },
            item_size: ItemSize::Small,
            origin_branch_id: "B1".to_string(),
            destination_branch_id: "B2".to_string(),
            shipping_method: ShippingMethod::Standard,
            quoted_amount: 450.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["senderInfo"]["name"], "Amal");
        assert_eq!(json["itemSize"], "small");
        assert_eq!(json["shippingMethod"], "standard");
        assert_eq!(json["originBranchId"], "B1");
        assert_eq!(json["quotedAmount"], 450.0);
    }

    #[test]
    fn enum_parse_matches_wire_names() {
        assert_eq!(ItemSize::parse("medium"), Some(ItemSize::Medium));
        assert_eq!(ItemSize::parse("huge"), None);
        assert_eq!(ShippingMethod::parse("express"), Some(ShippingMethod::Express));
    }

    #[test]
    fn routable_needs_both_non_empty_ids() {
        let mut req = QuoteRequest {
            item_size: ItemSize::Small,
            origin_branch_id: Some("B1".to_string()),
            destination_branch_id: Some(" ".to_string()),
            shipping_method: ShippingMethod::Standard,
        };
        assert!(!req.is_routable());
        req.destination_branch_id = Some("B2".to_string());
        assert!(req.is_routable());
    }

    #[test]
    fn receipt_exposes_tracking_number() {
        let receipt: SubmissionReceipt = serde_json::from_str(
            r#"{"message":"Parcel added","data":{"parcel":{"trackingNo":"CX-1"}}}"#,
        )
        .unwrap();
        assert_eq!(receipt.tracking_number(), Some("CX-1"));
    }
}
