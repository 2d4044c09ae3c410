//! Delivery models.

use chrono::{DateTime, NaiveDate, Utc};
use perim_core::{AddressId, CustomerId, DelivererId, DeliveryId, DeliveryStatus, ExtraVolumes};
use serde::{Deserialize, Serialize};

use super::{Address, Deliverer};
use crate::validation::{FieldErrors, required_text};

/// A delivery as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Delivery {
    pub id: DeliveryId,
    pub customer_id: CustomerId,
    pub address_id: AddressId,
    pub deliverer_id: Option<DelivererId>,
    pub status: DeliveryStatus,
    pub box_count: i32,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub volumes: ExtraVolumes,
    pub packer_name: String,
    pub invoice_number: String,
    pub invoice_series: String,
    pub purchase_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A delivery with its related records resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub customer_name: String,
    pub address_details: Address,
    pub deliverer: Option<Deliverer>,
    /// Labels of the extra-volume flags that are set.
    pub extra_volumes: Vec<&'static str>,
    pub status_display: &'static str,
}

impl DeliveryView {
    #[must_use]
    pub fn new(
        delivery: Delivery,
        customer_name: String,
        address_details: Address,
        deliverer: Option<Deliverer>,
    ) -> Self {
        Self {
            extra_volumes: delivery.volumes.labels(),
            status_display: delivery.status.label(),
            delivery,
            customer_name,
            address_details,
            deliverer,
        }
    }
}

/// Query parameters for `GET /api/deliveries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryFilter {
    pub customer: Option<CustomerId>,
    pub deliverer: Option<DelivererId>,
    /// Inclusive lower bound on the scheduled date (`YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Inclusive upper bound on the scheduled date (`YYYY-MM-DD`).
    pub end_date: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub search: Option<String>,
}

impl DeliveryFilter {
    /// Parsed `start_date`; unparseable input is ignored.
    #[must_use]
    pub fn start(&self) -> Option<NaiveDate> {
        parse_date(self.start_date.as_deref())
    }

    /// Parsed `end_date`; unparseable input is ignored.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        parse_date(self.end_date.as_deref())
    }

    /// Trimmed, non-empty search term.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// Validated delivery fields, ready for the reference checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDraft {
    pub customer_id: CustomerId,
    pub address_id: AddressId,
    pub deliverer_id: Option<DelivererId>,
    pub status: DeliveryStatus,
    pub box_count: i32,
    pub volumes: ExtraVolumes,
    pub packer_name: String,
    pub invoice_number: String,
    pub invoice_series: String,
    pub purchase_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
}

/// Body for `POST /api/deliveries` and `PUT /api/deliveries/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeliveryRequest {
    pub customer: CustomerId,
    pub address: AddressId,
    #[serde(default)]
    pub deliverer: Option<DelivererId>,
    #[serde(default)]
    pub status: DeliveryStatus,
    pub box_count: i32,
    #[serde(flatten)]
    pub volumes: ExtraVolumes,
    pub packer_name: String,
    pub invoice_number: String,
    pub invoice_series: String,
    pub purchase_date: NaiveDate,
    pub scheduled_at: DateTime<Utc>,
}

impl CreateDeliveryRequest {
    /// Validate the scalar fields. References are checked separately.
    ///
    /// # Errors
    ///
    /// Returns all field errors found.
    pub fn validate(&self) -> Result<DeliveryDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.box_count < 0 {
            errors.add(
                "box_count",
                "ensure this value is greater than or equal to 0",
            );
        }
        let packer_name = required_text(&mut errors, "packer_name", &self.packer_name, 100);
        let invoice_number = required_text(&mut errors, "invoice_number", &self.invoice_number, 20);
        let invoice_series = required_text(&mut errors, "invoice_series", &self.invoice_series, 10);

        errors.into_result(DeliveryDraft {
            customer_id: self.customer,
            address_id: self.address,
            deliverer_id: self.deliverer,
            status: self.status,
            box_count: self.box_count,
            volumes: self.volumes,
            packer_name,
            invoice_number,
            invoice_series,
            purchase_date: self.purchase_date,
            scheduled_at: self.scheduled_at,
        })
    }
}

/// Body for `PATCH /api/deliveries/{id}`.
///
/// Absent fields keep their value; `"deliverer": null` unassigns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeliveryRequest {
    pub customer: Option<CustomerId>,
    pub address: Option<AddressId>,
    #[serde(default, deserialize_with = "super::present")]
    pub deliverer: Option<Option<DelivererId>>,
    pub status: Option<DeliveryStatus>,
    pub box_count: Option<i32>,
    pub beverages: Option<bool>,
    pub frozen: Option<bool>,
    pub cleaning_tools: Option<bool>,
    pub other: Option<bool>,
    pub packer_name: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_series: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl UpdateDeliveryRequest {
    /// Merge onto `existing` and validate the result.
    ///
    /// The returned draft carries the effective customer/address pair.
    ///
    /// # Errors
    ///
    /// Returns all field errors found.
    pub fn apply(self, existing: &Delivery) -> Result<DeliveryDraft, FieldErrors> {
        let current = existing.volumes;
        CreateDeliveryRequest {
            customer: self.customer.unwrap_or(existing.customer_id),
            address: self.address.unwrap_or(existing.address_id),
            deliverer: self.deliverer.unwrap_or(existing.deliverer_id),
            status: self.status.unwrap_or(existing.status),
            box_count: self.box_count.unwrap_or(existing.box_count),
            volumes: ExtraVolumes {
                beverages: self.beverages.unwrap_or(current.beverages),
                frozen: self.frozen.unwrap_or(current.frozen),
                cleaning_tools: self.cleaning_tools.unwrap_or(current.cleaning_tools),
                other: self.other.unwrap_or(current.other),
            },
            packer_name: self
                .packer_name
                .unwrap_or_else(|| existing.packer_name.clone()),
            invoice_number: self
                .invoice_number
                .unwrap_or_else(|| existing.invoice_number.clone()),
            invoice_series: self
                .invoice_series
                .unwrap_or_else(|| existing.invoice_series.clone()),
            purchase_date: self.purchase_date.unwrap_or(existing.purchase_date),
            scheduled_at: self.scheduled_at.unwrap_or(existing.scheduled_at),
        }
        .validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body() -> serde_json::Value {
        json!({
            "customer": 1,
            "address": 2,
            "box_count": 3,
            "frozen": true,
            "packer_name": "João",
            "invoice_number": "000123",
            "invoice_series": "1",
            "purchase_date": "2026-03-01",
            "scheduled_at": "2026-03-02T14:00:00Z"
        })
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateDeliveryRequest = serde_json::from_value(body()).unwrap();
        let draft = request.validate().unwrap();
        assert_eq!(draft.status, DeliveryStatus::Pending);
        assert_eq!(draft.deliverer_id, None);
        assert!(draft.volumes.frozen);
        assert!(!draft.volumes.beverages);
    }

    #[test]
    fn test_negative_box_count_rejected() {
        let mut value = body();
        value["box_count"] = json!(-1);
        value["packer_name"] = json!("");
        let request: CreateDeliveryRequest = serde_json::from_value(value).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.get("box_count").is_some());
        assert!(errors.get("packer_name").is_some());
    }

    #[test]
    fn test_patch_uses_effective_pair() {
        let request: CreateDeliveryRequest = serde_json::from_value(body()).unwrap();
        let draft = request.validate().unwrap();
        let now = Utc::now();
        let existing = Delivery {
            id: DeliveryId::new(9),
            customer_id: draft.customer_id,
            address_id: draft.address_id,
            deliverer_id: Some(DelivererId::new(4)),
            status: draft.status,
            box_count: draft.box_count,
            volumes: draft.volumes,
            packer_name: draft.packer_name,
            invoice_number: draft.invoice_number,
            invoice_series: draft.invoice_series,
            purchase_date: draft.purchase_date,
            scheduled_at: draft.scheduled_at,
            created_at: now,
            updated_at: now,
        };

        let patch: UpdateDeliveryRequest =
            serde_json::from_value(json!({"address": 5, "deliverer": null})).unwrap();
        let merged = patch.apply(&existing).unwrap();
        assert_eq!(merged.customer_id, CustomerId::new(1));
        assert_eq!(merged.address_id, AddressId::new(5));
        assert_eq!(merged.deliverer_id, None);
        assert!(merged.volumes.frozen);

        let untouched: UpdateDeliveryRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            untouched.apply(&existing).unwrap().deliverer_id,
            Some(DelivererId::new(4))
        );
    }

    #[test]
    fn test_filter_ignores_bad_dates() {
        let filter = DeliveryFilter {
            start_date: Some("2026-01-15".to_owned()),
            end_date: Some("15/01/2026".to_owned()),
            search: Some("   ".to_owned()),
            ..Default::default()
        };
        assert_eq!(filter.start(), NaiveDate::from_ymd_opt(2026, 1, 15));
        assert_eq!(filter.end(), None);
        assert_eq!(filter.search_term(), None);
    }
}
