//! Delivery writes.
//!
//! Every write resolves its references and checks that the address belongs
//! to the customer before anything is persisted.

use perim_core::DeliveryId;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::{
    AddressRepository, CustomerRepository, DelivererRepository, DeliveryRepository,
    RepositoryError,
};
use crate::error::AppError;
use crate::models::{CreateDeliveryRequest, DeliveryDraft, DeliveryView, UpdateDeliveryRequest};
use crate::validation::{FieldErrors, ensure_address_belongs_to_customer, missing_reference};

/// Delivery operations.
pub struct DeliveryService<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid fields, unknown references
    /// or an address owned by another customer.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateDeliveryRequest) -> Result<DeliveryView, AppError> {
        let draft = request.validate()?;
        self.check_references(&draft).await?;

        let created = DeliveryRepository::new(self.pool)
            .create(&draft)
            .await
            .map_err(|e| stale_reference(e, &draft))?;
        tracing::info!(
            delivery_id = %created.id,
            customer_id = %created.customer_id,
            "Delivery created"
        );
        self.view(created.id).await
    }

    /// Replace every field of a delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Validation`.
    #[instrument(skip(self, request))]
    pub async fn replace(
        &self,
        id: DeliveryId,
        request: &CreateDeliveryRequest,
    ) -> Result<DeliveryView, AppError> {
        let draft = request.validate()?;
        let repo = DeliveryRepository::new(self.pool);
        repo.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("delivery".to_string()))?;

        self.check_references(&draft).await?;
        repo.update(id, &draft)
            .await
            .map_err(|e| stale_reference(e, &draft))?;
        self.view(id).await
    }

    /// Update the supplied fields; the effective customer/address pair is re-checked.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Validation`.
    #[instrument(skip(self, request))]
    pub async fn patch(
        &self,
        id: DeliveryId,
        request: UpdateDeliveryRequest,
    ) -> Result<DeliveryView, AppError> {
        let repo = DeliveryRepository::new(self.pool);
        let existing = repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("delivery".to_string()))?;

        let draft = request.apply(&existing)?;
        self.check_references(&draft).await?;
        repo.update(id, &draft)
            .await
            .map_err(|e| stale_reference(e, &draft))?;
        self.view(id).await
    }

    async fn view(&self, id: DeliveryId) -> Result<DeliveryView, AppError> {
        DeliveryRepository::new(self.pool)
            .get_view(id)
            .await?
            .ok_or_else(|| AppError::NotFound("delivery".to_string()))
    }

    /// Resolve customer, address and deliverer, then check address ownership.
    async fn check_references(&self, draft: &DeliveryDraft) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();

        let customer = CustomerRepository::new(self.pool)
            .get(draft.customer_id)
            .await?;
        if customer.is_none() {
            errors.add("customer", missing_reference(draft.customer_id.as_i64()));
        }

        let address = AddressRepository::new(self.pool)
            .get_by_id(draft.address_id)
            .await?;
        if address.is_none() {
            errors.add("address", missing_reference(draft.address_id.as_i64()));
        }

        if let Some(deliverer_id) = draft.deliverer_id {
            let deliverer = DelivererRepository::new(self.pool).get(deliverer_id).await?;
            if deliverer.is_none() {
                errors.add("deliverer", missing_reference(deliverer_id.as_i64()));
            }
        }

        if let (Some(customer), Some(address)) = (&customer, &address)
            && let Err(mismatch) = ensure_address_belongs_to_customer(customer.id, address)
        {
            tracing::debug!(
                customer_id = %customer.id,
                address_id = %address.id,
                owner_id = %address.customer_id,
                "Rejected delivery with another customer's address"
            );
            errors.merge(mismatch);
        }

        Ok(errors.into_result(())?)
    }
}

/// A reference deleted between the check and the write is reported like one
/// that never existed. Constraint names are `PostgreSQL`'s defaults.
fn stale_reference(e: RepositoryError, draft: &DeliveryDraft) -> AppError {
    let RepositoryError::MissingReference(constraint) = e else {
        return e.into();
    };
    let (field, id) = match (constraint.as_str(), draft.deliverer_id) {
        ("delivery_customer_id_fkey", _) => ("customer", draft.customer_id.as_i64()),
        ("delivery_deliverer_id_fkey", Some(deliverer_id)) => {
            ("deliverer", deliverer_id.as_i64())
        }
        _ => ("address", draft.address_id.as_i64()),
    };
    FieldErrors::single(field, missing_reference(id)).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use perim_core::{AddressId, CustomerId, DelivererId, DeliveryStatus, ExtraVolumes};

    use super::*;

    fn draft() -> DeliveryDraft {
        DeliveryDraft {
            customer_id: CustomerId::new(1),
            address_id: AddressId::new(2),
            deliverer_id: Some(DelivererId::new(3)),
            status: DeliveryStatus::Pending,
            box_count: 1,
            volumes: ExtraVolumes::default(),
            packer_name: "Ana".to_owned(),
            invoice_number: "1".to_owned(),
            invoice_series: "1".to_owned(),
            purchase_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        }
    }

    fn field_of(constraint: &str) -> (String, String) {
        let missing = RepositoryError::MissingReference(constraint.to_owned());
        let err = stale_reference(missing, &draft());
        let AppError::Validation(errors) = err else {
            panic!("expected a field error, got {err:?}");
        };
        let json = serde_json::to_value(&errors).unwrap();
        let (field, messages) = json.as_object().unwrap().iter().next().unwrap();
        (field.clone(), messages[0].as_str().unwrap().to_owned())
    }

    #[test]
    fn test_address_deleted_before_insert_is_field_error() {
        assert_eq!(
            field_of("delivery_address_id_fkey"),
            ("address".to_owned(), missing_reference(2))
        );
    }

    #[test]
    fn test_customer_and_deliverer_deleted_before_insert() {
        assert_eq!(field_of("delivery_customer_id_fkey").0, "customer");
        assert_eq!(field_of("delivery_deliverer_id_fkey").0, "deliverer");
    }

    #[test]
    fn test_other_repository_errors_pass_through() {
        let err = stale_reference(RepositoryError::NotFound, &draft());
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
