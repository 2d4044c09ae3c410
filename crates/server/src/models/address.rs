//! Address models.

use chrono::{DateTime, Utc};
use perim_core::{AddressId, CustomerId, PostalCode, RegionCode};
use serde::{Deserialize, Serialize};

use crate::validation::{FieldErrors, optional_text, parsed, required_text};

/// An address belonging to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub postal_code: PostalCode,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: RegionCode,
    /// Exactly one address per customer carries this flag.
    pub principal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated address fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub postal_code: PostalCode,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: RegionCode,
}

/// An insert (`id: None`) or update of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressWrite {
    pub id: Option<AddressId>,
    pub customer_id: CustomerId,
    pub fields: AddressFields,
    /// Requested principal flag; the invariant may still promote the address.
    ///
    /// `None` keeps the flag stored at write time (inserts start secondary).
    pub principal: Option<bool>,
}

impl AddressWrite {
    #[must_use]
    pub const fn insert(customer_id: CustomerId, fields: AddressFields, principal: bool) -> Self {
        Self {
            id: None,
            customer_id,
            fields,
            principal: Some(principal),
        }
    }

    #[must_use]
    pub const fn update(
        id: AddressId,
        customer_id: CustomerId,
        fields: AddressFields,
        principal: bool,
    ) -> Self {
        Self::patch(id, customer_id, fields, Some(principal))
    }

    /// An update that leaves the principal flag alone when `principal` is `None`.
    #[must_use]
    pub const fn patch(
        id: AddressId,
        customer_id: CustomerId,
        fields: AddressFields,
        principal: Option<bool>,
    ) -> Self {
        Self {
            id: Some(id),
            customer_id,
            fields,
            principal,
        }
    }
}

/// Body for `POST` and `PUT` on `/api/customers/{customer_id}/addresses`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAddressRequest {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub principal: bool,
}

impl CreateAddressRequest {
    /// Validate every field, returning the fields and the requested flag.
    ///
    /// # Errors
    ///
    /// Returns all field errors found.
    pub fn validate(&self) -> Result<(AddressFields, bool), FieldErrors> {
        let mut errors = FieldErrors::new();
        let postal_code = parsed(
            &mut errors,
            "postal_code",
            PostalCode::parse(&self.postal_code),
        );
        let street = required_text(&mut errors, "street", &self.street, 200);
        let number = required_text(&mut errors, "number", &self.number, 10);
        let complement = optional_text(
            &mut errors,
            "complement",
            self.complement.as_deref(),
            100,
        );
        let neighborhood = required_text(&mut errors, "neighborhood", &self.neighborhood, 100);
        let city = required_text(&mut errors, "city", &self.city, 100);
        let state = parsed(&mut errors, "state", RegionCode::parse(&self.state));

        let (Some(postal_code), Some(state)) = (postal_code, state) else {
            return Err(errors);
        };
        errors.into_result((
            AddressFields {
                postal_code,
                street,
                number,
                complement,
                neighborhood,
                city,
                state,
            },
            self.principal,
        ))
    }
}

/// Body for `PATCH` on an address.
///
/// Absent fields keep their value; `"complement": null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAddressRequest {
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    #[serde(default, deserialize_with = "super::present")]
    pub complement: Option<Option<String>>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub principal: Option<bool>,
}

impl UpdateAddressRequest {
    /// Merge onto `existing` and validate the result.
    ///
    /// The principal flag is passed through untouched: an absent flag is
    /// resolved against the row locked by the save, not against `existing`.
    ///
    /// # Errors
    ///
    /// Returns all field errors found.
    pub fn apply(self, existing: &Address) -> Result<(AddressFields, Option<bool>), FieldErrors> {
        let principal = self.principal;
        let (fields, _) = CreateAddressRequest {
            postal_code: self
                .postal_code
                .unwrap_or_else(|| existing.postal_code.as_str().to_owned()),
            street: self.street.unwrap_or_else(|| existing.street.clone()),
            number: self.number.unwrap_or_else(|| existing.number.clone()),
            complement: self
                .complement
                .unwrap_or_else(|| existing.complement.clone()),
            neighborhood: self
                .neighborhood
                .unwrap_or_else(|| existing.neighborhood.clone()),
            city: self.city.unwrap_or_else(|| existing.city.clone()),
            state: self
                .state
                .unwrap_or_else(|| existing.state.as_str().to_owned()),
            principal: false,
        }
        .validate()?;
        Ok((fields, principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> CreateAddressRequest {
        CreateAddressRequest {
            postal_code: "01001-000".to_owned(),
            street: "Praça da Sé".to_owned(),
            number: "100".to_owned(),
            complement: Some("  ".to_owned()),
            neighborhood: "Sé".to_owned(),
            city: "São Paulo".to_owned(),
            state: "sp".to_owned(),
            principal: false,
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let (fields, principal) = request().validate().unwrap();
        assert_eq!(fields.state.as_str(), "SP");
        assert_eq!(fields.complement, None);
        assert!(!principal);
    }

    #[test]
    fn test_validate_rejects_bad_postal_code_and_state() {
        let mut req = request();
        req.postal_code = "01001000".to_owned();
        req.state = "São Paulo".to_owned();
        let errors = req.validate().unwrap_err();
        assert!(errors.get("postal_code").is_some());
        assert!(errors.get("state").is_some());
    }

    #[test]
    fn test_patch_complement_null_vs_absent() {
        let (fields, _) = request().validate().unwrap();
        let now = Utc::now();
        let existing = Address {
            id: AddressId::new(1),
            customer_id: CustomerId::new(1),
            postal_code: fields.postal_code,
            street: fields.street,
            number: fields.number,
            complement: Some("Fundos".to_owned()),
            neighborhood: fields.neighborhood,
            city: fields.city,
            state: fields.state,
            principal: true,
            created_at: now,
            updated_at: now,
        };

        let absent: UpdateAddressRequest = serde_json::from_str(r#"{"number": "7"}"#).unwrap();
        let (kept, principal) = absent.apply(&existing).unwrap();
        assert_eq!(kept.complement.as_deref(), Some("Fundos"));
        assert_eq!(kept.number, "7");
        assert_eq!(principal, None, "absent flag is left for the save to resolve");

        let cleared: UpdateAddressRequest =
            serde_json::from_str(r#"{"complement": null}"#).unwrap();
        let (cleared, _) = cleared.apply(&existing).unwrap();
        assert_eq!(cleared.complement, None);

        let demote: UpdateAddressRequest =
            serde_json::from_str(r#"{"principal": false}"#).unwrap();
        let (_, principal) = demote.apply(&existing).unwrap();
        assert_eq!(principal, Some(false));
    }
}
