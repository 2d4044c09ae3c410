//! Customer models.

use chrono::{DateTime, Utc};
use perim_core::{CustomerId, Phone, TaxId};
use serde::{Deserialize, Serialize};

use super::{Address, DeliveryView};
use crate::validation::{FieldErrors, parsed, required_text};

const NAME_MAX: usize = 200;

/// A customer as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub tax_id: TaxId,
    pub phone: Phone,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer with its addresses, principal first.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerWithAddresses {
    #[serde(flatten)]
    pub customer: Customer,
    pub addresses: Vec<Address>,
    pub principal_address: Option<Address>,
}

impl CustomerWithAddresses {
    #[must_use]
    pub fn new(customer: Customer, addresses: Vec<Address>) -> Self {
        let principal_address = addresses.iter().find(|a| a.principal).cloned();
        Self {
            customer,
            addresses,
            principal_address,
        }
    }
}

/// A customer together with their deliveries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDeliveries {
    pub customer: CustomerWithAddresses,
    pub deliveries: Vec<DeliveryView>,
}

/// Filters for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Case-insensitive substring of the name, tax id or phone.
    pub search: Option<String>,
}

/// Validated customer fields, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub tax_id: TaxId,
    pub phone: Phone,
}

/// Body for `POST /api/customers` and `PUT /api/customers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub tax_id: String,
    pub phone: String,
}

impl CreateCustomerRequest {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns all field errors found.
    pub fn validate(&self) -> Result<NewCustomer, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        let tax_id = parsed(&mut errors, "tax_id", TaxId::parse(&self.tax_id));
        let phone = parsed(&mut errors, "phone", Phone::parse(&self.phone));

        let (Some(tax_id), Some(phone)) = (tax_id, phone) else {
            return Err(errors);
        };
        errors.into_result(NewCustomer {
            name,
            tax_id,
            phone,
        })
    }
}

/// Body for `PATCH /api/customers/{id}`; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
}

impl UpdateCustomerRequest {
    /// Merge onto `existing` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns all field errors found in the supplied fields.
    pub fn apply(self, existing: &Customer) -> Result<NewCustomer, FieldErrors> {
        CreateCustomerRequest {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            tax_id: self
                .tax_id
                .unwrap_or_else(|| existing.tax_id.as_str().to_owned()),
            phone: self
                .phone
                .unwrap_or_else(|| existing.phone.as_str().to_owned()),
        }
        .validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: " Maria Souza ".to_owned(),
            tax_id: "529.982.247-25".to_owned(),
            phone: "(11) 98765-4321".to_owned(),
        }
    }

    #[test]
    fn test_validate_ok() {
        let customer = request().validate().unwrap();
        assert_eq!(customer.name, "Maria Souza");
        assert_eq!(customer.tax_id.as_str(), "529.982.247-25");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errors = CreateCustomerRequest {
            name: String::new(),
            tax_id: "111.111.111-11".to_owned(),
            phone: "11987654321".to_owned(),
        }
        .validate()
        .unwrap_err();

        assert!(errors.get("name").is_some());
        assert!(errors.get("tax_id").is_some());
        assert!(errors.get("phone").is_some());
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let now = Utc::now();
        let existing = Customer {
            id: CustomerId::new(1),
            name: "Maria".to_owned(),
            tax_id: TaxId::parse("529.982.247-25").unwrap(),
            phone: Phone::parse("(11) 98765-4321").unwrap(),
            created_at: now,
            updated_at: now,
        };
        let patch = UpdateCustomerRequest {
            phone: Some("(21) 3333-4444".to_owned()),
            ..Default::default()
        };

        let merged = patch.apply(&existing).unwrap();
        assert_eq!(merged.name, "Maria");
        assert_eq!(merged.tax_id, existing.tax_id);
        assert_eq!(merged.phone.as_str(), "(21) 3333-4444");
    }
}
