//! Deliverer models.

use chrono::{DateTime, Utc};
use perim_core::DelivererId;
use serde::{Deserialize, Serialize};

use crate::validation::{FieldErrors, required_text};

/// A person who carries deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Deliverer {
    pub id: DelivererId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for `POST /api/deliverers` and `PUT /api/deliverers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDelivererRequest {
    pub name: String,
}

impl CreateDelivererRequest {
    /// Validate the name.
    ///
    /// # Errors
    ///
    /// Returns a field error when the name is blank or longer than 100 characters.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &self.name, 100);
        errors.into_result(name)
    }
}

/// Body for `PATCH /api/deliverers/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDelivererRequest {
    pub name: Option<String>,
}

impl UpdateDelivererRequest {
    /// # Errors
    ///
    /// Returns a field error when a supplied name is invalid.
    pub fn apply(self, existing: &Deliverer) -> Result<String, FieldErrors> {
        CreateDelivererRequest {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
        }
        .validate()
    }
}
