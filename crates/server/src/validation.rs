//! Request validation.
//!
//! Validation errors are collected per field so a single response can report
//! every problem at once: `{"errors": {"field": ["message", ...]}}`.

use std::collections::BTreeMap;
use std::fmt;

use perim_core::CustomerId;
use serde::Serialize;

use crate::models::Address;

/// Message reported when a delivery references another customer's address.
pub const ADDRESS_NOT_OWNED: &str = "this address does not belong to the selected customer";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error set holding one message.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any were added.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Trim a required text field, recording an error when blank or too long.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    max_len: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "this field may not be blank");
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("ensure this field has no more than {max_len} characters"),
        );
    }
    value.to_owned()
}

/// Trim an optional text field; blank values become `None`.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.chars().count() > max_len {
        errors.add(
            field,
            format!("ensure this field has no more than {max_len} characters"),
        );
    }
    Some(value.to_owned())
}

/// Record a parse failure under `field`, returning the parsed value otherwise.
pub fn parsed<T, E: fmt::Display>(
    errors: &mut FieldErrors,
    field: &'static str,
    result: Result<T, E>,
) -> Option<T> {
    result.map_err(|e| errors.add(field, e.to_string())).ok()
}

/// Message for a foreign key that does not resolve.
#[must_use]
pub fn missing_reference(id: i64) -> String {
    format!("invalid pk \"{id}\" - object does not exist")
}

/// Check that `address` belongs to the customer a delivery names.
///
/// # Errors
///
/// Returns a field error on `address` when the owner differs.
pub fn ensure_address_belongs_to_customer(
    customer_id: CustomerId,
    address: &Address,
) -> Result<(), FieldErrors> {
    if address.customer_id == customer_id {
        Ok(())
    } else {
        Err(FieldErrors::single("address", ADDRESS_NOT_OWNED))
    }
}
