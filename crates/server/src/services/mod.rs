//! Business services for the Perim API.
//!
//! - [`customers`] - Customer writes with tax-id uniqueness checks
//! - [`deliveries`] - Delivery writes with reference and ownership checks
//! - [`postal_code`] - Postal-code lookup client

pub mod customers;
pub mod deliveries;
pub mod postal_code;

pub use customers::CustomerService;
pub use deliveries::DeliveryService;
pub use postal_code::{PostalCodeClient, PostalCodeLookup, PostalLookupError};
