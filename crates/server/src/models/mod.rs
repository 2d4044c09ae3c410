//! Domain models and request schemas.
//!
//! Each entity has a stored representation plus explicit `Create*Request`
//! (POST and PUT) and `Update*Request` (PATCH) types. Requests are validated
//! into drafts before any repository call.

pub mod address;
pub mod customer;
pub mod deliverer;
pub mod delivery;
pub mod page;
pub mod stats;

pub use address::{Address, AddressFields, AddressWrite, CreateAddressRequest, UpdateAddressRequest};
pub use customer::{
    CreateCustomerRequest, Customer, CustomerDeliveries, CustomerFilter, CustomerWithAddresses,
    NewCustomer, UpdateCustomerRequest,
};
pub use deliverer::{CreateDelivererRequest, Deliverer, UpdateDelivererRequest};
pub use delivery::{
    CreateDeliveryRequest, Delivery, DeliveryDraft, DeliveryFilter, DeliveryView,
    UpdateDeliveryRequest,
};
pub use page::{Page, PageQuery};
pub use stats::{DelivererOfTheDay, MonthlyCount, Stats, StatusCount, TopCustomer};

/// Deserialize a present field (including an explicit `null`) as `Some`.
///
/// Paired with `#[serde(default)]`, an `Option<Option<T>>` then distinguishes
/// "absent" (`None`) from "set to null" (`Some(None)`).
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
