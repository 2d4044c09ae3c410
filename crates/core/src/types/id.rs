//! Typed primary keys.
//!
//! Every table uses a `BIGSERIAL` primary key, so the wrappers hold an `i64`.
//! Mixing a `CustomerId` with an `AddressId` is a compile error, which matters
//! here because most writes carry both.

/// Declare an `i64` key newtype, transparent to serde and (with the
/// `postgres` feature) to sqlx.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// A registered customer.
    CustomerId
);
entity_id!(
    /// One of a customer's addresses.
    AddressId
);
entity_id!(
    /// A person who carries deliveries.
    DelivererId
);
entity_id!(
    /// A scheduled delivery.
    DeliveryId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_is_transparent() {
        let id = CustomerId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: AddressId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, AddressId::new(7));
    }

    #[test]
    fn test_conversions() {
        let id: DeliveryId = 9_i64.into();
        assert_eq!(i64::from(id), 9);
        assert_eq!(id.to_string(), "9");
        assert_eq!(DelivererId::new(-1).as_i64(), -1);
    }
}
