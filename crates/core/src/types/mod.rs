//! Core types for Perim deliveries.
//!
//! This module provides type-safe wrappers for the domain's validated values.

/// Implement `sqlx` text encoding for a `String` newtype.
///
/// Database values are assumed valid: they were parsed on the way in.
macro_rules! impl_pg_text {
    ($name:ident) => {
        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self(s))
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

pub mod address;
pub mod id;
pub mod phone;
pub mod status;
pub mod tax_id;
pub mod volumes;

pub use address::{PostalCode, PostalCodeError, RegionCode, RegionCodeError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use status::*;
pub use tax_id::{TaxId, TaxIdError, is_valid as is_valid_tax_id};
pub use volumes::ExtraVolumes;
