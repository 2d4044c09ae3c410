//! Principal-address invariant.
//!
//! A customer with at least one address always has exactly one principal
//! address. The partial unique index `address_one_principal_per_customer`
//! guarantees "at most one"; [`save_address`] and [`delete_address`] keep
//! "at least one" by promoting an address whenever none is left.
//!
//! Both functions run against an [`AddressLedger`], which the database layer
//! implements for a `PgConnection` inside one transaction.

use perim_core::{AddressId, CustomerId};
use tracing::{debug, info};

use crate::db::RepositoryError;
use crate::models::{Address, AddressWrite};

/// Storage steps the invariant needs, scoped to one transaction.
#[allow(async_fn_in_trait)]
pub trait AddressLedger {
    /// Lock the customer row so address writes for it are serialized.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the customer does not exist.
    async fn lock_customer(&mut self, customer_id: CustomerId) -> Result<(), RepositoryError>;

    /// Clear `principal` on the customer's addresses, except `keep`.
    ///
    /// Returns the number of addresses demoted.
    async fn demote_principals(
        &mut self,
        customer_id: CustomerId,
        keep: Option<AddressId>,
    ) -> Result<u64, RepositoryError>;

    /// Current principal flag of one of the customer's addresses.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the address does not exist.
    async fn stored_principal(
        &mut self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError>;

    /// Insert or update the address row with the resolved `principal` flag.
    async fn persist(
        &mut self,
        write: &AddressWrite,
        principal: bool,
    ) -> Result<Address, RepositoryError>;

    /// Whether any address of the customer, other than `excluding`, is principal.
    async fn has_principal(
        &mut self,
        customer_id: CustomerId,
        excluding: Option<AddressId>,
    ) -> Result<bool, RepositoryError>;

    async fn count_addresses(&mut self, customer_id: CustomerId) -> Result<i64, RepositoryError>;

    /// Set `principal` on one address.
    async fn mark_principal(&mut self, id: AddressId) -> Result<Address, RepositoryError>;

    /// First address of the customer by street, then id.
    async fn first_address(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<Option<AddressId>, RepositoryError>;

    /// Delete one address. Returns whether a row was removed.
    async fn remove(
        &mut self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError>;
}

/// Why an address was promoted to principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// A new address for a customer without a principal.
    FirstPrincipal,
    /// The only address of its customer.
    SoleAddress,
    /// An update cleared the last principal flag; it is put back.
    Restored,
    /// The principal was deleted; another address takes over.
    Replacement,
}

impl Promotion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::FirstPrincipal => "first_principal",
            Self::SoleAddress => "sole_address",
            Self::Restored => "restored",
            Self::Replacement => "replacement",
        }
    }
}

/// Save an address and restore the single-principal invariant.
///
/// 1. Resolve an absent flag against the locked row, then, if the write is
///    principal, demote every other principal of the customer.
/// 2. Persist the row.
/// 3. If the saved row is not principal and the customer is left without one,
///    promote the saved row.
///
/// # Errors
///
/// Returns [`RepositoryError::NotFound`] when the customer or the updated
/// address does not exist, and [`RepositoryError::Conflict`] if storage still
/// rejects a second principal.
pub async fn save_address<L>(ledger: &mut L, write: &AddressWrite) -> Result<Address, RepositoryError>
where
    L: AddressLedger + ?Sized,
{
    let customer_id = write.customer_id;
    ledger.lock_customer(customer_id).await?;

    let principal = match (write.principal, write.id) {
        (Some(requested), _) => requested,
        (None, Some(id)) => ledger.stored_principal(customer_id, id).await?,
        (None, None) => false,
    };

    if principal {
        let demoted = ledger.demote_principals(customer_id, write.id).await?;
        if demoted > 0 {
            debug!(customer_id = %customer_id, demoted, "Demoted previous principal address");
        }
    }

    let saved = ledger.persist(write, principal).await?;
    if saved.principal {
        return Ok(saved);
    }

    let promotion = if write.id.is_none() {
        if ledger.has_principal(customer_id, Some(saved.id)).await? {
            None
        } else {
            Some(Promotion::FirstPrincipal)
        }
    } else if ledger.has_principal(customer_id, None).await? {
        None
    } else if ledger.count_addresses(customer_id).await? == 1 {
        Some(Promotion::SoleAddress)
    } else {
        Some(Promotion::Restored)
    };

    match promotion {
        None => Ok(saved),
        Some(reason) => {
            info!(
                customer_id = %customer_id,
                address_id = %saved.id,
                reason = reason.as_str(),
                "Promoting address to principal"
            );
            ledger.mark_principal(saved.id).await
        }
    }
}

/// Delete an address, promoting a replacement if the principal was removed.
///
/// Returns `false` when the address does not exist for this customer.
///
/// # Errors
///
/// Returns [`RepositoryError::NotFound`] when the customer does not exist.
pub async fn delete_address<L>(
    ledger: &mut L,
    customer_id: CustomerId,
    id: AddressId,
) -> Result<bool, RepositoryError>
where
    L: AddressLedger + ?Sized,
{
    ledger.lock_customer(customer_id).await?;

    if !ledger.remove(customer_id, id).await? {
        return Ok(false);
    }

    if !ledger.has_principal(customer_id, None).await?
        && let Some(next) = ledger.first_address(customer_id).await?
    {
        info!(
            customer_id = %customer_id,
            address_id = %next,
            reason = Promotion::Replacement.as_str(),
            "Promoting address to principal"
        );
        ledger.mark_principal(next).await?;
    }

    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use perim_core::{PostalCode, RegionCode};

    use super::*;
    use crate::models::AddressFields;

    /// In-memory ledger that enforces the partial unique index like `PostgreSQL`.
    #[derive(Default)]
    struct MemoryLedger {
        customers: HashSet<CustomerId>,
        rows: Vec<Address>,
        next_id: i64,
    }

    impl MemoryLedger {
        fn with_customers(ids: &[i64]) -> Self {
            Self {
                customers: ids.iter().copied().map(CustomerId::new).collect(),
                ..Self::default()
            }
        }

        fn principals(&self, customer_id: CustomerId) -> Vec<AddressId> {
            self.rows
                .iter()
                .filter(|a| a.customer_id == customer_id && a.principal)
                .map(|a| a.id)
                .collect()
        }

        fn check_unique(&self, candidate: &Address) -> Result<(), RepositoryError> {
            let clash = candidate.principal
                && self.rows.iter().any(|a| {
                    a.customer_id == candidate.customer_id && a.principal && a.id != candidate.id
                });
            if clash {
                Err(RepositoryError::Conflict("second principal".to_owned()))
            } else {
                Ok(())
            }
        }
    }

    impl AddressLedger for MemoryLedger {
        async fn lock_customer(&mut self, customer_id: CustomerId) -> Result<(), RepositoryError> {
            if self.customers.contains(&customer_id) {
                Ok(())
            } else {
                Err(RepositoryError::NotFound)
            }
        }

        async fn demote_principals(
            &mut self,
            customer_id: CustomerId,
            keep: Option<AddressId>,
        ) -> Result<u64, RepositoryError> {
            let mut demoted = 0;
            for row in &mut self.rows {
                if row.customer_id == customer_id && row.principal && Some(row.id) != keep {
                    row.principal = false;
                    demoted += 1;
                }
            }
            Ok(demoted)
        }

        async fn stored_principal(
            &mut self,
            customer_id: CustomerId,
            id: AddressId,
        ) -> Result<bool, RepositoryError> {
            self.rows
                .iter()
                .find(|a| a.id == id && a.customer_id == customer_id)
                .map(|a| a.principal)
                .ok_or(RepositoryError::NotFound)
        }

        async fn persist(
            &mut self,
            write: &AddressWrite,
            principal: bool,
        ) -> Result<Address, RepositoryError> {
            let now = Utc::now();
            let f = &write.fields;
            let id = match write.id {
                Some(id) => id,
                None => {
                    self.next_id += 1;
                    AddressId::new(self.next_id)
                }
            };
            let row = Address {
                id,
                customer_id: write.customer_id,
                postal_code: f.postal_code.clone(),
                street: f.street.clone(),
                number: f.number.clone(),
                complement: f.complement.clone(),
                neighborhood: f.neighborhood.clone(),
                city: f.city.clone(),
                state: f.state.clone(),
                principal,
                created_at: now,
                updated_at: now,
            };
            self.check_unique(&row)?;

            if write.id.is_some() {
                let slot = self
                    .rows
                    .iter_mut()
                    .find(|a| a.id == id && a.customer_id == write.customer_id)
                    .ok_or(RepositoryError::NotFound)?;
                *slot = row.clone();
            } else {
                self.rows.push(row.clone());
            }
            Ok(row)
        }

        async fn has_principal(
            &mut self,
            customer_id: CustomerId,
            excluding: Option<AddressId>,
        ) -> Result<bool, RepositoryError> {
            Ok(self
                .principals(customer_id)
                .into_iter()
                .any(|id| Some(id) != excluding))
        }

        async fn count_addresses(&mut self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
            let count = self
                .rows
                .iter()
                .filter(|a| a.customer_id == customer_id)
                .count();
            Ok(i64::try_from(count).unwrap())
        }

        async fn mark_principal(&mut self, id: AddressId) -> Result<Address, RepositoryError> {
            let mut candidate = self
                .rows
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or(RepositoryError::NotFound)?;
            candidate.principal = true;
            self.check_unique(&candidate)?;
            let slot = self.rows.iter_mut().find(|a| a.id == id).unwrap();
            slot.principal = true;
            Ok(candidate)
        }

        async fn first_address(
            &mut self,
            customer_id: CustomerId,
        ) -> Result<Option<AddressId>, RepositoryError> {
            Ok(self
                .rows
                .iter()
                .filter(|a| a.customer_id == customer_id)
                .min_by(|a, b| a.street.cmp(&b.street).then(a.id.cmp(&b.id)))
                .map(|a| a.id))
        }

        async fn remove(
            &mut self,
            customer_id: CustomerId,
            id: AddressId,
        ) -> Result<bool, RepositoryError> {
            let before = self.rows.len();
            self.rows
                .retain(|a| !(a.id == id && a.customer_id == customer_id));
            Ok(self.rows.len() < before)
        }
    }

    fn fields(street: &str) -> AddressFields {
        AddressFields {
            postal_code: PostalCode::parse("01001-000").unwrap(),
            street: street.to_owned(),
            number: "10".to_owned(),
            complement: None,
            neighborhood: "Centro".to_owned(),
            city: "São Paulo".to_owned(),
            state: RegionCode::parse("SP").unwrap(),
        }
    }

    fn customer(id: i64) -> CustomerId {
        CustomerId::new(id)
    }

    async fn insert(ledger: &mut MemoryLedger, c: i64, street: &str, principal: bool) -> Address {
        save_address(ledger, &AddressWrite::insert(customer(c), fields(street), principal))
            .await
            .unwrap()
    }

    async fn update(ledger: &mut MemoryLedger, a: &Address, principal: bool) -> Address {
        let write = AddressWrite::update(a.id, a.customer_id, fields(&a.street), principal);
        save_address(ledger, &write).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_address_is_promoted() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let first = insert(&mut ledger, 1, "Rua A", false).await;
        assert!(first.principal);
        assert_eq!(ledger.principals(customer(1)), vec![first.id]);
    }

    #[tokio::test]
    async fn test_second_non_principal_stays_secondary() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let first = insert(&mut ledger, 1, "Rua A", false).await;
        let second = insert(&mut ledger, 1, "Rua B", false).await;
        assert!(!second.principal);
        assert_eq!(ledger.principals(customer(1)), vec![first.id]);
    }

    #[tokio::test]
    async fn test_new_principal_demotes_previous() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let a1 = insert(&mut ledger, 1, "Rua A", true).await;
        let a2 = insert(&mut ledger, 1, "Rua B", false).await;
        assert_eq!(ledger.principals(customer(1)), vec![a1.id]);

        let a2 = update(&mut ledger, &a2, true).await;
        assert!(a2.principal);
        assert_eq!(ledger.principals(customer(1)), vec![a2.id]);
    }

    #[tokio::test]
    async fn test_resaving_sole_principal_is_idempotent() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let only = insert(&mut ledger, 1, "Rua A", true).await;

        for _ in 0..3 {
            let saved = update(&mut ledger, &only, true).await;
            assert!(saved.principal);
        }
        assert_eq!(ledger.principals(customer(1)), vec![only.id]);
        assert_eq!(ledger.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_unflagging_sole_address_keeps_it_principal() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let only = insert(&mut ledger, 1, "Rua A", true).await;
        let saved = update(&mut ledger, &only, false).await;
        assert!(saved.principal);
    }

    #[tokio::test]
    async fn test_unflagging_principal_among_several_restores_it() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let a1 = insert(&mut ledger, 1, "Rua A", true).await;
        insert(&mut ledger, 1, "Rua B", false).await;

        let saved = update(&mut ledger, &a1, false).await;
        assert!(saved.principal);
        assert_eq!(ledger.principals(customer(1)), vec![a1.id]);
    }

    #[tokio::test]
    async fn test_exactly_one_principal_after_mixed_sequence() {
        let mut ledger = MemoryLedger::with_customers(&[1, 2]);
        let a = insert(&mut ledger, 1, "Rua A", false).await;
        let b = insert(&mut ledger, 1, "Rua B", true).await;
        let c = insert(&mut ledger, 1, "Rua C", true).await;
        insert(&mut ledger, 2, "Rua X", true).await;
        let a = update(&mut ledger, &a, true).await;
        update(&mut ledger, &b, false).await;
        update(&mut ledger, &c, false).await;
        insert(&mut ledger, 1, "Rua D", false).await;

        assert_eq!(ledger.principals(customer(1)), vec![a.id]);
        assert_eq!(ledger.principals(customer(2)).len(), 1);
    }

    #[tokio::test]
    async fn test_patch_without_flag_keeps_current_principal() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let a = insert(&mut ledger, 1, "Rua A", true).await;
        let b = insert(&mut ledger, 1, "Rua B", false).await;

        let write = AddressWrite::patch(a.id, a.customer_id, fields("Rua A2"), None);
        let saved = save_address(&mut ledger, &write).await.unwrap();
        assert!(saved.principal);
        assert_eq!(ledger.principals(customer(1)), vec![a.id]);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_patch_without_flag_does_not_take_back_moved_principal() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let a = insert(&mut ledger, 1, "Rua A", true).await;
        let b = insert(&mut ledger, 1, "Rua B", false).await;
        // `a` was read as principal, then another writer moved the flag to `b`.
        let stale = a.clone();
        update(&mut ledger, &b, true).await;

        let write = AddressWrite::patch(stale.id, stale.customer_id, fields("Rua A"), None);
        let saved = save_address(&mut ledger, &write).await.unwrap();
        assert!(!saved.principal);
        assert_eq!(ledger.principals(customer(1)), vec![b.id]);
    }

    #[tokio::test]
    async fn test_patch_of_missing_address_is_not_found() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let write = AddressWrite::patch(AddressId::new(7), customer(1), fields("Rua A"), None);
        let result = save_address(&mut ledger, &write).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let result =
            save_address(&mut ledger, &AddressWrite::insert(customer(9), fields("Rua A"), true)).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(ledger.rows.is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_address_is_not_found() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let write = AddressWrite::update(AddressId::new(42), customer(1), fields("Rua A"), false);
        let result = save_address(&mut ledger, &write).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_deleting_principal_promotes_first_remaining() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let principal = insert(&mut ledger, 1, "Rua M", true).await;
        let later = insert(&mut ledger, 1, "Rua Z", false).await;
        let earlier = insert(&mut ledger, 1, "Rua B", false).await;

        assert!(delete_address(&mut ledger, customer(1), principal.id).await.unwrap());
        assert_eq!(ledger.principals(customer(1)), vec![earlier.id]);
        assert_ne!(earlier.id, later.id);
    }

    #[tokio::test]
    async fn test_deleting_secondary_leaves_principal() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        let principal = insert(&mut ledger, 1, "Rua M", true).await;
        let other = insert(&mut ledger, 1, "Rua A", false).await;

        assert!(delete_address(&mut ledger, customer(1), other.id).await.unwrap());
        assert_eq!(ledger.principals(customer(1)), vec![principal.id]);
    }

    #[tokio::test]
    async fn test_deleting_missing_address_reports_false() {
        let mut ledger = MemoryLedger::with_customers(&[1]);
        assert!(!delete_address(&mut ledger, customer(1), AddressId::new(5)).await.unwrap());
    }
}
