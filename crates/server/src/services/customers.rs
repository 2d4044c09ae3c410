//! Customer writes and reads that span more than one table.

use std::collections::HashMap;

use perim_core::CustomerId;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::{AddressRepository, CustomerRepository};
use crate::error::AppError;
use crate::models::{
    Address, CreateCustomerRequest, Customer, CustomerFilter, CustomerWithAddresses, NewCustomer, Page,
    PageQuery, UpdateCustomerRequest,
};
use crate::validation::FieldErrors;

const TAX_ID_TAKEN: &str = "this tax id is already registered";

/// Customer operations.
pub struct CustomerService<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of customers, each with its addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        page: PageQuery,
    ) -> Result<Page<CustomerWithAddresses>, AppError> {
        let customers = CustomerRepository::new(self.pool);
        let count = customers.count(filter).await?;
        let rows = customers.list(filter, page.limit(), page.offset()).await?;

        let ids: Vec<CustomerId> = rows.iter().map(|c| c.id).collect();
        let mut by_customer: HashMap<CustomerId, Vec<Address>> = HashMap::new();
        for address in AddressRepository::new(self.pool)
            .list_for_customers(&ids)
            .await?
        {
            by_customer
                .entry(address.customer_id)
                .or_default()
                .push(address);
        }

        let results = rows
            .into_iter()
            .map(|customer| {
                let own = by_customer.remove(&customer.id).unwrap_or_default();
                CustomerWithAddresses::new(customer, own)
            })
            .collect();

        Ok(Page::new(page, count, results))
    }

    /// A customer with its addresses.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer doesn't exist.
    pub async fn detail(&self, id: CustomerId) -> Result<CustomerWithAddresses, AppError> {
        let customer = self.require(id).await?;
        let addresses = AddressRepository::new(self.pool)
            .list_for_customer(id)
            .await?;
        Ok(CustomerWithAddresses::new(customer, addresses))
    }

    /// # Errors
    ///
    /// Returns `AppError::Validation` for invalid fields or a taken tax id.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, AppError> {
        let customer = request.validate()?;
        self.ensure_tax_id_free(&customer, None).await?;

        let created = CustomerRepository::new(self.pool).create(&customer).await?;
        tracing::info!(customer_id = %created.id, "Customer created");
        Ok(created)
    }

    /// Replace every field of a customer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Validation`.
    #[instrument(skip(self, request))]
    pub async fn replace(
        &self,
        id: CustomerId,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let customer = request.validate()?;
        self.require(id).await?;
        self.save(id, &customer).await
    }

    /// Update the supplied fields of a customer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Validation`.
    #[instrument(skip(self, request))]
    pub async fn patch(
        &self,
        id: CustomerId,
        request: UpdateCustomerRequest,
    ) -> Result<Customer, AppError> {
        let existing = self.require(id).await?;
        let customer = request.apply(&existing)?;
        self.save(id, &customer).await
    }

    async fn save(&self, id: CustomerId, customer: &NewCustomer) -> Result<Customer, AppError> {
        self.ensure_tax_id_free(customer, Some(id)).await?;
        Ok(CustomerRepository::new(self.pool).update(id, customer).await?)
    }

    async fn require(&self, id: CustomerId) -> Result<Customer, AppError> {
        CustomerRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("customer".to_string()))
    }

    async fn ensure_tax_id_free(
        &self,
        customer: &NewCustomer,
        owner: Option<CustomerId>,
    ) -> Result<(), AppError> {
        let taken = CustomerRepository::new(self.pool)
            .tax_id_taken(&customer.tax_id, owner)
            .await?;
        if taken {
            return Err(FieldErrors::single("tax_id", TAX_ID_TAKEN).into());
        }
        Ok(())
    }
}
