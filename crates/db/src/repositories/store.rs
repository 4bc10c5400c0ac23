use tracing::debug;

use farmquote_core::domain::customer::{Customer, CustomerId, NewCustomer};
use farmquote_core::domain::estimate::{Estimate, NewEstimate};
use farmquote_core::submission::{EstimateStore, StoreError};

use super::{CustomerRepository, EstimateRepository, SqlCustomerRepository, SqlEstimateRepository};
use crate::DbPool;

/// SQLite-backed writes for the submission pipeline.
pub struct SqlEstimateStore {
    customers: SqlCustomerRepository,
    estimates: SqlEstimateRepository,
}

impl SqlEstimateStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            customers: SqlCustomerRepository::new(pool.clone()),
            estimates: SqlEstimateRepository::new(pool),
        }
    }

    pub fn customers(&self) -> &SqlCustomerRepository {
        &self.customers
    }

    pub fn estimates(&self) -> &SqlEstimateRepository {
        &self.estimates
    }
}

#[async_trait::async_trait]
impl EstimateStore for SqlEstimateStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let customer = self.customers.insert(customer).await?;
        debug!(event_name = "db.customer.inserted", customer_id = %customer.id, "customer row written");
        Ok(customer)
    }

    async fn insert_estimate(&self, estimate: NewEstimate) -> Result<Estimate, StoreError> {
        let estimate = self.estimates.insert(estimate).await?;
        debug!(
            event_name = "db.estimate.inserted",
            estimate_id = %estimate.id,
            customer_id = %estimate.customer_id,
            "estimate row written"
        );
        Ok(estimate)
    }

    async fn remove_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        if !self.customers.delete(&id).await? {
            return Err(StoreError::new(format!("customer {id} was not found")));
        }
        debug!(event_name = "db.customer.removed", customer_id = %id, "customer row removed");
        Ok(())
    }
}
