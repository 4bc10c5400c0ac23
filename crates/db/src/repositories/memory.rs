use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;

use farmquote_core::domain::customer::{Customer, CustomerId, NewCustomer};
use farmquote_core::domain::estimate::{Estimate, EstimateId, NewEstimate};
use farmquote_core::submission::{EstimateStore, StoreError};

/// Write that an [`InMemoryEstimateStore`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    InsertCustomer,
    InsertEstimate,
    RemoveCustomer,
}

#[derive(Default)]
pub struct InMemoryEstimateStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
    estimates: RwLock<HashMap<EstimateId, Estimate>>,
    failures: RwLock<HashSet<FailurePoint>>,
}

impl InMemoryEstimateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_on(&self, point: FailurePoint) {
        self.failures.write().await.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    pub async fn customers(&self) -> Vec<Customer> {
        self.customers.read().await.values().cloned().collect()
    }

    pub async fn estimates(&self) -> Vec<Estimate> {
        self.estimates.read().await.values().cloned().collect()
    }

    async fn check(&self, point: FailurePoint) -> Result<(), StoreError> {
        if self.failures.read().await.contains(&point) {
            return Err(StoreError::new(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EstimateStore for InMemoryEstimateStore {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        self.check(FailurePoint::InsertCustomer).await?;
        let customer = Customer::from_new(CustomerId::generate(), customer, Utc::now());
        self.customers.write().await.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn insert_estimate(&self, estimate: NewEstimate) -> Result<Estimate, StoreError> {
        self.check(FailurePoint::InsertEstimate).await?;
        if !self.customers.read().await.contains_key(&estimate.customer_id) {
            return Err(StoreError::new(format!(
                "customer {} does not exist",
                estimate.customer_id
            )));
        }
        let estimate = Estimate::from_new(EstimateId::generate(), estimate, Utc::now());
        self.estimates.write().await.insert(estimate.id, estimate.clone());
        Ok(estimate)
    }

    async fn remove_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        self.check(FailurePoint::RemoveCustomer).await?;
        if self.estimates.read().await.values().any(|estimate| estimate.customer_id == id) {
            return Err(StoreError::new(format!("customer {id} still has estimates")));
        }
        match self.customers.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::new(format!("customer {id} was not found"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use farmquote_core::domain::customer::CustomerId;
    use farmquote_core::domain::estimate::NewEstimate;
    use farmquote_core::submission::EstimateStore;

    use super::{FailurePoint, InMemoryEstimateStore};
    use crate::repositories::test_support::{new_customer, raw_input, record};

    #[tokio::test]
    async fn stores_customer_and_estimate() {
        let store = InMemoryEstimateStore::new();

        let customer = store.insert_customer(new_customer()).await.expect("insert customer");
        let estimate = store
            .insert_estimate(NewEstimate::submitted(customer.id, record(), raw_input()))
            .await
            .expect("insert estimate");

        assert_eq!(store.customers().await.len(), 1);
        assert_eq!(store.estimates().await, vec![estimate]);
    }

    #[tokio::test]
    async fn estimate_for_unknown_customer_is_rejected() {
        let store = InMemoryEstimateStore::new();

        let result = store
            .insert_estimate(NewEstimate::submitted(CustomerId::generate(), record(), raw_input()))
            .await;

        assert!(result.is_err());
        assert!(store.estimates().await.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_apply_until_cleared() {
        let store = InMemoryEstimateStore::new();
        store.fail_on(FailurePoint::InsertCustomer).await;

        let error = store.insert_customer(new_customer()).await.expect_err("injected failure");
        assert!(error.message().contains("InsertCustomer"));

        store.clear_failures().await;
        store.insert_customer(new_customer()).await.expect("insert after clearing");
    }

    #[tokio::test]
    async fn customer_with_estimates_cannot_be_removed() {
        let store = InMemoryEstimateStore::new();
        let customer = store.insert_customer(new_customer()).await.expect("insert customer");
        store
            .insert_estimate(NewEstimate::submitted(customer.id, record(), raw_input()))
            .await
            .expect("insert estimate");

        assert!(store.remove_customer(customer.id).await.is_err());
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn removing_an_unknown_customer_is_an_error() {
        let store = InMemoryEstimateStore::new();

        assert!(store.remove_customer(CustomerId::generate()).await.is_err());
    }
}
