use async_trait::async_trait;
use thiserror::Error;

use farmquote_core::domain::customer::{Customer, CustomerId, NewCustomer};
use farmquote_core::domain::estimate::{Estimate, EstimateId, NewEstimate};
use farmquote_core::submission::StoreError;

pub mod customer;
pub mod estimate;
pub mod memory;
pub mod store;

pub use customer::SqlCustomerRepository;
pub use estimate::SqlEstimateRepository;
pub use memory::{FailurePoint, InMemoryEstimateStore};
pub use store::SqlEstimateStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::new(error.to_string())
    }
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait EstimateRepository: Send + Sync {
    async fn insert(&self, estimate: NewEstimate) -> Result<Estimate, RepositoryError>;
    async fn find_by_id(&self, id: &EstimateId) -> Result<Option<Estimate>, RepositoryError>;
    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Estimate>, RepositoryError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    use farmquote_core::domain::customer::NewCustomer;
    use farmquote_core::domain::estimate::EstimateRecord;
    use farmquote_core::schema::codes::CustomerType;

    use crate::{connect_with_settings, migrations, DbPool};

    pub async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    pub fn new_customer() -> NewCustomer {
        NewCustomer {
            customer_type: CustomerType::Other,
            customer_type_other: Some("Community garden".to_owned()),
            name: "Park Minji".to_owned(),
            phone: "010-2222-3333".to_owned(),
            email: "minji@example.com".to_owned(),
        }
    }

    pub fn raw_input() -> Value {
        json!({
            "customer": {
                "customerType": "other",
                "customerTypeOther": "Community garden",
                "name": "Park Minji",
                "phone": "010-2222-3333",
                "email": "minji@example.com"
            },
            "space": { "widthM": 6, "lengthM": 3, "heightM": 2.4 },
            "crops": { "selectedCrops": ["herb", "microgreen"], "primaryCrop": "herb" },
            "system": {
                "systemType": "moving_rack_4tier",
                "fixedRackTiers": 4,
                "hydroponicType": "aeroponic",
                "envControlIncluded": false
            },
            "operation": { "staffCount": 2, "monthlySalaryPerStaff": 250 }
        })
    }

    pub fn record() -> EstimateRecord {
        let mut canonical = raw_input();
        canonical["system"]
            .as_object_mut()
            .expect("system object")
            .remove("fixedRackTiers");
        EstimateRecord::from_canonical(canonical).expect("decode record")
    }
}
