use chrono::Utc;
use serde_json::Value;
use sqlx::Row;

use farmquote_core::domain::customer::CustomerId;
use farmquote_core::domain::estimate::{
    Estimate, EstimateId, EstimateRecord, EstimateStatus, NewEstimate,
};

use super::customer::{parse_timestamp, parse_uuid};
use super::{EstimateRepository, RepositoryError};
use crate::DbPool;

const SELECT_COLUMNS: &str =
    "SELECT id, customer_id, form_json, raw_input_json, status, created_at FROM estimates";

pub struct SqlEstimateRepository {
    pool: DbPool,
}

impl SqlEstimateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn encode(value: &Value) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Encode(e.to_string()))
}

fn row_to_estimate(row: &sqlx::sqlite::SqliteRow) -> Result<Estimate, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_id: String =
        row.try_get("customer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let form_json: String =
        row.try_get("form_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let raw_input_json: String =
        row.try_get("raw_input_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let record: EstimateRecord = serde_json::from_str(&form_json)
        .map_err(|e| RepositoryError::Decode(format!("form_json: {e}")))?;
    let raw_input: Value = serde_json::from_str(&raw_input_json)
        .map_err(|e| RepositoryError::Decode(format!("raw_input_json: {e}")))?;
    let status =
        EstimateStatus::parse(&status_str).map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Estimate {
        id: EstimateId(parse_uuid("estimate id", &id)?),
        customer_id: CustomerId(parse_uuid("customer id", &customer_id)?),
        record,
        raw_input,
        status,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

#[async_trait::async_trait]
impl EstimateRepository for SqlEstimateRepository {
    async fn insert(&self, estimate: NewEstimate) -> Result<Estimate, RepositoryError> {
        let estimate = Estimate::from_new(EstimateId::generate(), estimate, Utc::now());

        let form = estimate.record.to_json().map_err(|e| RepositoryError::Encode(e.to_string()))?;
        let [customer, space, crops, system, operation] = estimate
            .record
            .section_json()
            .map_err(|e| RepositoryError::Encode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO estimates (id, customer_id, form_json, raw_input_json, customer_json,
                                    space_json, crops_json, system_json, operation_json,
                                    status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(estimate.id.to_string())
        .bind(estimate.customer_id.to_string())
        .bind(encode(&form)?)
        .bind(encode(&estimate.raw_input)?)
        .bind(encode(&customer.1)?)
        .bind(encode(&space.1)?)
        .bind(encode(&crops.1)?)
        .bind(encode(&system.1)?)
        .bind(encode(&operation.1)?)
        .bind(estimate.status.as_str())
        .bind(estimate.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(estimate)
    }

    async fn find_by_id(&self, id: &EstimateId) -> Result<Option<Estimate>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_estimate(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Estimate>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query(&format!("{SELECT_COLUMNS} WHERE customer_id = ? ORDER BY created_at ASC"))
                .bind(customer_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_estimate).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use sqlx::Row;

    use farmquote_core::domain::customer::CustomerId;
    use farmquote_core::domain::estimate::{EstimateId, EstimateStatus, NewEstimate};

    use super::SqlEstimateRepository;
    use crate::repositories::test_support::{migrated_pool, new_customer, raw_input, record};
    use crate::repositories::{CustomerRepository, EstimateRepository, SqlCustomerRepository};

    #[tokio::test]
    async fn insert_writes_every_section_column() {
        let pool = migrated_pool().await;
        let customer = SqlCustomerRepository::new(pool.clone())
            .insert(new_customer())
            .await
            .expect("insert customer");
        let repo = SqlEstimateRepository::new(pool.clone());

        let estimate = repo
            .insert(NewEstimate::submitted(customer.id, record(), raw_input()))
            .await
            .expect("insert estimate");

        let row = sqlx::query(
            "SELECT system_json, operation_json, raw_input_json, status FROM estimates WHERE id = ?",
        )
        .bind(estimate.id.to_string())
        .fetch_one(&pool)
        .await
        .expect("load row");

        let system: Value =
            serde_json::from_str(&row.get::<String, _>("system_json")).expect("system json");
        let operation: Value =
            serde_json::from_str(&row.get::<String, _>("operation_json")).expect("operation json");
        let raw: Value =
            serde_json::from_str(&row.get::<String, _>("raw_input_json")).expect("raw json");

        assert_eq!(system["systemType"], json!("moving_rack_4tier"));
        assert!(system.get("fixedRackTiers").is_none());
        assert_eq!(operation["staffCount"], json!(2.0));
        assert_eq!(raw["system"]["fixedRackTiers"], json!(4));
        assert_eq!(row.get::<String, _>("status"), "submitted");
    }

    #[tokio::test]
    async fn find_by_id_decodes_the_typed_record() {
        let pool = migrated_pool().await;
        let customer = SqlCustomerRepository::new(pool.clone())
            .insert(new_customer())
            .await
            .expect("insert customer");
        let repo = SqlEstimateRepository::new(pool);

        let inserted = repo
            .insert(NewEstimate::submitted(customer.id, record(), raw_input()))
            .await
            .expect("insert estimate");
        let loaded = repo.find_by_id(&inserted.id).await.expect("find").expect("estimate exists");

        assert_eq!(loaded.record, record());
        assert_eq!(loaded.customer_id, customer.id);
        assert_eq!(loaded.status, EstimateStatus::Submitted);
        assert_eq!(loaded.raw_input, raw_input());
    }

    #[tokio::test]
    async fn insert_for_unknown_customer_is_rejected() {
        let repo = SqlEstimateRepository::new(migrated_pool().await);

        let result =
            repo.insert(NewEstimate::submitted(CustomerId::generate(), record(), raw_input())).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_for_customer_returns_only_their_estimates() {
        let pool = migrated_pool().await;
        let customers = SqlCustomerRepository::new(pool.clone());
        let first = customers.insert(new_customer()).await.expect("insert first");
        let second = customers.insert(new_customer()).await.expect("insert second");
        let repo = SqlEstimateRepository::new(pool);

        for _ in 0..2 {
            repo.insert(NewEstimate::submitted(first.id, record(), raw_input()))
                .await
                .expect("insert estimate");
        }
        repo.insert(NewEstimate::submitted(second.id, record(), raw_input()))
            .await
            .expect("insert estimate");

        let listed = repo.list_for_customer(&first.id).await.expect("list");

        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|estimate| estimate.customer_id == first.id));
        assert!(repo.find_by_id(&EstimateId::generate()).await.expect("find").is_none());
    }
}
