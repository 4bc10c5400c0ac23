use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use farmquote_core::domain::customer::{Customer, CustomerId, NewCustomer};
use farmquote_core::schema::codes::{CodedEnum, CustomerType};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value)
        .map_err(|e| RepositoryError::Decode(format!("invalid {column} `{value}`: {e}")))
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_type_str: String =
        row.try_get("customer_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_type_other: Option<String> =
        row.try_get("customer_type_other").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: String = row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String = row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let customer_type = CustomerType::from_code(&customer_type_str).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown customer type `{customer_type_str}`"))
    })?;

    Ok(Customer {
        id: CustomerId(parse_uuid("customer id", &id)?),
        customer_type,
        customer_type_other,
        name,
        phone,
        email,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let customer = Customer::from_new(CustomerId::generate(), customer, Utc::now());

        sqlx::query(
            "INSERT INTO customers (id, customer_type, customer_type_other, name, phone, email, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(customer.id.to_string())
        .bind(customer.customer_type.code())
        .bind(&customer.customer_type_other)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, customer_type, customer_type_other, name, phone, email, created_at
             FROM customers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use farmquote_core::domain::customer::CustomerId;
    use farmquote_core::schema::codes::CustomerType;

    use super::SqlCustomerRepository;
    use crate::repositories::test_support::{migrated_pool, new_customer};
    use crate::repositories::CustomerRepository;

    #[tokio::test]
    async fn insert_then_find_returns_the_stored_customer() {
        let repo = SqlCustomerRepository::new(migrated_pool().await);

        let inserted = repo.insert(new_customer()).await.expect("insert customer");
        let loaded = repo.find_by_id(&inserted.id).await.expect("find").expect("customer exists");

        assert_eq!(loaded.id, inserted.id);
        assert_eq!(loaded.customer_type, CustomerType::Other);
        assert_eq!(loaded.customer_type_other.as_deref(), Some("Community garden"));
        assert_eq!(loaded.email, "minji@example.com");
        assert_eq!(loaded.created_at.timestamp(), inserted.created_at.timestamp());
    }

    #[tokio::test]
    async fn find_missing_customer_returns_none() {
        let repo = SqlCustomerRepository::new(migrated_pool().await);

        let loaded = repo.find_by_id(&CustomerId::generate()).await.expect("find");

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let repo = SqlCustomerRepository::new(migrated_pool().await);
        let inserted = repo.insert(new_customer()).await.expect("insert customer");

        assert!(repo.delete(&inserted.id).await.expect("delete"));
        assert!(!repo.delete(&inserted.id).await.expect("delete again"));
        assert!(repo.find_by_id(&inserted.id).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn unknown_customer_type_code_fails_to_decode() {
        let pool = migrated_pool().await;
        let id = CustomerId::generate();
        sqlx::query(
            "INSERT INTO customers (id, customer_type, name, phone, email, created_at)
             VALUES (?, 'farm', 'Lee', '010-0000-0000', 'lee@example.com', '2026-01-01T00:00:00+00:00')",
        )
        .bind(id.to_string())
        .execute(&pool)
        .await
        .expect("insert raw row");

        let repo = SqlCustomerRepository::new(pool);
        let error = repo.find_by_id(&id).await.expect_err("decode should fail");

        assert!(error.to_string().contains("unknown customer type"));
    }
}
