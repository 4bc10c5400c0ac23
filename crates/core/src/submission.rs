use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::customer::{Customer, CustomerId, NewCustomer};
use crate::domain::estimate::{Estimate, EstimateRecord, NewEstimate, SubmissionReceipt};
use crate::record::FormRecord;
use crate::schema::catalog::{path, FormDefinition};
use crate::schema::codes::{ChillerMode, CodedEnum};
use crate::schema::field::FieldKind;
use crate::validation::FieldIssue;
use crate::visibility::{active_fields, prune_inactive};

const CHILLER: &str = "system.chiller";

/// Failure reported by a persistence collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The two dependent writes behind a submission, plus the compensating
/// delete used when the second one fails.
#[async_trait]
pub trait EstimateStore: Send + Sync {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    async fn insert_estimate(&self, estimate: NewEstimate) -> Result<Estimate, StoreError>;

    async fn remove_customer(&self, id: CustomerId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> EstimateStore for Arc<S>
where
    S: EstimateStore + ?Sized,
{
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        (**self).insert_customer(customer).await
    }

    async fn insert_estimate(&self, estimate: NewEstimate) -> Result<Estimate, StoreError> {
        (**self).insert_estimate(estimate).await
    }

    async fn remove_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        (**self).remove_customer(id).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceStage {
    Customer,
    Estimate,
}

impl fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => f.write_str("customer"),
            Self::Estimate => f.write_str("estimate"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{stage} write failed: {reason}")]
pub struct PersistenceError {
    pub stage: PersistenceStage,
    pub reason: String,
    /// Whether the customer row written ahead of a failed estimate write was
    /// removed again. Always false for customer-stage failures.
    pub customer_rolled_back: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission rejected with {} field issue(s)", .issues.len())]
    Validation { issues: Vec<FieldIssue> },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("validated record could not be assembled: {0}")]
    Assembly(String),
}

impl SubmissionError {
    /// Persistence failures can be retried with the same record.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Validated, canonicalised submission ready for the two writes.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedSubmission {
    pub customer: NewCustomer,
    pub record: EstimateRecord,
    pub raw_input: Value,
}

pub struct SubmissionPipeline<S> {
    form: Arc<FormDefinition>,
    store: S,
}

impl<S> SubmissionPipeline<S>
where
    S: EstimateStore,
{
    pub fn new(form: Arc<FormDefinition>, store: S) -> Self {
        Self { form, store }
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full-schema validation and canonical payload assembly, no I/O.
    pub fn prepare(&self, record: &FormRecord) -> Result<PreparedSubmission, SubmissionError> {
        let schema = self.form.schema();
        let active = active_fields(schema, self.form.rules(), record);
        let issues = schema.validate_record(record, &active);
        if !issues.is_empty() {
            return Err(SubmissionError::Validation { issues });
        }

        let mut canonical = prune_inactive(schema, &active, record);
        for field in schema.fields() {
            if let FieldKind::NumberChoice { .. } = field.kind {
                let integral = canonical.get(field.path).and_then(integral_choice);
                if let Some(value) = integral {
                    canonical.set(field.path, Value::from(value));
                }
            }
        }
        // A chiller without an explicit mode runs automatically.
        let chiller_requested = record.get(CHILLER).is_some_and(Value::is_object);
        if chiller_requested
            && active.contains(path::CHILLER_MODE)
            && !canonical.contains(path::CHILLER_MODE)
        {
            canonical.set(path::CHILLER_MODE, Value::from(ChillerMode::Auto.code()));
        }

        let record_typed = EstimateRecord::from_canonical(canonical.into_value())
            .map_err(|error| SubmissionError::Assembly(error.to_string()))?;
        Ok(PreparedSubmission {
            customer: NewCustomer::from(&record_typed.customer),
            record: record_typed,
            raw_input: record.to_value(),
        })
    }

    pub async fn submit(&self, record: &FormRecord) -> Result<SubmissionReceipt, SubmissionError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.submit_correlated(record, &correlation_id).await
    }

    pub async fn submit_correlated(
        &self,
        record: &FormRecord,
        correlation_id: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let prepared = match self.prepare(record) {
            Ok(prepared) => prepared,
            Err(error) => {
                if let SubmissionError::Validation { issues } = &error {
                    info!(
                        event_name = "estimate.submission.rejected",
                        correlation_id = %correlation_id,
                        issue_count = issues.len(),
                        "submission failed full-schema validation"
                    );
                }
                return Err(error);
            }
        };
        self.persist(prepared, correlation_id).await
    }

    /// Customer write, then the estimate write that references it. A failed
    /// estimate write removes the customer row again.
    pub async fn persist(
        &self,
        prepared: PreparedSubmission,
        correlation_id: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let PreparedSubmission { customer, record, raw_input } = prepared;

        let customer = self.store.insert_customer(customer).await.map_err(|error| {
            warn!(
                event_name = "estimate.submission.customer_failed",
                correlation_id = %correlation_id,
                error = %error,
                "customer write failed"
            );
            PersistenceError {
                stage: PersistenceStage::Customer,
                reason: error.to_string(),
                customer_rolled_back: false,
            }
        })?;

        let estimate = NewEstimate::submitted(customer.id, record, raw_input);
        let estimate = match self.store.insert_estimate(estimate).await {
            Ok(estimate) => estimate,
            Err(error) => {
                warn!(
                    event_name = "estimate.submission.estimate_failed",
                    correlation_id = %correlation_id,
                    customer_id = %customer.id,
                    error = %error,
                    "estimate write failed, removing customer"
                );
                let customer_rolled_back = self.compensate(customer.id, correlation_id).await;
                return Err(PersistenceError {
                    stage: PersistenceStage::Estimate,
                    reason: error.to_string(),
                    customer_rolled_back,
                }
                .into());
            }
        };

        info!(
            event_name = "estimate.submission.persisted",
            correlation_id = %correlation_id,
            customer_id = %customer.id,
            estimate_id = %estimate.id,
            "estimate submitted"
        );
        Ok(SubmissionReceipt { customer_id: customer.id, estimate_id: estimate.id })
    }

    async fn compensate(&self, customer_id: CustomerId, correlation_id: &str) -> bool {
        match self.store.remove_customer(customer_id).await {
            Ok(()) => true,
            Err(error) => {
                error!(
                    event_name = "estimate.submission.compensation_failed",
                    correlation_id = %correlation_id,
                    customer_id = %customer_id,
                    error = %error,
                    "orphaned customer row left behind"
                );
                false
            }
        }
    }
}

fn integral_choice(value: &Value) -> Option<i64> {
    let number = value.as_f64()?;
    (number.fract() == 0.0).then_some(number as i64)
}
