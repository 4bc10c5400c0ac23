pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod record;
pub mod schema;
pub mod steps;
pub mod submission;
pub mod summary;
pub mod validation;
pub mod visibility;
pub mod wizard;

pub use domain::customer::{Customer, CustomerId, NewCustomer};
pub use domain::estimate::{Estimate, EstimateId, EstimateRecord, EstimateStatus, NewEstimate, SubmissionReceipt};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use record::FormRecord;
pub use schema::{FieldSchema, FormDefinition};
pub use steps::StepId;
pub use submission::{
    EstimateStore, PersistenceError, PersistenceStage, StoreError, SubmissionError,
    SubmissionPipeline,
};
pub use summary::{review_summary, ReviewSummary};
pub use validation::{FieldIssue, IssueCode};
pub use visibility::{active_fields, ActiveFields};
pub use wizard::{WizardEngine, WizardEvent, WizardPhase, WizardState, WizardTransitionError};
