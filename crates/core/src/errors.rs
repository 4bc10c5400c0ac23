use thiserror::Error;

use crate::submission::SubmissionError;
use crate::validation::FieldIssue;
use crate::wizard::WizardTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    WizardTransition(#[from] WizardTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("input validation failed with {} issue(s)", .0.len())]
    Validation(Vec<FieldIssue>),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("payload assembly failure: {0}")]
    Assembly(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, issues: Vec<FieldIssue>, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<SubmissionError> for ApplicationError {
    fn from(value: SubmissionError) -> Self {
        match value {
            SubmissionError::Validation { issues } => Self::Validation(issues),
            SubmissionError::Persistence(error) => Self::Persistence(error.to_string()),
            SubmissionError::Assembly(message) => Self::Assembly(message),
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Validation(issues) => Self::BadRequest {
                message: "input validation failed".to_owned(),
                issues,
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(DomainError::WizardTransition(
                WizardTransitionError::StepGate { issues, .. },
            )) => Self::BadRequest {
                message: "step validation failed".to_owned(),
                issues,
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(_) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                issues: Vec::new(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Assembly(message) | ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
