use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::estimate::SubmissionReceipt;
use crate::record::FormRecord;
use crate::schema::catalog::{default_record, FormDefinition};
use crate::schema::field::SchemaError;
use crate::steps::{fields_owned_by, StepId};
use crate::submission::{EstimateStore, SubmissionError, SubmissionPipeline};
use crate::summary::{review_summary, ReviewSummary};
use crate::validation::FieldIssue;
use crate::visibility::{active_fields, ActiveFields};
use crate::wizard::states::{
    TransitionOutcome, WizardEvent, WizardEventKind, WizardPhase, WizardState,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("step `{}` is blocked by {} field issue(s)", .step.code(), .issues.len())]
    StepGate { step: StepId, issues: Vec<FieldIssue> },
    #[error("`{}` is not allowed from step `{}`", .event.as_str(), .step.code())]
    InvalidTransition { step: StepId, event: WizardEventKind },
    #[error("a submission is already in flight for this session")]
    SubmissionInFlight,
    #[error("this session has already been submitted")]
    SessionClosed,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl WizardTransitionError {
    /// Per-field issues carried by the error, if any.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::StepGate { issues, .. }
            | Self::Submission(SubmissionError::Validation { issues }) => issues.as_slice(),
            _ => &[],
        }
    }
}

/// Drives a [`WizardState`] through the fixed step sequence.
///
/// Transitions that fail leave the state exactly as it was.
#[derive(Clone, Debug)]
pub struct WizardEngine {
    form: Arc<FormDefinition>,
}

impl WizardEngine {
    pub fn new(form: Arc<FormDefinition>) -> Self {
        Self { form }
    }

    pub fn standard() -> Result<Self, SchemaError> {
        Ok(Self::new(Arc::new(FormDefinition::standard()?)))
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    /// Fresh session on the first step, seeded with the default record.
    pub fn start(&self) -> WizardState {
        WizardState::new(default_record())
    }

    pub fn active_fields(&self, record: &FormRecord) -> ActiveFields {
        active_fields(self.form.schema(), self.form.rules(), record)
    }

    /// Issues that would block leaving `step` with the given record.
    pub fn step_issues(&self, record: &FormRecord, step: StepId) -> Vec<FieldIssue> {
        let active = self.active_fields(record);
        let gated: ActiveFields =
            fields_owned_by(step).iter().copied().filter(|path| active.contains(path)).collect();
        self.form.schema().validate_record(record, &gated)
    }

    pub fn apply(
        &self,
        state: &mut WizardState,
        event: WizardEvent,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        ensure_open(state)?;

        let from = state.current;
        let kind = event.kind();
        let to = match event {
            WizardEvent::Edit { path, value } => {
                state.record.set(&path, value);
                state.touched.insert(path);
                from
            }
            WizardEvent::Advance => {
                let Some(next) = from.next() else {
                    return Err(WizardTransitionError::InvalidTransition { step: from, event: kind });
                };
                let issues = self.step_issues(&state.record, from);
                if !issues.is_empty() {
                    return Err(WizardTransitionError::StepGate { step: from, issues });
                }
                next
            }
            // Going back never validates. On the first step it is a no-op.
            WizardEvent::Retreat => from.previous().unwrap_or(from),
        };

        state.current = to;
        Ok(TransitionOutcome { from, to, event: kind })
    }

    pub fn edit(
        &self,
        state: &mut WizardState,
        path: &str,
        value: Value,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        self.apply(state, WizardEvent::edit(path, value))
    }

    pub fn advance(&self, state: &mut WizardState) -> Result<TransitionOutcome, WizardTransitionError> {
        self.apply(state, WizardEvent::Advance)
    }

    pub fn retreat(&self, state: &mut WizardState) -> Result<TransitionOutcome, WizardTransitionError> {
        self.apply(state, WizardEvent::Retreat)
    }

    pub fn apply_with_audit<S>(
        &self,
        state: &mut WizardState,
        event: WizardEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink,
    {
        let step = state.current;
        let edited_path = match &event {
            WizardEvent::Edit { path, .. } => Some(path.clone()),
            _ => None,
        };
        let kind = event.kind();

        let result = self.apply(state, event);
        let audit_event = match &result {
            Ok(outcome) => AuditEvent::new(
                audit,
                "wizard.transition_applied",
                AuditCategory::Wizard,
                AuditOutcome::Success,
            )
            .with_metadata("from", outcome.from.code())
            .with_metadata("to", outcome.to.code())
            .with_metadata("event", kind.as_str()),
            Err(error) => AuditEvent::new(
                audit,
                "wizard.transition_rejected",
                AuditCategory::Wizard,
                AuditOutcome::Rejected,
            )
            .with_metadata("step", step.code())
            .with_metadata("event", kind.as_str())
            .with_metadata("error", error.to_string()),
        };
        let audit_event = match edited_path {
            Some(path) => audit_event.with_metadata("path", path),
            None => audit_event,
        };
        sink.emit(audit_event);

        result
    }

    /// Marks the session as submitting. Only allowed from the review step.
    pub fn begin_submission(&self, state: &mut WizardState) -> Result<(), WizardTransitionError> {
        ensure_open(state)?;
        if !state.current.is_terminal() {
            return Err(WizardTransitionError::InvalidTransition {
                step: state.current,
                event: WizardEventKind::Submit,
            });
        }
        state.phase = WizardPhase::Submitting;
        Ok(())
    }

    /// Settles an in-flight submission. Failures reopen the session with the
    /// record untouched; success closes it.
    pub fn finish_submission(
        &self,
        state: &mut WizardState,
        result: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmissionReceipt, WizardTransitionError> {
        match result {
            Ok(receipt) => {
                state.phase = WizardPhase::Submitted;
                Ok(receipt)
            }
            Err(error) => {
                if let SubmissionError::Validation { issues } = &error {
                    warn!(
                        event_name = "wizard.submission.stale_validation",
                        issue_count = issues.len(),
                        "full-schema validation failed after every step gate passed"
                    );
                }
                state.phase = WizardPhase::Editing;
                Err(error.into())
            }
        }
    }

    pub async fn submit<S>(
        &self,
        state: &mut WizardState,
        pipeline: &SubmissionPipeline<S>,
    ) -> Result<SubmissionReceipt, WizardTransitionError>
    where
        S: EstimateStore,
    {
        self.begin_submission(state)?;
        let result = pipeline.submit(&state.record).await;
        self.finish_submission(state, result)
    }

    /// [`Self::submit`] under the audit context's correlation id, recording the
    /// outcome to `sink`.
    pub async fn submit_with_audit<S, A>(
        &self,
        state: &mut WizardState,
        pipeline: &SubmissionPipeline<S>,
        sink: &A,
        audit: &AuditContext,
    ) -> Result<SubmissionReceipt, WizardTransitionError>
    where
        S: EstimateStore,
        A: AuditSink,
    {
        let step = state.current;
        let result = match self.begin_submission(state) {
            Ok(()) => {
                let submitted =
                    pipeline.submit_correlated(&state.record, &audit.correlation_id).await;
                self.finish_submission(state, submitted)
            }
            Err(error) => Err(error),
        };

        let audit_event = match &result {
            Ok(receipt) => AuditEvent::new(
                audit,
                "wizard.submission_completed",
                AuditCategory::Submission,
                AuditOutcome::Success,
            )
            .with_metadata("customer_id", receipt.customer_id.to_string())
            .with_metadata("estimate_id", receipt.estimate_id.to_string()),
            Err(WizardTransitionError::Submission(SubmissionError::Persistence(failure))) => {
                AuditEvent::new(
                    audit,
                    "wizard.submission_failed",
                    AuditCategory::Persistence,
                    AuditOutcome::Failed,
                )
                .with_metadata("stage", failure.stage.to_string())
                .with_metadata("customer_rolled_back", failure.customer_rolled_back.to_string())
            }
            Err(error) => AuditEvent::new(
                audit,
                "wizard.submission_rejected",
                AuditCategory::Submission,
                AuditOutcome::Rejected,
            )
            .with_metadata("step", step.code())
            .with_metadata("error", error.to_string()),
        };
        sink.emit(audit_event);

        result
    }

    pub fn summary(&self, state: &WizardState) -> ReviewSummary {
        review_summary(&self.form, &state.record)
    }
}

fn ensure_open(state: &WizardState) -> Result<(), WizardTransitionError> {
    match state.phase {
        WizardPhase::Editing => Ok(()),
        WizardPhase::Submitting => Err(WizardTransitionError::SubmissionInFlight),
        WizardPhase::Submitted => Err(WizardTransitionError::SessionClosed),
    }
}
