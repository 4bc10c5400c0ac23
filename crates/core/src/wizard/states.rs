use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::FormRecord;
use crate::steps::StepId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    Edit { path: String, value: Value },
    Advance,
    Retreat,
}

impl WizardEvent {
    pub fn edit(path: impl Into<String>, value: Value) -> Self {
        Self::Edit { path: path.into(), value }
    }

    pub fn kind(&self) -> WizardEventKind {
        match self {
            Self::Edit { .. } => WizardEventKind::Edit,
            Self::Advance => WizardEventKind::Advance,
            Self::Retreat => WizardEventKind::Retreat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEventKind {
    Edit,
    Advance,
    Retreat,
    Submit,
}

impl WizardEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::Submit => "submit",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    #[default]
    Editing,
    /// A submit is awaiting persistence; every mutation is refused.
    Submitting,
    /// Terminal. The session accepts no further transitions.
    Submitted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: StepId,
    pub to: StepId,
    pub event: WizardEventKind,
}

/// One user's in-progress session. Owned by a single caller and threaded
/// through every engine transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub(crate) current: StepId,
    pub(crate) record: FormRecord,
    pub(crate) touched: BTreeSet<String>,
    pub(crate) phase: WizardPhase,
}

impl WizardState {
    pub fn new(record: FormRecord) -> Self {
        Self {
            current: StepId::first(),
            record,
            touched: BTreeSet::new(),
            phase: WizardPhase::Editing,
        }
    }

    pub fn current(&self) -> StepId {
        self.current
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    pub fn is_touched(&self, path: &str) -> bool {
        self.touched.contains(path)
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }
}
