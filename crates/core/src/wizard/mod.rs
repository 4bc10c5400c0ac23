pub mod engine;
pub mod states;

pub use engine::{WizardEngine, WizardTransitionError};
pub use states::{TransitionOutcome, WizardEvent, WizardEventKind, WizardPhase, WizardState};
