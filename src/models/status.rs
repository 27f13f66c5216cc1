use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Terminal state of one preparation run. Dispatch has no terminal failure
/// state: a trigger that fails all retries inside its own catch ends in
/// `TriggerFailedAnnotated`, which still completes the segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PreparationOutcome {
    TriggerDispatched,
    TriggerFailedAnnotated { reason: String },
}

/// Result of the dispatch step itself, surfaced as a typed value so a
/// swallowed queue fault never trips the coordinator's retry policy.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Dispatched,
    FailureAnnotated(String),
}

impl Display for PreparationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            PreparationOutcome::TriggerDispatched => write!(f, "trigger_dispatched"),
            PreparationOutcome::TriggerFailedAnnotated { .. } => {
                write!(f, "trigger_failed_annotated")
            }
        }
    }
}
