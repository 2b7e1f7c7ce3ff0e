//! Section & journey navigation for detail screens.

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use vista_core::config::{JourneyStep, SectionSpec};

// =============================================================================
// SectionNavigator
// =============================================================================

/// Tracks the active section of a detail screen.
///
/// Exactly one section is active. Selecting an id that is not declared is a
/// no-op; every accepted change is broadcast.
pub struct SectionNavigator {
    sections: Vec<SectionSpec>,
    current: RwLock<String>,
    tx: watch::Sender<String>,
    rx: watch::Receiver<String>,
}

impl SectionNavigator {
    /// Start on `default_section`, or the first section when it is not declared.
    pub fn new(sections: Vec<SectionSpec>, default_section: &str) -> Self {
        let initial = if sections.iter().any(|s| s.id == default_section) {
            default_section.to_string()
        } else {
            sections.first().map(|s| s.id.clone()).unwrap_or_default()
        };
        let (tx, rx) = watch::channel(initial.clone());
        Self {
            sections,
            current: RwLock::new(initial),
            tx,
            rx,
        }
    }

    pub fn current(&self) -> String {
        self.current.read().clone()
    }

    pub fn current_section(&self) -> Option<&SectionSpec> {
        let current = self.current.read();
        self.sections.iter().find(|s| s.id == *current)
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    /// Switch to section `id`. Returns `false` (and changes nothing) when the
    /// section is not declared.
    pub fn set_section(&self, id: &str) -> bool {
        if !self.sections.iter().any(|s| s.id == id) {
            tracing::debug!("Ignoring unknown section '{}'", id);
            return false;
        }

        {
            let mut current = self.current.write();
            if *current == id {
                return true;
            }
            *current = id.to_string();
        }
        tracing::debug!("Active section is now '{}'", id);
        self.tx.send_replace(id.to_string());
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

// =============================================================================
// Journey
// =============================================================================

/// Progress of one journey step for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

/// State of `step` for `status`: completed beats active beats pending.
pub fn step_state(step: &JourneyStep, status: &str) -> StepState {
    if step.is_completed_by(status) {
        StepState::Completed
    } else if step.is_active_for(status) {
        StepState::Active
    } else {
        StepState::Pending
    }
}

/// A journey step with its evaluated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyItem<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub state: StepState,
}

/// Evaluate every step independently. Overlapping step definitions can yield
/// more than one active step.
pub fn journey<'a>(steps: &'a [JourneyStep], status: &str) -> Vec<JourneyItem<'a>> {
    steps
        .iter()
        .map(|step| JourneyItem {
            id: &step.id,
            label: &step.label,
            state: step_state(step, status),
        })
        .collect()
}

/// Number of completed steps.
pub fn progress(steps: &[JourneyStep], status: &str) -> usize {
    steps
        .iter()
        .filter(|step| step_state(step, status) == StepState::Completed)
        .count()
}
