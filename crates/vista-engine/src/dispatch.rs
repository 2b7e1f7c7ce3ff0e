//! Action visibility and dispatch.
//!
//! ## Effect-based execution
//!
//! Clicking an action first resolves it to a single `ActionEffect` for the
//! record, then the dispatcher applies that effect:
//!
//! - `Navigate` - hands the path to the host's `Navigator`
//! - `Mutate` - runs the mutation through the `QueryBinder`
//! - `OpenDialog` - publishes on the `DialogBus`
//!
//! The dispatcher never tracks dialog state; whoever subscribes to the bus
//! owns that. Handler errors and panics are caught here and reported as
//! `ActionOutcome::Failed` plus a broadcast on the failure channel.

use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::broadcast;

use vista_core::config::{ActionEffect, ActionSpec, MenuEntry};
use vista_core::{ActionError, Record};

use crate::bus::{DialogBus, Delivery};
use crate::query::QueryBinder;
use crate::source::Navigator;

const FAILURE_CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// Visibility
// =============================================================================

/// Actions visible for `record`, in declaration order.
pub fn visible_actions<'a, R: Record>(actions: &'a [ActionSpec<R>], record: &R) -> Vec<&'a ActionSpec<R>> {
    actions.iter().filter(|action| action.is_visible(record)).collect()
}

/// Menu entries visible for `record`.
///
/// Separators never lead, trail or follow another separator once hidden
/// actions are removed.
pub fn visible_menu<'a, R: Record>(entries: &'a [MenuEntry<R>], record: &R) -> Vec<&'a MenuEntry<R>> {
    let mut visible: Vec<&MenuEntry<R>> = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            MenuEntry::Action(action) if action.is_visible(record) => visible.push(entry),
            MenuEntry::Action(_) => {}
            MenuEntry::Separator => {
                let after_action = visible.last().is_some_and(|last| !last.is_separator());
                if after_action {
                    visible.push(entry);
                }
            }
        }
    }

    if visible.last().is_some_and(|last| last.is_separator()) {
        visible.pop();
    }
    visible
}

// =============================================================================
// Dispatcher
// =============================================================================

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Navigated { path: String },
    Mutated { key: String, result: Value },
    DialogRequested { namespace: String, delivery: Delivery },
    /// The action is not visible for the record; nothing ran.
    Hidden,
    Failed(ActionError),
}

/// Generic "action failed" signal.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFailure {
    pub action_id: String,
    pub entity_id: String,
    pub error: ActionError,
}

/// Applies action effects to the navigator, the binder or the bus.
pub struct ActionDispatcher {
    binder: Arc<QueryBinder>,
    bus: DialogBus,
    navigator: Arc<dyn Navigator>,
    failures: broadcast::Sender<ActionFailure>,
}

impl ActionDispatcher {
    pub fn new(binder: Arc<QueryBinder>, bus: DialogBus, navigator: Arc<dyn Navigator>) -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);
        Self {
            binder,
            bus,
            navigator,
            failures,
        }
    }

    pub fn bus(&self) -> &DialogBus {
        &self.bus
    }

    pub fn binder(&self) -> &Arc<QueryBinder> {
        &self.binder
    }

    /// Subscribe to action failures.
    pub fn failures(&self) -> broadcast::Receiver<ActionFailure> {
        self.failures.subscribe()
    }

    /// Run `action` for `record`.
    ///
    /// Applies exactly one effect. Never panics and never returns an error to
    /// the caller; failures come back as `ActionOutcome::Failed`.
    pub async fn dispatch<R: Record>(&self, action: &ActionSpec<R>, record: &R) -> ActionOutcome {
        if !action.is_visible(record) {
            tracing::debug!("Action '{}' is hidden for '{}'", action.id, record.id());
            return ActionOutcome::Hidden;
        }

        let effect = match contain(|| action.resolve(record)).and_then(|resolved| resolved) {
            Ok(effect) => effect,
            Err(error) => return self.fail(action, record, error),
        };

        tracing::debug!("Action '{}' on '{}' resolved to {:?}", action.id, record.id(), effect);

        match self.apply(effect).await {
            Ok(outcome) => outcome,
            Err(error) => self.fail(action, record, error),
        }
    }

    /// Apply a resolved effect.
    ///
    /// Panics in the navigator or in dialog subscribers come back as
    /// `ActionError::Panicked`.
    pub async fn apply(&self, effect: ActionEffect) -> Result<ActionOutcome, ActionError> {
        match effect {
            ActionEffect::Navigate { path } => {
                contain(|| self.navigator.navigate(&path))?;
                Ok(ActionOutcome::Navigated { path })
            }
            ActionEffect::Mutate {
                key,
                params,
                invalidates,
            } => {
                let result = self.binder.mutate(&key, params, &invalidates).await?;
                Ok(ActionOutcome::Mutated { key, result })
            }
            ActionEffect::OpenDialog { namespace, request } => {
                let delivery = contain(|| self.bus.publish(&namespace, request))?;
                Ok(ActionOutcome::DialogRequested { namespace, delivery })
            }
        }
    }

    fn fail<R: Record>(&self, action: &ActionSpec<R>, record: &R, error: ActionError) -> ActionOutcome {
        tracing::error!("Action '{}' failed for '{}': {}", action.id, record.id(), error);
        // No receivers is fine.
        let _ = self.failures.send(ActionFailure {
            action_id: action.id.clone(),
            entity_id: record.id().to_string(),
            error: error.clone(),
        });
        ActionOutcome::Failed(error)
    }
}

/// Run `f`, turning a panic into `ActionError::Panicked`.
fn contain<T>(f: impl FnOnce() -> T) -> Result<T, ActionError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| ActionError::Panicked(panic_message(payload)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
