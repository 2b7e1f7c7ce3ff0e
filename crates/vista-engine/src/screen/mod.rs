//! Screen interpreters.
//!
//! A screen takes a configuration document and wires the engine together the
//! way a renderer consumes it: data through the query binder, filters through
//! the pipeline, badges through the status table, and clicks through the
//! action dispatcher. Screens produce plain, serializable view models and
//! never draw anything themselves.

mod detail;
mod list;

pub use detail::{DetailHeader, DetailScreen, JourneyView};
pub use list::{ListScreen, RenderedRow};

use serde::Serialize;

use vista_core::config::{ActionSpec, ActionVariant, MenuEntry};
use vista_core::Record;

use crate::dispatch::{visible_actions, visible_menu};

/// A rendered cell or labelled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub key: String,
    pub label: String,
    pub text: String,
}

/// An action button as the renderer draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub variant: ActionVariant,
}

impl<R> From<&ActionSpec<R>> for ActionButton {
    fn from(action: &ActionSpec<R>) -> Self {
        Self {
            id: action.id.clone(),
            label: action.label.clone(),
            icon: action.icon.clone(),
            variant: action.variant,
        }
    }
}

/// A dropdown entry as the renderer draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuItem {
    Action(ActionButton),
    Separator,
}

pub(crate) fn action_buttons<R: Record>(actions: &[ActionSpec<R>], record: &R) -> Vec<ActionButton> {
    visible_actions(actions, record)
        .into_iter()
        .map(ActionButton::from)
        .collect()
}

pub(crate) fn menu_items<R: Record>(entries: &[MenuEntry<R>], record: &R) -> Vec<MenuItem> {
    visible_menu(entries, record)
        .into_iter()
        .map(|entry| match entry {
            MenuEntry::Action(action) => MenuItem::Action(action.into()),
            MenuEntry::Separator => MenuItem::Separator,
        })
        .collect()
}
