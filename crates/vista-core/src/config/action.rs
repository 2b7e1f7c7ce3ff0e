//! Action specs.
//!
//! An action resolves, per record, to exactly one `ActionEffect`: navigate,
//! run a mutation, or ask for a dialog to be opened. Most actions are fully
//! declarative (`ActionTarget::Navigate`, `Mutate`, `OpenDialog`); a custom
//! handler can compute the effect when the declarative forms are not enough.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::ActionError;
use crate::record::{display_value, Record};

/// Visibility predicate over a record.
pub type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Custom handler computing an action's effect.
pub type ActionHandler<R> = Arc<dyn Fn(&R) -> Result<ActionEffect, ActionError> + Send + Sync>;

/// Visual variant of an action button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionVariant {
    #[default]
    Default,
    Outline,
    Destructive,
    Ghost,
}

/// Payload asking the owner of a namespace to open a dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRequest {
    pub dialog_id: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl DialogRequest {
    pub fn new(dialog_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            entity_id: entity_id.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// What clicking an action does for a specific record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionEffect {
    /// Go to a path.
    Navigate { path: String },

    /// Run a mutation, then refresh the listed query keys.
    #[serde(rename_all = "camelCase")]
    Mutate {
        key: String,
        params: Value,
        #[serde(default)]
        invalidates: Vec<String>,
    },

    /// Publish a dialog request on the namespace's bus channel.
    OpenDialog {
        namespace: String,
        request: DialogRequest,
    },
}

/// How an action computes its effect.
pub enum ActionTarget<R> {
    /// Navigate to a path template such as `/candidates/{id}/edit`.
    Navigate { template: String },

    /// Call a mutation with `{ "id": <record id> }` merged over `params`.
    Mutate {
        key: String,
        params: Map<String, Value>,
        invalidates: Vec<String>,
    },

    /// Request a dialog on a bus namespace.
    OpenDialog { namespace: String, dialog_id: String },

    /// Compute the effect with a handler.
    Custom(ActionHandler<R>),
}

impl<R> Clone for ActionTarget<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Navigate { template } => Self::Navigate {
                template: template.clone(),
            },
            Self::Mutate {
                key,
                params,
                invalidates,
            } => Self::Mutate {
                key: key.clone(),
                params: params.clone(),
                invalidates: invalidates.clone(),
            },
            Self::OpenDialog {
                namespace,
                dialog_id,
            } => Self::OpenDialog {
                namespace: namespace.clone(),
                dialog_id: dialog_id.clone(),
            },
            Self::Custom(handler) => Self::Custom(handler.clone()),
        }
    }
}

impl<R> fmt::Debug for ActionTarget<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { template } => f.debug_struct("Navigate").field("template", template).finish(),
            Self::Mutate { key, invalidates, .. } => f
                .debug_struct("Mutate")
                .field("key", key)
                .field("invalidates", invalidates)
                .finish(),
            Self::OpenDialog {
                namespace,
                dialog_id,
            } => f
                .debug_struct("OpenDialog")
                .field("namespace", namespace)
                .field("dialog_id", dialog_id)
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A quick action or menu action.
pub struct ActionSpec<R> {
    /// Unique identifier within its list.
    pub id: String,

    /// Display text.
    pub label: String,

    pub icon: Option<String>,

    pub variant: ActionVariant,

    target: ActionTarget<R>,

    visible: Option<Predicate<R>>,
}

impl<R: Record> ActionSpec<R> {
    fn new(id: impl Into<String>, label: impl Into<String>, target: ActionTarget<R>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            variant: ActionVariant::Default,
            target,
            visible: None,
        }
    }

    /// An action that navigates to a path template.
    pub fn navigate(id: impl Into<String>, label: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(
            id,
            label,
            ActionTarget::Navigate {
                template: template.into(),
            },
        )
    }

    /// An action that runs a mutation keyed by `key`.
    pub fn mutate(id: impl Into<String>, label: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(
            id,
            label,
            ActionTarget::Mutate {
                key: key.into(),
                params: Map::new(),
                invalidates: Vec::new(),
            },
        )
    }

    /// An action that asks the namespace owner to open a dialog.
    pub fn open_dialog(
        id: impl Into<String>,
        label: impl Into<String>,
        namespace: impl Into<String>,
        dialog_id: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            label,
            ActionTarget::OpenDialog {
                namespace: namespace.into(),
                dialog_id: dialog_id.into(),
            },
        )
    }

    /// An action whose effect is computed by a handler.
    pub fn custom<F>(id: impl Into<String>, label: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&R) -> Result<ActionEffect, ActionError> + Send + Sync + 'static,
    {
        Self::new(id, label, ActionTarget::Custom(Arc::new(handler)))
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Extra static params for a mutate action. Ignored by other targets.
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        if let ActionTarget::Mutate { params, .. } = &mut self.target {
            params.insert(name.into(), value);
        }
        self
    }

    /// Query keys to refresh after a mutate action succeeds.
    pub fn invalidating(mut self, keys: &[&str]) -> Self {
        if let ActionTarget::Mutate { invalidates, .. } = &mut self.target {
            invalidates.extend(keys.iter().map(|k| k.to_string()));
        }
        self
    }

    /// Only show the action when `predicate` holds.
    pub fn visible_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.visible = Some(Arc::new(predicate));
        self
    }

    /// Only show the action when the record's status is one of `statuses`.
    pub fn visible_for_statuses(self, statuses: &[&str]) -> Self {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        self.visible_when(move |record| {
            record
                .status()
                .is_some_and(|status| statuses.iter().any(|s| s == status))
        })
    }

    pub fn target(&self) -> &ActionTarget<R> {
        &self.target
    }

    /// Whether the action is shown for `record`. No predicate means always.
    pub fn is_visible(&self, record: &R) -> bool {
        match &self.visible {
            Some(predicate) => predicate(record),
            None => true,
        }
    }

    /// Compute the effect of clicking this action on `record`.
    pub fn resolve(&self, record: &R) -> Result<ActionEffect, ActionError> {
        match &self.target {
            ActionTarget::Navigate { template } => Ok(ActionEffect::Navigate {
                path: expand_path(template, record),
            }),
            ActionTarget::Mutate {
                key,
                params,
                invalidates,
            } => {
                let mut params = params.clone();
                params.insert("id".to_string(), json!(record.id()));
                Ok(ActionEffect::Mutate {
                    key: key.clone(),
                    params: Value::Object(params),
                    invalidates: invalidates.clone(),
                })
            }
            ActionTarget::OpenDialog {
                namespace,
                dialog_id,
            } => Ok(ActionEffect::OpenDialog {
                namespace: namespace.clone(),
                request: DialogRequest::new(dialog_id.clone(), record.id()),
            }),
            ActionTarget::Custom(handler) => handler(record),
        }
    }
}

impl<R> Clone for ActionSpec<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            icon: self.icon.clone(),
            variant: self.variant,
            target: self.target.clone(),
            visible: self.visible.clone(),
        }
    }
}

impl<R> fmt::Debug for ActionSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("variant", &self.variant)
            .field("target", &self.target)
            .field("has_is_visible", &self.visible.is_some())
            .finish()
    }
}

/// An entry in an action dropdown.
pub enum MenuEntry<R> {
    Action(ActionSpec<R>),
    Separator,
}

impl<R> MenuEntry<R> {
    pub fn action(&self) -> Option<&ActionSpec<R>> {
        match self {
            Self::Action(action) => Some(action),
            Self::Separator => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}

impl<R> From<ActionSpec<R>> for MenuEntry<R> {
    fn from(action: ActionSpec<R>) -> Self {
        Self::Action(action)
    }
}

impl<R> fmt::Debug for MenuEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => action.fmt(f),
            Self::Separator => f.write_str("Separator"),
        }
    }
}

/// Substitute `{field}` placeholders in a path template.
///
/// `{id}` is the record id; any other name is looked up as a field. Unknown
/// fields expand to an empty string and unterminated braces are kept as-is.
pub fn expand_path<R: Record>(template: &str, record: &R) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if name == "id" {
                    out.push_str(record.id());
                } else if let Some(value) = record.field(name) {
                    match value {
                        Value::String(s) => out.push_str(&s),
                        Value::Null => {}
                        other => out.push_str(&display_value(&other)),
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::JsonRecord;

    fn candidate(status: &str) -> JsonRecord {
        JsonRecord::from_value(json!({ "id": "c7", "status": status, "job_id": "j2" })).unwrap()
    }

    #[test]
    fn test_expand_path() {
        let record = candidate("active");
        assert_eq!(expand_path("/candidates/{id}/edit", &record), "/candidates/c7/edit");
        assert_eq!(expand_path("/jobs/{job_id}/c/{id}", &record), "/jobs/j2/c/c7");
        assert_eq!(expand_path("/x/{missing}/y", &record), "/x//y");
        assert_eq!(expand_path("/open/{id", &record), "/open/{id");
    }

    #[test]
    fn test_visibility_defaults_to_true() {
        let action = ActionSpec::<JsonRecord>::navigate("edit", "Edit", "/c/{id}/edit");
        assert!(action.is_visible(&candidate("anything")));
    }

    #[test]
    fn test_visible_for_statuses() {
        let action = ActionSpec::<JsonRecord>::open_dialog("submit", "Submit", "candidate", "submitToJob")
            .visible_for_statuses(&["active", "bench"]);
        assert!(action.is_visible(&candidate("active")));
        assert!(action.is_visible(&candidate("bench")));
        assert!(!action.is_visible(&candidate("inactive")));
    }

    #[test]
    fn test_resolve_mutate_merges_id() {
        let action = ActionSpec::<JsonRecord>::mutate("hotlist", "Add to Hotlist", "candidates.addToHotlist")
            .with_param("notes", json!("from list"))
            .invalidating(&["candidates.list"]);

        let effect = action.resolve(&candidate("active")).unwrap();
        assert_eq!(
            effect,
            ActionEffect::Mutate {
                key: "candidates.addToHotlist".to_string(),
                params: json!({ "id": "c7", "notes": "from list" }),
                invalidates: vec!["candidates.list".to_string()],
            }
        );
    }

    #[test]
    fn test_resolve_open_dialog() {
        let action = ActionSpec::<JsonRecord>::open_dialog("resume", "View Resume", "candidate", "viewResume");
        let effect = action.resolve(&candidate("active")).unwrap();
        assert_eq!(
            effect,
            ActionEffect::OpenDialog {
                namespace: "candidate".to_string(),
                request: DialogRequest::new("viewResume", "c7"),
            }
        );
    }

    #[test]
    fn test_dialog_request_wire_format() {
        let request = DialogRequest::new("submitToJob", "c7");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "dialogId": "submitToJob", "entityId": "c7" })
        );
    }
}
