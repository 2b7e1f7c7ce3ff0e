//! Column, field and metric specs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::record::{display_value, Record};

/// Custom renderer: `render(value, record) -> display string`.
pub type RenderFn<R> = Arc<dyn Fn(&Value, &R) -> String + Send + Sync>;

/// Computes a value from a record.
pub type ValueFn<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;

/// Formats a computed value.
pub type FormatFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Status,
    Boolean,
}

/// Horizontal alignment of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A column in a list view, or a field in a detail header.
pub struct ColumnSpec<R> {
    /// Field key on the record.
    pub key: String,

    /// Header text.
    pub label: String,

    pub column_type: ColumnType,

    pub icon: Option<String>,

    /// Whether the list can be sorted by this column.
    pub sortable: bool,

    pub align: Align,

    render: Option<RenderFn<R>>,
}

impl<R: Record> ColumnSpec<R> {
    /// Create a plain text column.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type: ColumnType::Text,
            icon: None,
            sortable: false,
            align: Align::Left,
            render: None,
        }
    }

    pub fn of_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Render the cell with a custom function instead of the raw value.
    ///
    /// Columns with a renderer may use a key the record does not have
    /// (computed columns such as a full name).
    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &R) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.render.is_some()
    }

    /// Raw value of the column's field.
    pub fn value(&self, record: &R) -> Value {
        record.field(&self.key).unwrap_or(Value::Null)
    }

    /// Display text for the cell.
    pub fn display(&self, record: &R) -> String {
        let value = self.value(record);
        match &self.render {
            Some(render) => render(&value, record),
            None => display_value(&value),
        }
    }
}

impl<R> Clone for ColumnSpec<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            label: self.label.clone(),
            column_type: self.column_type,
            icon: self.icon.clone(),
            sortable: self.sortable,
            align: self.align,
            render: self.render.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("column_type", &self.column_type)
            .field("sortable", &self.sortable)
            .field("has_render", &self.render.is_some())
            .finish()
    }
}

/// A headline metric on a detail view.
pub struct MetricSpec<R> {
    pub key: String,
    pub label: String,
    pub icon: Option<String>,
    pub tooltip: Option<String>,
    get_value: ValueFn<R>,
    format: Option<FormatFn>,
}

impl<R: Record> MetricSpec<R> {
    /// Create a metric computed from the record.
    pub fn new<F>(key: impl Into<String>, label: impl Into<String>, get_value: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            label: label.into(),
            icon: None,
            tooltip: None,
            get_value: Arc::new(get_value),
            format: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn format<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.format = Some(Arc::new(f));
        self
    }

    pub fn value(&self, record: &R) -> Value {
        (self.get_value)(record)
    }

    pub fn display(&self, record: &R) -> String {
        let value = self.value(record);
        match &self.format {
            Some(format) => format(&value),
            None => display_value(&value),
        }
    }
}

impl<R> fmt::Debug for MetricSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("has_format", &self.format.is_some())
            .finish()
    }
}
