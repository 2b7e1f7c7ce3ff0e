//! Status to column mapping.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use vista_core::ConfigError;

/// A board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Maps statuses onto columns and columns back onto statuses.
///
/// `status_to_column` is total: statuses no column claims land in the fallback
/// column. `column_to_status` returns each column's drop status (the first
/// status it claims), so several statuses sharing a column collapse into one.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    columns: Vec<BoardColumn>,
    status_to_column: HashMap<String, String>,
    column_to_status: HashMap<String, String>,
    fallback: String,
    hidden: HashSet<String>,
}

impl ColumnMapping {
    pub fn builder() -> ColumnMappingBuilder {
        ColumnMappingBuilder::default()
    }

    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Column a status belongs to.
    pub fn status_to_column(&self, status: &str) -> &str {
        self.status_to_column
            .get(status)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    /// Status a record takes when dropped on `column`.
    pub fn column_to_status(&self, column: &str) -> Option<&str> {
        self.column_to_status.get(column).map(String::as_str)
    }

    /// Statuses that keep a record off the board.
    pub fn is_hidden(&self, status: &str) -> bool {
        self.hidden.contains(status)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

#[derive(Debug, Default)]
pub struct ColumnMappingBuilder {
    columns: Vec<(BoardColumn, Vec<String>)>,
    fallback: Option<String>,
    hidden: Vec<String>,
}

impl ColumnMappingBuilder {
    /// Add a column claiming `statuses`. The first status is its drop status.
    pub fn column(mut self, id: impl Into<String>, title: impl Into<String>, statuses: &[&str]) -> Self {
        self.columns.push((
            BoardColumn {
                id: id.into(),
                title: title.into(),
                color: None,
            },
            statuses.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Color of the most recently added column.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        if let Some((column, _)) = self.columns.last_mut() {
            column.color = Some(color.into());
        }
        self
    }

    /// Column for statuses no column claims. Defaults to the first column.
    pub fn fallback(mut self, column: impl Into<String>) -> Self {
        self.fallback = Some(column.into());
        self
    }

    /// Statuses whose records are not shown on the board.
    pub fn hidden(mut self, statuses: &[&str]) -> Self {
        self.hidden.extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    pub fn build(self) -> Result<ColumnMapping, ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::MissingField {
                config: "ColumnMapping",
                field: "columns",
            });
        }

        let mut status_to_column = HashMap::new();
        let mut column_to_status = HashMap::new();
        let mut columns = Vec::with_capacity(self.columns.len());

        for (column, statuses) in self.columns {
            if column_to_status.contains_key(&column.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "column",
                    id: column.id,
                });
            }
            let Some(drop_status) = statuses.first() else {
                return Err(ConfigError::MissingField {
                    config: "BoardColumn",
                    field: "statuses",
                });
            };
            column_to_status.insert(column.id.clone(), drop_status.clone());

            for status in statuses {
                if status_to_column.insert(status.clone(), column.id.clone()).is_some() {
                    return Err(ConfigError::DuplicateId {
                        kind: "status",
                        id: status,
                    });
                }
            }
            columns.push(column);
        }

        let fallback = match self.fallback {
            Some(id) if column_to_status.contains_key(&id) => id,
            Some(id) => return Err(ConfigError::UnknownColumn(id)),
            None => columns[0].id.clone(),
        };

        Ok(ColumnMapping {
            columns,
            status_to_column,
            column_to_status,
            fallback,
            hidden: self.hidden.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> ColumnMapping {
        ColumnMapping::builder()
            .column("sourced", "Sourced", &["sourced", "new"])
            .column("submitted", "Submitted", &["submitted"])
            .column("interviewing", "Interviewing", &["interview_scheduled", "interviewed"])
            .column("placed", "Placed", &["placed"])
            .fallback("sourced")
            .hidden(&["rejected", "withdrawn"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_status_to_column_is_total() {
        let mapping = pipeline();
        assert_eq!(mapping.status_to_column("interviewed"), "interviewing");
        assert_eq!(mapping.status_to_column("new"), "sourced");
        assert_eq!(mapping.status_to_column("something_else"), "sourced");
    }

    #[test]
    fn test_column_to_status_uses_first_status() {
        let mapping = pipeline();
        assert_eq!(mapping.column_to_status("interviewing"), Some("interview_scheduled"));
        assert_eq!(mapping.column_to_status("nowhere"), None);
    }

    #[test]
    fn test_hidden() {
        let mapping = pipeline();
        assert!(mapping.is_hidden("rejected"));
        assert!(!mapping.is_hidden("placed"));
    }

    #[test]
    fn test_invalid_mappings() {
        let duplicate_status = ColumnMapping::builder()
            .column("a", "A", &["x"])
            .column("b", "B", &["x"])
            .build();
        assert!(matches!(duplicate_status, Err(ConfigError::DuplicateId { kind: "status", .. })));

        let unknown_fallback = ColumnMapping::builder()
            .column("a", "A", &["x"])
            .fallback("zzz")
            .build();
        assert_eq!(unknown_fallback.err(), Some(ConfigError::UnknownColumn("zzz".to_string())));

        let empty_column = ColumnMapping::builder().column("a", "A", &[]).build();
        assert!(matches!(empty_column, Err(ConfigError::MissingField { .. })));
    }
}
