//! Configuration documents.
//!
//! Screens are described by data: a [`ListViewConfig`], a
//! [`DetailViewConfig`] or a [`ScreenConfig`]. List and detail configs are
//! generic over the record type they display and are assembled with
//! builders; `build()` validates the whole document so that a malformed
//! configuration fails at startup instead of while a screen renders.

mod action;
mod column;
mod detail;
mod filter;
mod list;
mod meta;
mod screen;
mod section;
mod source;

pub use action::{
    expand_path, ActionEffect, ActionHandler, ActionSpec, ActionTarget, ActionVariant, DialogRequest, MenuEntry,
    Predicate,
};
pub use column::{Align, ColumnSpec, ColumnType, FormatFn, MetricSpec, RenderFn, ValueFn};
pub use detail::{DetailViewConfig, DetailViewConfigBuilder, TitleFn};
pub use filter::{FilterKind, FilterOption, FilterSpec, ALL_OPTION};
pub use list::{ListViewConfig, ListViewConfigBuilder, DEFAULT_PAGE_SIZE};
pub use meta::{Breadcrumb, EmptyState, EntityName, LinkAction, StatFormat, StatsCard};
pub use screen::{ConfigDocument, ScreenConfig};
pub use section::{JourneyStep, SectionSpec};
pub use source::{DataSourceSpec, Page, QueryDescriptor, SortOrder, ENTITY_ID_PLACEHOLDER};

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::record::{has_field, Record};

/// Fail on the first id that appears twice.
pub(crate) fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_filters(filters: &[FilterSpec]) -> Result<(), ConfigError> {
    for filter in filters {
        filter.validate()?;
    }
    ensure_unique("filter", filters.iter().map(|f| f.key.as_str()))
}

/// Column keys must be unique and address a field of `R`, unless the column
/// computes its display with a renderer.
pub(crate) fn check_columns<R: Record>(columns: &[ColumnSpec<R>]) -> Result<(), ConfigError> {
    ensure_unique("column", columns.iter().map(|c| c.key.as_str()))?;
    for column in columns {
        if !column.has_renderer() && !has_field::<R>(&column.key) {
            return Err(ConfigError::UnknownField {
                kind: "column",
                key: column.key.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct Lead {
        id: String,
        status: String,
    }

    impl Record for Lead {
        fn id(&self) -> &str {
            &self.id
        }

        fn status(&self) -> Option<&str> {
            Some(&self.status)
        }

        fn field(&self, key: &str) -> Option<Value> {
            match key {
                "id" => Some(Value::String(self.id.clone())),
                "status" => Some(Value::String(self.status.clone())),
                _ => None,
            }
        }

        fn field_names() -> Option<&'static [&'static str]> {
            Some(&["id", "status"])
        }
    }

    #[test]
    fn test_typed_record_rejects_unknown_column() {
        let result = check_columns::<Lead>(&[ColumnSpec::new("status", "Status"), ColumnSpec::new("company", "Company")]);
        assert_eq!(
            result,
            Err(ConfigError::UnknownField {
                kind: "column",
                key: "company".to_string()
            })
        );
    }

    #[test]
    fn test_rendered_column_skips_field_check() {
        let columns = [ColumnSpec::<Lead>::new("display", "Display").render(|_, lead| lead.id.to_uppercase())];
        assert!(check_columns(&columns).is_ok());
        let lead = Lead {
            id: "l1".to_string(),
            status: "new".to_string(),
        };
        assert_eq!(columns[0].display(&lead), "L1");
    }

    #[test]
    fn test_ensure_unique() {
        assert!(ensure_unique("x", ["a", "b"]).is_ok());
        assert_eq!(
            ensure_unique("x", ["a", "b", "a"]),
            Err(ConfigError::DuplicateId {
                kind: "x",
                id: "a".to_string()
            })
        );
    }
}
