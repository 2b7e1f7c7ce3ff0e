//! Plain-text rendering of screen view models.

use vista_core::ResolvedStatus;
use vista_engine::{ActionButton, Cell, DetailHeader, JourneyView, MenuItem, RenderedRow, StepState};

/// Lay out `rows` under `headers` with padded columns.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers)];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.extend(rows.iter().map(|row| line(row)));
    out.join("\n")
}

pub fn badge(status: &ResolvedStatus) -> String {
    format!("[{}]", status.label)
}

fn buttons(actions: &[ActionButton]) -> String {
    actions.iter().map(|a| a.id.as_str()).collect::<Vec<_>>().join(", ")
}

/// The list page as a table. Status cells show the resolved badge.
pub fn list_rows(rows: &[RenderedRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let mut headers: Vec<String> = vec!["ID".to_string()];
    headers.extend(first.cells.iter().map(|c| c.label.clone()));
    headers.push("Actions".to_string());

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.id.clone()];
            cells.extend(row.cells.iter().map(|cell| match (&row.status, cell.key.as_str()) {
                (Some(status), "status") => badge(status),
                _ => cell.text.clone(),
            }));
            cells.push(buttons(&row.actions));
            cells
        })
        .collect();

    table(&headers, &body)
}

fn labelled(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|c| format!("{}: {}", c.label, c.text))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn header(header: &DetailHeader) -> String {
    let mut out = header.title.clone();
    if let Some(status) = &header.status {
        out.push(' ');
        out.push_str(&badge(status));
    }
    if !header.subtitle.is_empty() {
        out.push('\n');
        out.push_str(&labelled(&header.subtitle));
    }
    if !header.metrics.is_empty() {
        out.push('\n');
        out.push_str(&labelled(&header.metrics));
    }
    out
}

pub fn journey(steps: &[JourneyView], completed: usize) -> String {
    let marks: Vec<String> = steps
        .iter()
        .map(|step| {
            let mark = match step.state {
                StepState::Completed => "x",
                StepState::Active => ">",
                StepState::Pending => " ",
            };
            format!("[{}] {}", mark, step.label)
        })
        .collect();
    format!("{}  ({}/{})", marks.join("  "), completed, steps.len())
}

pub fn actions(quick: &[ActionButton], menu: &[MenuItem]) -> String {
    let menu: Vec<String> = menu
        .iter()
        .map(|item| match item {
            MenuItem::Action(button) => button.id.clone(),
            MenuItem::Separator => "|".to_string(),
        })
        .collect();
    format!("Actions: {}\nMenu: {}", buttons(quick), menu.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::config::ActionVariant;

    #[test]
    fn test_table_pads_columns() {
        let out = table(
            &["ID".to_string(), "Name".to_string()],
            &[vec!["c1".to_string(), "Ada Lovelace".to_string()]],
        );
        assert_eq!(out, "ID  Name\n--  ------------\nc1  Ada Lovelace");
    }

    #[test]
    fn test_journey_marks() {
        let steps = vec![
            JourneyView {
                id: "a".to_string(),
                label: "Sourced".to_string(),
                state: StepState::Completed,
            },
            JourneyView {
                id: "b".to_string(),
                label: "Screening".to_string(),
                state: StepState::Active,
            },
        ];
        assert_eq!(journey(&steps, 1), "[x] Sourced  [>] Screening  (1/2)");
    }

    #[test]
    fn test_actions_show_separators() {
        let button = ActionButton {
            id: "edit".to_string(),
            label: "Edit".to_string(),
            icon: None,
            variant: ActionVariant::Default,
        };
        let out = actions(
            std::slice::from_ref(&button),
            &[MenuItem::Action(button.clone()), MenuItem::Separator, MenuItem::Action(button.clone())],
        );
        assert_eq!(out, "Actions: edit\nMenu: edit | edit");
    }
}
