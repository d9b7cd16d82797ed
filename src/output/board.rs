#![forbid(unsafe_code)]

use std::fmt::Write as _;

use time::Date;

use crate::config::{DateStyle, UiConfig};
use crate::todo::{Board, Priority, Status, ToDo, date};

/// Presentation settings shared by the board and the task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub icons: bool,
    pub date_style: DateStyle,
}

impl Default for Style {
    fn default() -> Self {
        Self::from(&UiConfig::default())
    }
}

impl From<&UiConfig> for Style {
    fn from(ui: &UiConfig) -> Self {
        Self {
            icons: ui.icons,
            date_style: ui.date_style,
        }
    }
}

impl Style {
    #[must_use]
    pub fn due(self, due: Date) -> String {
        match self.date_style {
            DateStyle::Long => date::format_display_date(due),
            DateStyle::Iso => date::format_iso_date(due),
        }
    }

    #[must_use]
    pub fn status(self, status: Status) -> String {
        if self.icons {
            format!("{} {status}", status_icon(status))
        } else {
            status.to_string()
        }
    }
}

#[must_use]
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::ToDo => "○",
        Status::InProgress => "●",
        Status::Completed => "✓",
    }
}

fn priority_tag(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "[low]",
        Priority::Medium => "[medium]",
        Priority::High => "[HIGH]",
    }
}

/// Renders one project as three status columns, stacked vertically.
#[must_use]
pub fn render_board(board: &Board<'_>, style: Style) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", board.project);
    let _ = writeln!(out, "{}", "=".repeat(board.project.chars().count()));
    for column in &board.columns {
        let _ = writeln!(
            out,
            "\n{} ({})",
            style.status(column.status),
            column.todos.len()
        );
        if column.todos.is_empty() {
            let _ = writeln!(out, "  (empty)");
            continue;
        }
        for todo in &column.todos {
            write_card(&mut out, todo, style);
        }
    }
    out
}

fn write_card(out: &mut String, todo: &ToDo, style: Style) {
    let _ = writeln!(
        out,
        "  {} {}  (due {})  {}",
        priority_tag(todo.priority()),
        todo.title(),
        style.due(todo.due_date()),
        todo.id().short()
    );
    let _ = writeln!(out, "      {}", todo.description());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Project;
    use time::macros::date;

    fn sample() -> Project {
        let mut p = Project::new("Work");
        for (title, status) in [
            ("Write spec", Status::ToDo),
            ("Review", Status::Completed),
        ] {
            let t = ToDo::new(title, "", date!(2025 - 11 - 10), Priority::High, "Work", status)
                .unwrap();
            p.add_task(t);
        }
        p
    }

    #[test]
    fn board_lists_every_column() {
        let p = sample();
        let text = render_board(&p.board(), Style::default());
        assert!(text.starts_with("Work\n====\n"));
        assert!(text.contains("○ To-Do (1)"));
        assert!(text.contains("● In Progress (0)\n  (empty)"));
        assert!(text.contains("✓ Completed (1)"));
        assert!(text.contains("[HIGH] Write spec  (due Nov 10, 2025)"));
        assert!(text.contains("      No description"));
    }

    #[test]
    fn plain_style_drops_icons_and_uses_iso_dates() {
        let p = sample();
        let style = Style {
            icons: false,
            date_style: DateStyle::Iso,
        };
        let text = render_board(&p.board(), style);
        assert!(text.contains("\nTo-Do (1)"));
        assert!(!text.contains('○'));
        assert!(text.contains("(due 2025-11-10)"));
    }
}
