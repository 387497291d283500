//! Plain-text rendering for the terminal front-end.

use std::fmt::Write as _;

use crate::dashboard::DashboardSummary;
use crate::domain::{Column, Feedback, Resource};
use crate::notify::{Banner, NotificationKind};
use crate::util::table_cell;

const ID_WIDTH: usize = 5;
const SEPARATOR: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: Option<i64>,
    pub cells: Vec<String>,
}

/// A listing ready for display, independent of the record type.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: &'static [Column],
    pub rows: Vec<Row>,
}

impl Table {
    pub fn from_items<T: Resource>(items: &[T]) -> Self {
        Self {
            columns: T::columns(),
            rows: items
                .iter()
                .map(|item| Row {
                    id: item.id(),
                    cells: item.cells(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let mut header = table_cell("ID", ID_WIDTH);
        for column in self.columns {
            header.push_str(SEPARATOR);
            header.push_str(&table_cell(column.title, column.width));
        }
        let _ = writeln!(out, "{}", header.trim_end());
        let rule_width: usize = ID_WIDTH
            + self
                .columns
                .iter()
                .map(|c| c.width + SEPARATOR.len())
                .sum::<usize>();
        let _ = writeln!(out, "{}", "-".repeat(rule_width));

        for row in &self.rows {
            let id = row.id.map(|id| id.to_string()).unwrap_or_default();
            let mut line = table_cell(&id, ID_WIDTH);
            for (column, cell) in self.columns.iter().zip(&row.cells) {
                line.push_str(SEPARATOR);
                line.push_str(&table_cell(cell, column.width));
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out
    }
}

pub fn dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dashboard ({})",
        summary.refreshed_at.format("%Y-%m-%d %H:%M UTC")
    );
    for (kind, count) in &summary.totals {
        let _ = writeln!(out, "  {:<14}{}", kind.plural(), figure(*count));
    }
    let _ = writeln!(
        out,
        "  {:<14}{}",
        "New feedback",
        figure(summary.unread_feedback)
    );
    out
}

fn figure(count: Option<usize>) -> String {
    count.map_or_else(|| "unavailable".to_string(), |n| n.to_string())
}

/// Full view of one feedback message.
pub fn feedback(item: &Feedback) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "From:    {} <{}>", item.name, item.email);
    let _ = writeln!(out, "Date:    {}", item.date.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "Status:  {}", item.status);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", crate::util::strip_control_chars(&item.message));
    if let Some(response) = &item.response {
        let _ = writeln!(out);
        match item.response_date {
            Some(at) => {
                let _ = writeln!(out, "Reply ({}):", at.format("%Y-%m-%d %H:%M"));
            }
            None => {
                let _ = writeln!(out, "Reply:");
            }
        }
        let _ = writeln!(out, "{}", crate::util::strip_control_chars(response));
    }
    out
}

pub fn banner(banner: &Banner) -> String {
    let tag = match banner.kind {
        NotificationKind::Success => "[ok]",
        NotificationKind::Error => "[error]",
        NotificationKind::Warning => "[warn]",
        NotificationKind::Info => "[info]",
    };
    format!("{} {}", tag, banner.message)
}
