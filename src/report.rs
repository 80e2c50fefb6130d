// src/report.rs

//! Final per-task report, suitable for tabular display.

use crate::dag::TaskTracker;
use crate::types::{TaskKind, TaskName, TaskStatus};

/// Cells longer than this are wrapped onto several lines.
const MAX_COL_WIDTH: usize = 50;

const HEADERS: [&str; 5] = ["Name", "Status", "Type", "Arguments", "Dependencies"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub name: TaskName,
    pub status: TaskStatus,
    pub kind: TaskKind,
    pub arguments: String,
    pub dependencies: Vec<TaskName>,
}

/// Final status of every task after a run, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    rows: Vec<TaskRow>,
}

impl RunSummary {
    pub fn from_tracker(tracker: &TaskTracker) -> Self {
        let rows = tracker
            .tasks()
            .map(|(name, task)| TaskRow {
                name: name.clone(),
                status: task.status(),
                kind: task.kind,
                arguments: task.arguments.clone(),
                dependencies: task.dependencies().to_vec(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[TaskRow] {
        &self.rows
    }

    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.rows.iter().find(|r| r.name == name).map(|r| r.status)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.rows.iter().all(|r| r.status == TaskStatus::Completed)
    }

    /// Render as a grid table:
    ///
    /// ```text
    /// +-------+-----------+------+-----------+--------------+
    /// | Name  | Status    | Type | Arguments | Dependencies |
    /// +=======+===========+======+===========+==============+
    /// | task1 | COMPLETED | exec | echo hi   |              |
    /// +-------+-----------+------+-----------+--------------+
    /// ```
    pub fn render_table(&self) -> String {
        let header: Vec<Vec<String>> = HEADERS.iter().map(|h| vec![h.to_string()]).collect();
        let body: Vec<Vec<Vec<String>>> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.name.clone(),
                    row.status.to_string(),
                    row.kind.to_string(),
                    row.arguments.clone(),
                    row.dependencies.join(", "),
                ]
                .iter()
                .map(|cell| wrap(cell, MAX_COL_WIDTH))
                .collect()
            })
            .collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (col, lines) in row.iter().enumerate() {
                for line in lines {
                    widths[col] = widths[col].max(line.chars().count());
                }
            }
        }

        let mut out = String::new();
        out.push_str(&separator(&widths, '-'));
        out.push_str(&render_row(&header, &widths));
        out.push_str(&separator(&widths, '='));
        for row in &body {
            out.push_str(&render_row(row, &widths));
            out.push_str(&separator(&widths, '-'));
        }
        out
    }
}

fn separator(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat_n(fill, width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn render_row(cells: &[Vec<String>], widths: &[usize]) -> String {
    let height = cells.iter().map(Vec::len).max().unwrap_or(1);
    let mut out = String::new();
    for i in 0..height {
        out.push('|');
        for (cell, width) in cells.iter().zip(widths) {
            let text = cell.get(i).map(String::as_str).unwrap_or("");
            let pad = width - text.chars().count();
            out.push(' ');
            out.push_str(text);
            out.extend(std::iter::repeat_n(' ', pad + 1));
            out.push('|');
        }
        out.push('\n');
    }
    out
}

/// Split on newlines, then break lines longer than `width` characters,
/// preferring whitespace boundaries.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split(' ') {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            while current.chars().count() > width {
                let head: String = current.chars().take(width).collect();
                let tail: String = current.chars().skip(width).collect();
                lines.push(head);
                current = tail;
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
