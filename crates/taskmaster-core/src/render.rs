use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::datetime::format_due;
use crate::stats::Stats;
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    #[tracing::instrument(skip(self, tasks, today))]
    pub fn print_task_table(&mut self, tasks: &[&Task], today: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if tasks.is_empty() {
            writeln!(out, "No tasks to show.")?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Title".to_string(),
            "Category".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "Recur".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = self.paint(&short_id(task), "33");
            let done = if task.completed { "x" } else { "" }.to_string();

            let due = task.due.map(format_due).unwrap_or_default();
            let due = match task.due {
                Some(task_due) if !task.completed && task_due.date() < today => {
                    self.paint(&due, "31")
                }
                _ => due,
            };

            let priority = match task.priority.as_str() {
                "high" => self.paint("high", "31"),
                "medium" => self.paint("medium", "33"),
                other => other.to_string(),
            };

            let recur = if task.recurring.is_recurring() {
                task.recurring.as_str().to_string()
            } else {
                String::new()
            };

            rows.push(vec![
                id,
                done,
                task.title.clone(),
                task.category.as_str().to_string(),
                priority,
                due,
                recur,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, stats))]
    pub fn print_stats(&mut self, stats: &Stats) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "{} total, {} completed, {} due today, {} recurring ({}% done)",
            stats.total,
            stats.completed,
            stats.due_today,
            stats.recurring,
            stats.progress_percent()
        )?;
        Ok(())
    }

    pub fn print_trophy(&mut self, user_name: Option<&str>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let line = match user_name {
            Some(name) => format!("All tasks due today are done. Nice work, {name}!"),
            None => "All tasks due today are done. Nice work!".to_string(),
        };
        writeln!(out, "{}", self.paint(&line, "32"))?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// First id segment, enough to address a task from the CLI.
pub fn short_id(task: &Task) -> String {
    let raw = task.id.to_string();
    raw.split('-').next().unwrap_or(&raw).to_string()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
