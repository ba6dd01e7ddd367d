use chrono::NaiveDate;

use crate::task::Task;

/// Aggregate counts over the whole collection, derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub due_today: usize,
    pub recurring: usize,
}

impl Stats {
    /// Completion as a whole percentage, rounded. Zero tasks is zero
    /// percent, not a division by zero.
    pub fn progress_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

pub fn compute(tasks: &[Task], today: NaiveDate) -> Stats {
    Stats {
        total: tasks.len(),
        completed: tasks.iter().filter(|task| task.completed).count(),
        due_today: tasks.iter().filter(|task| task.is_due_on(today)).count(),
        recurring: tasks
            .iter()
            .filter(|task| task.recurring.is_recurring())
            .count(),
    }
}

/// True iff at least one task is due today and every task due today is
/// completed. Nothing due means nothing to celebrate.
pub fn all_today_complete(tasks: &[Task], today: NaiveDate) -> bool {
    let mut any = false;
    for task in tasks.iter().filter(|task| task.is_due_on(today)) {
        if !task.completed {
            return false;
        }
        any = true;
    }
    any
}
