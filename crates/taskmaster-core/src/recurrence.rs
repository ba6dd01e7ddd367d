use chrono::{DateTime, Days, Months, NaiveDateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::task::{Recurrence, Task};

/// Derives the follow-up occurrence for a completed recurring task.
///
/// Returns `None` when the task does not recur or has no due date — a
/// recurring task without an anchor date cannot recur. The source task is
/// never touched; the successor gets a fresh id and creation timestamp and
/// starts out pending.
#[tracing::instrument(skip(task, now), fields(id = %task.id, recurring = task.recurring.as_str()))]
pub fn next_occurrence(task: &Task, now: DateTime<Utc>) -> Option<Task> {
    let due = task.due?;
    let next_due = advance(due, task.recurring)?;

    debug!(
        from = %due.format("%Y-%m-%dT%H:%M"),
        to = %next_due.format("%Y-%m-%dT%H:%M"),
        "derived next occurrence"
    );

    Some(Task {
        id: Uuid::new_v4(),
        title: task.title.clone(),
        description: task.description.clone(),
        category: task.category,
        priority: task.priority,
        due: Some(next_due),
        recurring: task.recurring,
        completed: false,
        created: now,
    })
}

/// Advances a due date by one recurrence interval.
///
/// Monthly steps use calendar months and clamp at month end: Jan 31
/// becomes Feb 28 (or 29), not Mar 2. Clamping keeps "monthly on the
/// 31st" pinned to the end of short months and is stable across runtimes.
fn advance(due: NaiveDateTime, recurring: Recurrence) -> Option<NaiveDateTime> {
    match recurring {
        Recurrence::None => None,
        Recurrence::Daily => due.checked_add_days(Days::new(1)),
        Recurrence::Weekly => due.checked_add_days(Days::new(7)),
        Recurrence::Monthly => due.checked_add_months(Months::new(1)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::next_occurrence;
    use crate::task::{Recurrence, Task, TaskDraft};

    fn recurring_task(recurring: Recurrence, due: Option<&str>) -> Task {
        let mut draft = TaskDraft::new("Water the plants");
        draft.recurring = recurring;
        draft.due = due.map(|raw| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").expect("valid due")
        });
        Task::from_draft(draft, Utc::now())
    }

    #[test]
    fn daily_advances_one_day() {
        let task = recurring_task(Recurrence::Daily, Some("2024-03-01T08:30"));
        let next = next_occurrence(&task, Utc::now()).expect("occurrence");
        let due = next.due.expect("due");
        assert_eq!(due.date(), NaiveDate::from_ymd_opt(2024, 3, 2).expect("date"));
        assert_eq!(due.format("%H:%M").to_string(), "08:30");
    }

    #[test]
    fn weekly_advances_seven_days() {
        let task = recurring_task(Recurrence::Weekly, Some("2024-03-01T08:30"));
        let next = next_occurrence(&task, Utc::now()).expect("occurrence");
        assert_eq!(
            next.due.expect("due").date(),
            NaiveDate::from_ymd_opt(2024, 3, 8).expect("date")
        );
    }

    #[test]
    fn monthly_clamps_at_month_end() {
        let task = recurring_task(Recurrence::Monthly, Some("2024-01-31T09:00"));
        let next = next_occurrence(&task, Utc::now()).expect("occurrence");
        let due = next.due.expect("due");
        assert_eq!(due.date(), NaiveDate::from_ymd_opt(2024, 2, 29).expect("date"));
        assert_eq!(due.format("%H:%M").to_string(), "09:00");
    }

    #[test]
    fn successor_is_a_fresh_pending_sibling() {
        let task = recurring_task(Recurrence::Daily, Some("2024-03-01T08:30"));
        let next = next_occurrence(&task, Utc::now()).expect("occurrence");
        assert_ne!(next.id, task.id);
        assert!(!next.completed);
        assert_eq!(next.title, task.title);
        assert_eq!(next.recurring, task.recurring);
    }

    #[test]
    fn no_due_date_means_no_occurrence() {
        let task = recurring_task(Recurrence::Daily, None);
        assert!(next_occurrence(&task, Utc::now()).is_none());
    }

    #[test]
    fn non_recurring_task_never_spawns() {
        let task = recurring_task(Recurrence::None, Some("2024-03-01T08:30"));
        assert!(next_occurrence(&task, Utc::now()).is_none());
    }
}
