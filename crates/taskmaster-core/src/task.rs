use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::due_date_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Urgent,
    Shopping,
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Urgent => "urgent",
            Category::Shopping => "shopping",
            Category::Health => "health",
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Recurrence::None
    }
}

/// A single tracked task. Field names and the due-date layout match the
/// persisted JSON exactly, so old blobs keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub category: Category,

    pub priority: Priority,

    #[serde(default, rename = "dueDate", with = "due_date_serde::option")]
    pub due: Option<NaiveDateTime>,

    pub recurring: Recurrence,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "createdAt")]
    pub created: DateTime<Utc>,
}

impl Task {
    pub fn from_draft(draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            due: draft.due,
            recurring: draft.recurring,
            completed: false,
            created: now,
        }
    }

    /// Calendar-day truncation: true iff the task is due on `day`,
    /// ignoring time-of-day. Tasks without a due date are never due.
    pub fn is_due_on(&self, day: chrono::NaiveDate) -> bool {
        self.due.map(|due| due.date() == day).unwrap_or(false)
    }
}

/// Input to `TaskStore::add`. Only the title is required; the rest carry
/// the form defaults.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub due: Option<NaiveDateTime>,
    pub recurring: Recurrence,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: Category::Personal,
            priority: Priority::Medium,
            due: None,
            recurring: Recurrence::None,
        }
    }
}

/// Partial update for `TaskStore::edit`. `description` and `due` use a
/// double Option so a patch can distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due: Option<Option<NaiveDateTime>>,
    pub recurring: Option<Recurrence>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due.is_none()
            && self.recurring.is_none()
    }
}
