use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::recurrence::next_occurrence;
use crate::task::{Task, TaskDraft, TaskPatch};

const TASKS_FILE: &str = "tasks.data";

/// Exclusive owner of the ordered task collection and its persistence
/// round-trip. The collection order is the display order: `add` prepends,
/// recurrence successors append, `reorder` rewrites it wholesale.
///
/// Every mutator serializes the whole collection to `tasks.data` before
/// committing the change in memory, so a failed write leaves both the file
/// and the in-memory state untouched.
#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    tasks_path: PathBuf,
    tasks: Vec<Task>,
}

/// Result of `toggle_complete` for a task that was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The task's completion state after the flip.
    pub completed: bool,
    /// Id of the recurrence successor appended by this toggle, if any.
    pub spawned: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NotFound,
    /// The patch carried a title that was empty after trimming; nothing
    /// was changed.
    RejectedEmptyTitle,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join(TASKS_FILE);
        if !tasks_path.exists() {
            fs::write(&tasks_path, "[]")?;
        }

        let tasks = load_tasks(&tasks_path);
        info!(
            data_dir = %data_dir.display(),
            tasks = tasks.len(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            tasks,
        })
    }

    /// The current collection, in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Creates a task from `draft` and prepends it to the collection.
    /// A title that is empty after trimming rejects the draft: `Ok(None)`,
    /// nothing created, nothing persisted.
    #[tracing::instrument(skip(self, draft, now))]
    pub fn add(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> anyhow::Result<Option<Task>> {
        let TaskDraft {
            title,
            description,
            category,
            priority,
            due,
            recurring,
        } = draft;

        let title = title.trim().to_string();
        if title.is_empty() {
            debug!("rejected draft with empty title");
            return Ok(None);
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let task = Task::from_draft(
            TaskDraft {
                title,
                description,
                category,
                priority,
                due,
                recurring,
            },
            now,
        );

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task.clone());
        next.extend(self.tasks.iter().cloned());
        self.commit(next)?;

        debug!(id = %task.id, count = self.tasks.len(), "task added");
        Ok(Some(task))
    }

    /// Flips `completed` on the identified task. When the flip lands on
    /// completed and the task recurs, the next occurrence is appended to
    /// the end of the collection in the same persisted write. Unknown ids
    /// are a benign no-op (`Ok(None)`).
    #[tracing::instrument(skip(self, now), fields(id = %id))]
    pub fn toggle_complete(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ToggleOutcome>> {
        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("toggle on unknown id ignored");
            return Ok(None);
        };

        let mut next = self.tasks.clone();
        next[idx].completed = !next[idx].completed;
        let completed = next[idx].completed;

        let mut spawned = None;
        if completed && next[idx].recurring.is_recurring() {
            if let Some(successor) = next_occurrence(&next[idx], now) {
                spawned = Some(successor.id);
                next.push(successor);
            }
        }

        self.commit(next)?;
        debug!(completed, spawned = ?spawned, "toggled completion");
        Ok(Some(ToggleOutcome { completed, spawned }))
    }

    /// Applies a partial update. The patch is all-or-nothing: an empty
    /// provided title rejects the whole patch.
    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub fn edit(&mut self, id: Uuid, patch: TaskPatch) -> anyhow::Result<EditOutcome> {
        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("edit on unknown id ignored");
            return Ok(EditOutcome::NotFound);
        };

        let title = match patch.title {
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    debug!("rejected patch with empty title");
                    return Ok(EditOutcome::RejectedEmptyTitle);
                }
                Some(trimmed)
            }
            None => None,
        };

        let mut next = self.tasks.clone();
        let task = &mut next[idx];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
        }
        if let Some(category) = patch.category {
            task.category = category;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due) = patch.due {
            task.due = due;
        }
        if let Some(recurring) = patch.recurring {
            task.recurring = recurring;
        }

        self.commit(next)?;
        debug!("task edited");
        Ok(EditOutcome::Applied)
    }

    /// Removes the identified task. Unknown ids are a no-op (`Ok(false)`).
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: Uuid) -> anyhow::Result<bool> {
        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("delete on unknown id ignored");
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next.remove(idx);
        self.commit(next)?;

        debug!(count = self.tasks.len(), "task deleted");
        Ok(true)
    }

    /// Replaces the collection order with the given permutation. The
    /// permutation is authoritative over membership: ids it names that do
    /// not exist are ignored, and tasks it omits are dropped, matching the
    /// rebuild-from-visible semantics of a drag reorder.
    #[tracing::instrument(skip(self, order))]
    pub fn reorder(&mut self, order: &[Uuid]) -> anyhow::Result<()> {
        let mut pool: Vec<Option<Task>> = self.tasks.iter().cloned().map(Some).collect();
        let mut next = Vec::with_capacity(order.len());

        for id in order {
            if let Some(slot) = pool
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|task| task.id == *id))
            {
                next.push(slot.take().ok_or_else(|| anyhow!("reorder slot vanished"))?);
            }
        }

        let dropped = pool.iter().filter(|slot| slot.is_some()).count();
        if dropped > 0 {
            warn!(dropped, "reorder dropped tasks absent from the new order");
        }

        self.commit(next)?;
        debug!(count = self.tasks.len(), "collection reordered");
        Ok(())
    }

    /// Persists `next` and only then makes it the live collection.
    fn commit(&mut self, next: Vec<Task>) -> anyhow::Result<()> {
        save_tasks_atomic(&self.tasks_path, &next)?;
        self.tasks = next;
        Ok(())
    }
}

/// Loads the whole collection from the single blob. Fails soft: a missing
/// or unparseable blob yields an empty collection, never an error — there
/// is no migration path for foreign formats.
fn load_tasks(path: &Path) -> Vec<Task> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed reading tasks; starting empty");
            return Vec::new();
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str(trimmed) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed parsing tasks; starting empty");
            Vec::new()
        }
    }
}

#[tracing::instrument(skip(path, tasks))]
fn save_tasks_atomic(path: &Path, tasks: &[Task]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = tasks.len(), "saving tasks atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string(tasks)?;
    temp.write_all(serialized.as_bytes())?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, Utc};
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::{EditOutcome, TaskStore};
    use crate::task::{Priority, Recurrence, TaskDraft, TaskPatch};

    fn due(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").expect("valid due")
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title)
    }

    #[test]
    fn add_prepends_and_grows_by_one() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        let now = Utc::now();

        store.add(draft("first"), now).expect("add").expect("created");
        let second = store.add(draft("second"), now).expect("add").expect("created");

        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].id, second.id);
        assert_eq!(store.tasks()[1].title, "first");
    }

    #[test]
    fn add_rejects_blank_title() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");

        let created = store.add(draft("   "), Utc::now()).expect("add");
        assert!(created.is_none());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn delete_removes_and_unknown_id_is_noop() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        let task = store
            .add(draft("todo"), Utc::now())
            .expect("add")
            .expect("created");

        assert!(!store.delete(Uuid::new_v4()).expect("delete"));
        assert_eq!(store.tasks().len(), 1);

        assert!(store.delete(task.id).expect("delete"));
        assert!(store.tasks().iter().all(|t| t.id != task.id));
    }

    #[test]
    fn toggle_non_recurring_flips_in_place() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        let task = store
            .add(draft("one-shot"), Utc::now())
            .expect("add")
            .expect("created");

        let outcome = store
            .toggle_complete(task.id, Utc::now())
            .expect("toggle")
            .expect("found");
        assert!(outcome.completed);
        assert!(outcome.spawned.is_none());
        assert_eq!(store.tasks().len(), 1);

        let outcome = store
            .toggle_complete(task.id, Utc::now())
            .expect("toggle")
            .expect("found");
        assert!(!outcome.completed);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        store.add(draft("todo"), Utc::now()).expect("add");

        let outcome = store
            .toggle_complete(Uuid::new_v4(), Utc::now())
            .expect("toggle");
        assert!(outcome.is_none());
        assert!(!store.tasks()[0].completed);
    }

    #[test]
    fn completing_recurring_task_appends_successor() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");

        let mut d = draft("Pay rent");
        d.recurring = Recurrence::Monthly;
        d.due = Some(due("2024-01-31T09:00"));
        let task = store.add(d, Utc::now()).expect("add").expect("created");

        let outcome = store
            .toggle_complete(task.id, Utc::now())
            .expect("toggle")
            .expect("found");
        assert!(outcome.completed);
        let spawned = outcome.spawned.expect("spawned");

        assert_eq!(store.tasks().len(), 2);
        // Successors append, never prepend.
        let successor = store.tasks().last().expect("successor");
        assert_eq!(successor.id, spawned);
        assert!(!successor.completed);
        assert_eq!(successor.due, Some(due("2024-02-29T09:00")));
        // The original still recurs and is now complete.
        let original = store.find(task.id).expect("original");
        assert!(original.completed);
        assert_eq!(original.recurring, Recurrence::Monthly);
    }

    #[test]
    fn recurring_without_due_date_does_not_spawn() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");

        let mut d = draft("Stretch");
        d.recurring = Recurrence::Daily;
        let task = store.add(d, Utc::now()).expect("add").expect("created");

        let outcome = store
            .toggle_complete(task.id, Utc::now())
            .expect("toggle")
            .expect("found");
        assert!(outcome.completed);
        assert!(outcome.spawned.is_none());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn edit_applies_patch_and_rejects_blank_title() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        let task = store
            .add(draft("draft title"), Utc::now())
            .expect("add")
            .expect("created");

        let outcome = store
            .edit(
                task.id,
                TaskPatch {
                    title: Some("  final title  ".to_string()),
                    priority: Some(Priority::High),
                    due: Some(None),
                    ..TaskPatch::default()
                },
            )
            .expect("edit");
        assert_eq!(outcome, EditOutcome::Applied);

        let edited = store.find(task.id).expect("task");
        assert_eq!(edited.title, "final title");
        assert_eq!(edited.priority, Priority::High);
        assert!(edited.due.is_none());

        let outcome = store
            .edit(
                task.id,
                TaskPatch {
                    title: Some("   ".to_string()),
                    priority: Some(Priority::Low),
                    ..TaskPatch::default()
                },
            )
            .expect("edit");
        assert_eq!(outcome, EditOutcome::RejectedEmptyTitle);
        // Rejection is all-or-nothing: the priority did not change either.
        assert_eq!(store.find(task.id).expect("task").priority, Priority::High);

        let outcome = store
            .edit(Uuid::new_v4(), TaskPatch::default())
            .expect("edit");
        assert_eq!(outcome, EditOutcome::NotFound);
    }

    #[test]
    fn reorder_is_authoritative_over_order_and_membership() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open");
        let now = Utc::now();

        let a = store.add(draft("a"), now).expect("add").expect("created");
        let b = store.add(draft("b"), now).expect("add").expect("created");
        let c = store.add(draft("c"), now).expect("add").expect("created");

        // Unknown ids ignored, omitted tasks dropped.
        store
            .reorder(&[c.id, Uuid::new_v4(), a.id])
            .expect("reorder");

        let ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, a.id]);
        assert!(store.find(b.id).is_none());
    }

    #[test]
    fn collection_round_trips_through_reopen() {
        let temp = tempdir().expect("tempdir");
        let now = Utc::now();

        let before = {
            let mut store = TaskStore::open(temp.path()).expect("open");
            let mut d = draft("keep me");
            d.description = Some("with a note".to_string());
            d.due = Some(due("2024-06-01T12:00"));
            d.recurring = Recurrence::Weekly;
            store.add(d, now).expect("add").expect("created");
            store.add(draft("and me"), now).expect("add").expect("created");
            store.tasks().to_vec()
        };

        let store = TaskStore::open(temp.path()).expect("reopen");
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn corrupt_blob_resets_to_empty() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join("tasks.data"), "{not json").expect("write");

        let store = TaskStore::open(temp.path()).expect("open");
        assert!(store.tasks().is_empty());
    }
}
