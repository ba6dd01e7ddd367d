use clap::ValueEnum;
use tracing::trace;

use crate::task::{Category, Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

/// A filter/search query: the conjunction of a title substring, a status,
/// a category, and a priority. `None` (or an empty text) means that leg of
/// the conjunction is vacuously true.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub text: String,
    pub status: StatusFilter,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl Query {
    pub fn matches(&self, task: &Task) -> bool {
        let matches_text = self.text.is_empty()
            || task
                .title
                .to_lowercase()
                .contains(&self.text.to_lowercase());

        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        };

        let matches_category = self.category.is_none_or(|category| task.category == category);
        let matches_priority = self.priority.is_none_or(|priority| task.priority == priority);

        let ok = matches_text && matches_status && matches_category && matches_priority;
        trace!(id = %task.id, ok, "query predicate evaluation");
        ok
    }

    pub fn is_unfiltered(&self) -> bool {
        self.text.is_empty()
            && self.status == StatusFilter::All
            && self.category.is_none()
            && self.priority.is_none()
    }
}

/// Order-stable filtering: the result preserves the relative order of the
/// input collection. Pure — same collection and query, same sequence.
pub fn apply<'a>(tasks: &'a [Task], query: &Query) -> Vec<&'a Task> {
    tasks.iter().filter(|task| query.matches(task)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Query, StatusFilter, apply};
    use crate::task::{Category, Priority, Task, TaskDraft};

    fn task(title: &str, category: Category, priority: Priority, completed: bool) -> Task {
        let mut draft = TaskDraft::new(title);
        draft.category = category;
        draft.priority = priority;
        let mut task = Task::from_draft(draft, Utc::now());
        task.completed = completed;
        task
    }

    fn sample() -> Vec<Task> {
        vec![
            task("Buy groceries", Category::Shopping, Priority::Medium, false),
            task("Ship release", Category::Work, Priority::High, true),
            task("Morning run", Category::Health, Priority::Low, false),
            task("Grocery budget review", Category::Work, Priority::Medium, false),
        ]
    }

    #[test]
    fn empty_query_matches_everything_in_order() {
        let tasks = sample();
        let out = apply(&tasks, &Query::default());
        let titles: Vec<_> = out.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Buy groceries",
                "Ship release",
                "Morning run",
                "Grocery budget review"
            ]
        );
    }

    #[test]
    fn text_match_is_case_insensitive_and_title_only() {
        let mut tasks = sample();
        tasks[2].description = Some("grocery pickup on the way".to_string());

        let query = Query {
            text: "GROCER".to_string(),
            ..Query::default()
        };
        let titles: Vec<_> = apply(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        // Descriptions are not searched.
        assert_eq!(titles, vec!["Buy groceries", "Grocery budget review"]);
    }

    #[test]
    fn sub_predicates_conjoin() {
        let tasks = sample();
        let query = Query {
            status: StatusFilter::Pending,
            category: Some(Category::Work),
            ..Query::default()
        };
        let titles: Vec<_> = apply(&tasks, &query)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Grocery budget review"]);
    }

    #[test]
    fn status_and_priority_filters() {
        let tasks = sample();

        let completed = apply(
            &tasks,
            &Query {
                status: StatusFilter::Completed,
                ..Query::default()
            },
        );
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "Ship release");

        let medium = apply(
            &tasks,
            &Query {
                priority: Some(Priority::Medium),
                ..Query::default()
            },
        );
        assert_eq!(medium.len(), 2);
    }

    #[test]
    fn filtering_is_idempotent() {
        let tasks = sample();
        let query = Query {
            status: StatusFilter::Pending,
            ..Query::default()
        };

        let once: Vec<Task> = apply(&tasks, &query).into_iter().cloned().collect();
        let twice: Vec<Task> = apply(&once, &query).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }
}
