use anyhow::anyhow;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::cli::{Command, ThemeArg};
use crate::datetime::parse_due_expr;
use crate::filter::{Query, apply};
use crate::prefs::{DarkMode, Preferences};
use crate::render::{Renderer, short_id};
use crate::stats::{all_today_complete, compute};
use crate::store::{EditOutcome, TaskStore, ToggleOutcome};
use crate::task::{Task, TaskDraft, TaskPatch};

#[instrument(skip(store, prefs, renderer, command))]
pub fn dispatch(
    store: &mut TaskStore,
    prefs: &mut Preferences,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = Local::now().date_naive();

    debug!(?command, "dispatching command");

    match command {
        Command::Add {
            title,
            description,
            category,
            priority,
            due,
            recurring,
        } => {
            let mut draft = TaskDraft::new(title.join(" "));
            draft.description = description;
            draft.category = category;
            draft.priority = priority;
            draft.due = due.as_deref().map(|raw| parse_due_expr(raw, today)).transpose()?;
            draft.recurring = recurring;
            cmd_add(store, prefs, renderer, draft, now, today)
        }
        Command::List {
            search,
            status,
            category,
            priority,
        } => {
            let query = Query {
                text: search.unwrap_or_default(),
                status,
                category,
                priority,
            };
            cmd_list(store, prefs, renderer, &query, today)
        }
        Command::Done { id } => cmd_done(store, prefs, renderer, &id, now, today),
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            category,
            priority,
            due,
            clear_due,
            recurring,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                category,
                priority,
                due: if clear_due {
                    Some(None)
                } else {
                    due.as_deref()
                        .map(|raw| parse_due_expr(raw, today))
                        .transpose()?
                        .map(Some)
                },
                recurring,
            };
            cmd_edit(store, prefs, renderer, &id, patch, today)
        }
        Command::Delete { id } => cmd_delete(store, prefs, renderer, &id, today),
        Command::Move { id, position } => cmd_move(store, prefs, renderer, &id, position, today),
        Command::Reorder { ids } => cmd_reorder(store, prefs, renderer, &ids, today),
        Command::Stats => cmd_stats(store, renderer, today),
        Command::Today => cmd_today(store, prefs, renderer, today),
        Command::Name { name } => cmd_name(prefs, name.as_deref()),
        Command::Theme { mode } => cmd_theme(prefs, mode),
    }
}

#[instrument(skip(store, prefs, renderer, draft, now, today))]
fn cmd_add(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    draft: TaskDraft,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command add");

    match store.add(draft, now)? {
        Some(task) => {
            println!("Created task {}.", short_id(&task));
            rederive_and_render(store, prefs, renderer, today)
        }
        None => {
            println!("A task needs a non-empty title; nothing created.");
            Ok(())
        }
    }
}

#[instrument(skip(store, prefs, renderer, query, today))]
fn cmd_list(
    store: &TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    query: &Query,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    if prefs.user_name().is_none() {
        println!("Welcome to TaskMaster! Set your display name with `tm name <NAME>`.");
    }

    let visible = apply(store.tasks(), query);
    renderer.print_task_table(&visible, today)?;

    if query.is_unfiltered() {
        renderer.print_stats(&compute(store.tasks(), today))?;
        if all_today_complete(store.tasks(), today) {
            renderer.print_trophy(prefs.user_name())?;
        }
    } else {
        debug!(shown = visible.len(), total = store.tasks().len(), "filtered view");
    }

    Ok(())
}

#[instrument(skip(store, prefs, renderer, now, today))]
fn cmd_done(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    raw_id: &str,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command done");

    let Some(id) = resolve_id(store.tasks(), raw_id)? else {
        println!("No task matches '{raw_id}'.");
        return Ok(());
    };

    match store.toggle_complete(id, now)? {
        Some(ToggleOutcome { completed, spawned }) => {
            if completed {
                println!("Completed task {raw_id}.");
            } else {
                println!("Reopened task {raw_id}.");
            }
            if let Some(successor) = spawned.and_then(|sid| store.find(sid)) {
                println!(
                    "Scheduled next {} occurrence {}.",
                    successor.recurring.as_str(),
                    short_id(successor)
                );
            }
        }
        None => println!("No task matches '{raw_id}'."),
    }

    rederive_and_render(store, prefs, renderer, today)
}

#[instrument(skip(store, prefs, renderer, patch, today))]
fn cmd_edit(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    raw_id: &str,
    patch: TaskPatch,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command edit");

    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let Some(id) = resolve_id(store.tasks(), raw_id)? else {
        println!("No task matches '{raw_id}'.");
        return Ok(());
    };

    match store.edit(id, patch)? {
        EditOutcome::Applied => {
            println!("Updated task {raw_id}.");
            rederive_and_render(store, prefs, renderer, today)
        }
        EditOutcome::RejectedEmptyTitle => {
            println!("A task needs a non-empty title; nothing changed.");
            Ok(())
        }
        EditOutcome::NotFound => {
            println!("No task matches '{raw_id}'.");
            Ok(())
        }
    }
}

#[instrument(skip(store, prefs, renderer, today))]
fn cmd_delete(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    raw_id: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command delete");

    let Some(id) = resolve_id(store.tasks(), raw_id)? else {
        println!("No task matches '{raw_id}'.");
        return Ok(());
    };

    if store.delete(id)? {
        println!("Deleted task {raw_id}.");
        rederive_and_render(store, prefs, renderer, today)
    } else {
        println!("No task matches '{raw_id}'.");
        Ok(())
    }
}

#[instrument(skip(store, prefs, renderer, today))]
fn cmd_move(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    raw_id: &str,
    position: usize,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command move");

    let Some(id) = resolve_id(store.tasks(), raw_id)? else {
        println!("No task matches '{raw_id}'.");
        return Ok(());
    };

    // The store only accepts complete permutations, so the move is
    // translated into one here.
    let order = build_move_order(store.tasks(), id, position);
    store.reorder(&order)?;

    println!("Moved task {raw_id} to position {position}.");
    rederive_and_render(store, prefs, renderer, today)
}

#[instrument(skip(store, prefs, renderer, raw_ids, today))]
fn cmd_reorder(
    store: &mut TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    raw_ids: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command reorder");

    let mut order = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        let Some(id) = resolve_id(store.tasks(), raw)? else {
            println!("No task matches '{raw}'; order unchanged.");
            return Ok(());
        };
        order.push(id);
    }

    store.reorder(&order)?;
    println!("Reordered {} task(s).", store.tasks().len());
    rederive_and_render(store, prefs, renderer, today)
}

#[instrument(skip(store, renderer, today))]
fn cmd_stats(store: &TaskStore, renderer: &mut Renderer, today: NaiveDate) -> anyhow::Result<()> {
    info!("command stats");
    renderer.print_stats(&compute(store.tasks(), today))
}

#[instrument(skip(store, prefs, renderer, today))]
fn cmd_today(
    store: &TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command today");

    let due_today: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|task| task.is_due_on(today))
        .collect();
    renderer.print_task_table(&due_today, today)?;

    if all_today_complete(store.tasks(), today) {
        renderer.print_trophy(prefs.user_name())?;
    } else if !due_today.is_empty() {
        let open = due_today.iter().filter(|task| !task.completed).count();
        println!("{open} task(s) due today still open.");
    }

    Ok(())
}

#[instrument(skip(prefs, name))]
fn cmd_name(prefs: &mut Preferences, name: Option<&str>) -> anyhow::Result<()> {
    info!("command name");

    match name {
        Some(name) => {
            if name.trim().is_empty() {
                println!("A display name cannot be empty.");
            } else {
                prefs.set_user_name(name)?;
                println!("Hello, {}!", name.trim());
            }
        }
        None => match prefs.user_name() {
            Some(name) => println!("{name}"),
            None => println!("No display name set. Use `tm name <NAME>`."),
        },
    }

    Ok(())
}

#[instrument(skip(prefs))]
fn cmd_theme(prefs: &mut Preferences, mode: Option<ThemeArg>) -> anyhow::Result<()> {
    info!("command theme");

    let applied = match mode {
        None => {
            println!("Dark mode: {}.", prefs.dark_mode().as_str());
            return Ok(());
        }
        Some(ThemeArg::Toggle) => prefs.toggle_dark_mode()?,
        Some(ThemeArg::Enabled) => {
            prefs.set_dark_mode(DarkMode::Enabled)?;
            DarkMode::Enabled
        }
        Some(ThemeArg::Disabled) => {
            prefs.set_dark_mode(DarkMode::Disabled)?;
            DarkMode::Disabled
        }
    };

    println!("Dark mode: {}.", applied.as_str());
    Ok(())
}

/// The re-derive pass run after every successful mutation: filtered list,
/// statistics, then the daily-completion check, in that order, so the
/// printed view never lags the persisted collection.
fn rederive_and_render(
    store: &TaskStore,
    prefs: &Preferences,
    renderer: &mut Renderer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let visible = apply(store.tasks(), &Query::default());
    renderer.print_task_table(&visible, today)?;
    renderer.print_stats(&compute(store.tasks(), today))?;
    if all_today_complete(store.tasks(), today) {
        renderer.print_trophy(prefs.user_name())?;
    }
    Ok(())
}

/// Resolves a CLI selector to a task id: a full uuid, or any unique
/// prefix of one. Ambiguous prefixes are an error; unknown ones resolve
/// to `None` so callers can report and carry on.
fn resolve_id(tasks: &[Task], raw: &str) -> anyhow::Result<Option<Uuid>> {
    let needle = raw.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }

    if let Ok(id) = Uuid::parse_str(&needle) {
        return Ok(tasks.iter().find(|task| task.id == id).map(|task| task.id));
    }

    let mut matches = tasks
        .iter()
        .filter(|task| task.id.to_string().starts_with(&needle));

    let Some(first) = matches.next() else {
        return Ok(None);
    };
    if matches.next().is_some() {
        return Err(anyhow!("task id '{raw}' is ambiguous; give more characters"));
    }

    Ok(Some(first.id))
}

/// Builds the complete permutation that moves `id` to `position`
/// (1-based, clamped to the list length).
fn build_move_order(tasks: &[Task], id: Uuid, position: usize) -> Vec<Uuid> {
    let mut order: Vec<Uuid> = tasks
        .iter()
        .map(|task| task.id)
        .filter(|task_id| *task_id != id)
        .collect();

    let idx = position.saturating_sub(1).min(order.len());
    order.insert(idx, id);
    order
}
