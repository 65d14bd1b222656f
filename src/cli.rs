use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::backup::{BackupError, RestoreMode};
use crate::config::Config;
use crate::database::{Database, DatabaseError};
use crate::models::{Priority, Task, TodoItem, TodoList};
use crate::queries::{self, TaskFilter};
use crate::templates;
use crate::utils::{parse_date, parse_datetime, parse_month};

#[derive(Parser)]
#[command(name = "taskplan")]
#[command(about = "Tasks, daily plans and plan templates")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store if missing and print its location
    Init,
    /// Add a new task
    AddTask {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Deadline (YYYY-MM-DD or YYYY-MM-DD HH:MM)
        #[arg(long)]
        deadline: Option<String>,
        /// none, urgent, important, both (or 0-3)
        #[arg(long, default_value = "none")]
        priority: String,
    },
    /// List tasks, optionally filtered
    Tasks {
        #[arg(long)]
        priority: Option<String>,
        /// Case-insensitive text searched in title and description
        #[arg(long, default_value = "")]
        search: String,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Mark a task completed (or open again with --undo)
    Complete {
        id: i64,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    DeleteTask { id: i64 },
    /// Show today's open tasks and plan items (default command)
    Today {
        #[arg(long)]
        json: bool,
    },
    /// Show tasks due on one day, completed ones included
    Day { date: String },
    /// Show open task titles per day for a month (YYYY-MM, default current)
    Calendar { month: Option<String> },
    /// Create an empty plan
    AddPlan {
        #[arg(long)]
        name: Option<String>,
        /// Plan date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List plans, optionally for one date
    Plans {
        #[arg(long)]
        date: Option<String>,
    },
    /// Show a plan's items and progress
    Plan { id: i64 },
    /// Delete a plan; its items stay unless --cascade is given
    DeletePlan {
        id: i64,
        #[arg(long)]
        cascade: bool,
    },
    /// Add an item to a plan
    AddItem {
        plan_id: i64,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "none")]
        priority: String,
        /// Minutes
        #[arg(long, default_value_t = crate::models::DEFAULT_DURATION_MINUTES)]
        duration: u32,
    },
    /// Mark a plan item completed (or open again with --undo)
    CompleteItem {
        id: i64,
        #[arg(long)]
        undo: bool,
    },
    /// Create a plan from a template
    FromTemplate {
        template_id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Save a plan's items as a new template
    SaveTemplate {
        plan_id: i64,
        #[arg(long)]
        name: Option<String>,
    },
    /// List templates with their items
    Templates,
    /// Delete a template and its items
    DeleteTemplate { id: i64 },
    /// Copy the store file to PATH
    Backup { path: PathBuf },
    /// Replace the store with the backup at PATH
    Restore {
        path: PathBuf,
        /// Delete-then-copy instead of the configured mode
        #[arg(long)]
        legacy: bool,
    },
    /// Write a SQL dump to PATH
    Export { path: PathBuf },
    /// Run a SQL dump from PATH in one transaction
    Import { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Backup error: {0}")]
    BackupError(#[from] BackupError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn date_arg(date: Option<&str>) -> Result<NaiveDate, CliError> {
    match date {
        Some(s) => parse_date(s).map_err(|e| CliError::DateParseError(format!("Invalid date '{}': {}", s, e))),
        None => Ok(Local::now().date_naive()),
    }
}

fn priority_arg(s: &str) -> Result<Priority, CliError> {
    Priority::parse(s).ok_or_else(|| CliError::InvalidArgument(format!("Unknown priority '{}'", s)))
}

fn format_task(task: &Task, now: NaiveDateTime) -> String {
    let check = if task.is_completed { "x" } else { " " };
    let deadline = task
        .deadline
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}] #{:<4} {}  ({}, due {}, {})",
        check,
        task.id.unwrap_or(-1),
        task.title,
        task.priority,
        deadline,
        queries::task_status(task, now).label()
    )
}

fn format_item(item: &TodoItem) -> String {
    let check = if item.completed { "x" } else { " " };
    format!(
        "[{}] #{:<4} {}  ({}, {} min)",
        check,
        item.id.unwrap_or(-1),
        item.title,
        item.priority,
        item.duration
    )
}

fn format_list(list: &TodoList) -> String {
    format!("#{:<4} {}  {}", list.id.unwrap_or(-1), list.date, list.name)
}

pub fn handle_init(db: &Database) {
    println!("Store ready at {}", db.path().display());
}

pub fn handle_add_task(
    title: String,
    description: Option<String>,
    deadline: Option<String>,
    priority: String,
    db: &Database,
) -> Result<(), CliError> {
    let mut task = Task::new(title);
    task.description = description;
    task.priority = priority_arg(&priority)?;
    task.deadline = match deadline {
        Some(s) => Some(
            parse_datetime(&s)
                .map_err(|e| CliError::DateParseError(format!("Invalid deadline '{}': {}", s, e)))?,
        ),
        None => None,
    };

    let task = db.create_task(task)?;
    println!("Task created successfully (ID: {})", task.id.unwrap_or(-1));
    Ok(())
}

pub fn handle_tasks(
    priority: Option<String>,
    search: String,
    all: bool,
    json: bool,
    db: &Database,
) -> Result<(), CliError> {
    let filter = TaskFilter {
        priority: priority.as_deref().map(priority_arg).transpose()?,
        text: search,
        show_completed: all,
    };
    let tasks = queries::filtered_tasks(db, &filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    let now = Local::now().naive_local();
    for task in &tasks {
        println!("{}", format_task(task, now));
    }
    println!("{} task(s)", tasks.len());
    Ok(())
}

pub fn handle_complete(id: i64, undo: bool, db: &Database) -> Result<(), CliError> {
    if db.get_task(id)?.is_none() {
        return Err(DatabaseError::NotFound { entity: "task", id }.into());
    }
    db.set_task_completed(id, !undo)?;
    println!("Task {} marked {}", id, if undo { "pending" } else { "completed" });
    Ok(())
}

pub fn handle_delete_task(id: i64, db: &Database) -> Result<(), CliError> {
    db.delete_task(id)?;
    println!("Task {} deleted", id);
    Ok(())
}

pub fn handle_today(json: bool, db: &Database) -> Result<(), CliError> {
    let tasks = queries::todays_tasks(db);
    let items = queries::todays_items(db);

    if json {
        let view = serde_json::json!({ "tasks": tasks, "items": items });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let now = Local::now().naive_local();
    println!("Tasks due today:");
    for task in &tasks {
        println!("  {}", format_task(task, now));
    }
    println!("Plan items for today:");
    for item in &items {
        println!("  {}", format_item(item));
    }
    println!("Progress: {}%", queries::progress_percent(&items));
    Ok(())
}

pub fn handle_day(date: String, db: &Database) -> Result<(), CliError> {
    let date = date_arg(Some(&date))?;
    let tasks = queries::tasks_for_date(db, date, true);
    let now = Local::now().naive_local();
    for task in &tasks {
        println!("{}", format_task(task, now));
    }
    println!("{} task(s) on {}", tasks.len(), date.format("%d/%m/%Y"));
    Ok(())
}

pub fn handle_calendar(month: Option<String>, db: &Database) -> Result<(), CliError> {
    let (year, month) = match month {
        Some(s) => parse_month(&s).ok_or_else(|| CliError::DateParseError(format!("Invalid month '{}'", s)))?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };

    for (date, titles) in queries::task_titles_by_date(db, year, month) {
        println!("{}  {}", date, titles.join(", "));
    }
    Ok(())
}

pub fn handle_add_plan(
    name: Option<String>,
    date: Option<String>,
    config: &Config,
    db: &Database,
) -> Result<(), CliError> {
    let date = date_arg(date.as_deref())?;
    let name = name.unwrap_or_else(|| config.default_plan_name.clone());
    let list = db.create_todo_list(TodoList::new(name, date))?;
    println!("Plan created successfully (ID: {})", list.id.unwrap_or(-1));
    Ok(())
}

pub fn handle_plans(date: Option<String>, db: &Database) -> Result<(), CliError> {
    let lists = match date {
        Some(s) => queries::todo_lists_for_date(db, date_arg(Some(&s))?),
        None => db.get_all_todo_lists(),
    };
    for list in &lists {
        println!("{}", format_list(list));
    }
    Ok(())
}

pub fn handle_plan(id: i64, db: &Database) -> Result<(), CliError> {
    let list = db
        .get_todo_list(id)?
        .ok_or(DatabaseError::NotFound { entity: "plan", id })?;
    println!("Viewing: {} on {}", list.name, list.date.format("%d/%m/%Y"));

    let items = db.get_items_for_list(id);
    for item in &items {
        println!("  {}", format_item(item));
    }
    println!("Progress: {}%", queries::progress_percent(&items));
    Ok(())
}

pub fn handle_delete_plan(id: i64, cascade: bool, db: &Database) -> Result<(), CliError> {
    if cascade {
        db.delete_todo_list_cascade(id)?;
        println!("Plan {} and its items deleted", id);
    } else {
        db.delete_todo_list(id)?;
        println!("Plan {} deleted", id);
    }
    Ok(())
}

pub fn handle_add_item(
    plan_id: i64,
    title: String,
    description: Option<String>,
    priority: String,
    duration: u32,
    db: &Database,
) -> Result<(), CliError> {
    if db.get_todo_list(plan_id)?.is_none() {
        return Err(DatabaseError::NotFound { entity: "plan", id: plan_id }.into());
    }

    let mut item = TodoItem::new(plan_id, title);
    item.description = description;
    item.priority = priority_arg(&priority)?;
    item.duration = duration;

    let item = db.create_todo_item(item)?;
    println!("Plan item created successfully (ID: {})", item.id.unwrap_or(-1));
    Ok(())
}

pub fn handle_complete_item(id: i64, undo: bool, db: &Database) -> Result<(), CliError> {
    if db.get_todo_item(id)?.is_none() {
        return Err(DatabaseError::NotFound { entity: "plan item", id }.into());
    }
    db.set_todo_item_completed(id, !undo)?;
    println!("Plan item {} marked {}", id, if undo { "pending" } else { "completed" });
    Ok(())
}

pub fn handle_from_template(
    template_id: i64,
    date: Option<String>,
    name: Option<String>,
    config: &Config,
    db: &Database,
) -> Result<(), CliError> {
    let date = date_arg(date.as_deref())?;
    let name = name.unwrap_or_else(|| config.default_plan_name.clone());
    let (list, items) = templates::create_list_from_template(db, template_id, date, &name)?;
    println!(
        "Plan created from template (ID: {}, {} item(s))",
        list.id.unwrap_or(-1),
        items.len()
    );
    Ok(())
}

pub fn handle_save_template(
    plan_id: i64,
    name: Option<String>,
    config: &Config,
    db: &Database,
) -> Result<(), CliError> {
    let name = name.unwrap_or_else(|| config.default_template_name.clone());
    if name.trim().is_empty() {
        return Err(CliError::InvalidArgument("Template name cannot be empty".to_string()));
    }
    let (template, items) = templates::save_list_as_template(db, plan_id, &name)?;
    println!("Template saved (ID: {}, {} item(s))", template.id.unwrap_or(-1), items.len());
    Ok(())
}

pub fn handle_templates(db: &Database) {
    let templates = db.get_all_templates();
    println!("{} templates available", templates.len());
    for template in &templates {
        let id = template.id.unwrap_or(-1);
        println!("#{:<4} {}", id, template.name);
        for item in db.get_items_for_template(id) {
            println!("      - {}  ({}, {} min)", item.title, item.priority, item.duration);
        }
    }
}

pub fn handle_delete_template(id: i64, db: &Database) -> Result<(), CliError> {
    db.delete_template_cascade(id)?;
    println!("Template {} deleted", id);
    Ok(())
}

pub fn handle_backup(path: PathBuf, db: &Database) -> Result<(), CliError> {
    db.backup_database(&path)?;
    println!("Database backup created at {}", path.display());
    Ok(())
}

pub fn handle_restore(path: PathBuf, legacy: bool, config: &Config, db: &mut Database) -> Result<(), CliError> {
    let mode = if legacy { RestoreMode::Legacy } else { config.restore_mode };
    db.restore_database(&path, mode)?;
    println!("Database restored from {}", path.display());
    Ok(())
}

pub fn handle_export(path: PathBuf, db: &Database) -> Result<(), CliError> {
    db.export_to_sql(&path)?;
    println!("Database exported to {}", path.display());
    Ok(())
}

pub fn handle_import(path: PathBuf, db: &Database) -> Result<(), CliError> {
    let statements = db.import_from_sql(&path)?;
    println!("Imported {} statement(s) from {}", statements, path.display());
    Ok(())
}
