//! Read-only views composed from repository reads: filtered task lists,
//! per-date task and plan lookups, overdue status and plan progress.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::Database;
use crate::models::{Priority, Task, TodoItem, TodoList};

/// Criteria for the main task list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    /// Keep only this priority; `None` keeps every priority
    pub priority: Option<Priority>,
    /// Case-insensitive substring searched in title and description
    pub text: String,
    pub show_completed: bool,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }

        if !self.show_completed && task.is_completed {
            return false;
        }

        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        task.title.to_lowercase().contains(&needle)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

/// Derived state of a task, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Overdue,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
            TaskStatus::Overdue => "Overdue",
        }
    }
}

/// A task is overdue when it is still open and its deadline is strictly in the past
pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    !task.is_completed && task.deadline.is_some_and(|deadline| deadline < now)
}

pub fn task_status(task: &Task, now: NaiveDateTime) -> TaskStatus {
    if task.is_completed {
        TaskStatus::Completed
    } else if is_overdue(task, now) {
        TaskStatus::Overdue
    } else {
        TaskStatus::Pending
    }
}

/// Completed share of `items` as a whole percentage, rounded down. 0 for no items.
pub fn progress_percent(items: &[TodoItem]) -> u32 {
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let done = items.iter().filter(|i| i.completed).count();
    (done * 100 / total) as u32
}

/// Tasks whose deadline falls on `date`
pub fn tasks_on_date(tasks: &[Task], date: NaiveDate, include_completed: bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| include_completed || !t.is_completed)
        .filter(|t| t.deadline.is_some_and(|d| d.date() == date))
        .cloned()
        .collect()
}

/// Tasks matching `filter`, in storage order
pub fn filtered_tasks(db: &Database, filter: &TaskFilter) -> Vec<Task> {
    filter.apply(&db.get_all_tasks())
}

/// Tasks due on `date`. The today view leaves completed tasks out; the
/// calendar view keeps them.
pub fn tasks_for_date(db: &Database, date: NaiveDate, include_completed: bool) -> Vec<Task> {
    tasks_on_date(&db.get_all_tasks(), date, include_completed)
}

/// Titles of open tasks per day for one month, for calendar highlighting
pub fn task_titles_by_date(db: &Database, year: i32, month: u32) -> BTreeMap<NaiveDate, Vec<String>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for task in db.get_all_tasks() {
        if task.is_completed {
            continue;
        }
        let Some(deadline) = task.deadline else {
            continue;
        };
        let date = deadline.date();
        if date.year() != year || date.month() != month {
            continue;
        }
        by_date.entry(date).or_default().push(task.title);
    }
    by_date
}

/// First task with this exact title due on `date`
pub fn find_task_by_title_and_date(db: &Database, title: &str, date: NaiveDate) -> Option<Task> {
    db.get_all_tasks()
        .into_iter()
        .find(|t| t.title == title && t.deadline.is_some_and(|d| d.date() == date))
}

/// Plans scheduled for `date`
pub fn todo_lists_for_date(db: &Database, date: NaiveDate) -> Vec<TodoList> {
    db.get_all_todo_lists()
        .into_iter()
        .filter(|l| l.date == date)
        .collect()
}

/// Items of every plan scheduled for `date`, plan by plan
pub fn items_for_date(db: &Database, date: NaiveDate) -> Vec<TodoItem> {
    todo_lists_for_date(db, date)
        .into_iter()
        .filter_map(|l| l.id)
        .flat_map(|id| db.get_items_for_list(id))
        .collect()
}

/// Items of every plan scheduled for the local current day
pub fn todays_items(db: &Database) -> Vec<TodoItem> {
    items_for_date(db, Local::now().date_naive())
}

/// Open tasks due on the local current day
pub fn todays_tasks(db: &Database) -> Vec<Task> {
    tasks_for_date(db, Local::now().date_naive(), false)
}

pub fn plan_progress(db: &Database, list_id: i64) -> u32 {
    progress_percent(&db.get_items_for_list(list_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn task(title: &str, description: Option<&str>, priority: Priority, done: bool) -> Task {
        Task {
            id: Some(1),
            title: title.to_string(),
            description: description.map(str::to_string),
            deadline: Some(at("2026-10-18", "09:00")),
            priority,
            is_completed: done,
        }
    }

    fn items(done: usize, total: usize) -> Vec<TodoItem> {
        (0..total)
            .map(|i| {
                let mut item = TodoItem::new(1, format!("item {i}"));
                item.completed = i < done;
                item
            })
            .collect()
    }

    #[test]
    fn progress_guards_empty_and_floors() {
        assert_eq!(progress_percent(&[]), 0);
        assert_eq!(progress_percent(&items(1, 3)), 33);
        assert_eq!(progress_percent(&items(2, 3)), 66);
        assert_eq!(progress_percent(&items(4, 4)), 100);
    }

    #[test]
    fn filter_matches_priority_text_and_completion() {
        let tasks = vec![
            task("Write report", None, Priority::Urgent, false),
            task("Groceries", Some("buy REPORT paper"), Priority::None, false),
            task("Old report", None, Priority::Urgent, true),
        ];

        let text_only = TaskFilter { text: "report".into(), show_completed: true, ..Default::default() };
        assert_eq!(text_only.apply(&tasks).len(), 3);

        let urgent_open = TaskFilter {
            priority: Some(Priority::Urgent),
            text: "RePoRt".into(),
            show_completed: false,
        };
        let hits = urgent_open.apply(&tasks);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Write report");

        let nothing = TaskFilter { text: "dentist".into(), show_completed: true, ..Default::default() };
        assert!(nothing.apply(&tasks).is_empty());
    }

    #[test]
    fn overdue_requires_open_task_with_past_deadline() {
        let now = at("2026-10-18", "12:00");
        let mut t = task("Call", None, Priority::None, false);
        assert!(is_overdue(&t, now));
        assert_eq!(task_status(&t, now), TaskStatus::Overdue);

        t.deadline = Some(now);
        assert!(!is_overdue(&t, now), "deadline equal to now is not overdue");

        t.deadline = Some(at("2026-10-17", "08:00"));
        t.is_completed = true;
        assert_eq!(task_status(&t, now), TaskStatus::Completed);

        t.is_completed = false;
        t.deadline = None;
        assert_eq!(task_status(&t, now), TaskStatus::Pending);
    }

    #[test]
    fn tasks_on_date_honours_completion_flag() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut tasks = vec![
            task("open", None, Priority::None, false),
            task("done", None, Priority::None, true),
            task("later", None, Priority::None, false),
        ];
        tasks[2].deadline = Some(at("2026-10-19", "09:00"));

        assert_eq!(tasks_on_date(&tasks, date, false).len(), 1);
        assert_eq!(tasks_on_date(&tasks, date, true).len(), 2);
    }
}
