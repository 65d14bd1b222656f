mod common;

use chrono::Local;
use common::{at, date, open_store};
use taskplan::queries::{self, TaskFilter};
use taskplan::{Priority, Task, TodoItem, TodoList};

fn task(title: &str, priority: Priority, deadline: chrono::NaiveDateTime, done: bool) -> Task {
    let mut task = Task::new(title.to_string());
    task.priority = priority;
    task.deadline = Some(deadline);
    task.is_completed = done;
    task
}

#[test]
fn filtered_tasks_matches_exactly_the_expected_subset() {
    let store = open_store();
    let db = &store.db;
    let mut with_desc = task("Groceries", Priority::None, at(2026, 10, 18, 9, 0), false);
    with_desc.description = Some("Milk and BREAD".into());
    db.create_task(with_desc).unwrap();
    db.create_task(task("Bake bread", Priority::Urgent, at(2026, 10, 18, 10, 0), false)).unwrap();
    db.create_task(task("Bread course", Priority::Urgent, at(2026, 10, 19, 10, 0), true)).unwrap();
    db.create_task(task("Taxes", Priority::Important, at(2026, 10, 20, 10, 0), false)).unwrap();

    let all_tasks = db.get_all_tasks();
    for priority in std::iter::once(None).chain(Priority::ALL.into_iter().map(Some)) {
        for text in ["", "bread", "TAX", "nothing"] {
            for show_completed in [false, true] {
                let filter = TaskFilter { priority, text: text.to_string(), show_completed };
                let got: Vec<_> = queries::filtered_tasks(db, &filter);
                let expected: Vec<_> = all_tasks
                    .iter()
                    .filter(|t| priority.is_none_or(|p| t.priority == p))
                    .filter(|t| {
                        let needle = text.to_lowercase();
                        t.title.to_lowercase().contains(&needle)
                            || t.description.as_deref().unwrap_or("").to_lowercase().contains(&needle)
                    })
                    .filter(|t| show_completed || !t.is_completed)
                    .cloned()
                    .collect();
                assert_eq!(got, expected, "priority={priority:?} text={text:?} completed={show_completed}");
            }
        }
    }

    let bread = TaskFilter { priority: None, text: "bread".into(), show_completed: false };
    assert_eq!(queries::filtered_tasks(db, &bread).len(), 2);
}

#[test]
fn date_views_differ_on_completed_tasks() {
    let store = open_store();
    let db = &store.db;
    db.create_task(task("open", Priority::None, at(2026, 10, 18, 8, 0), false)).unwrap();
    db.create_task(task("done", Priority::None, at(2026, 10, 18, 23, 59), true)).unwrap();
    db.create_task(task("tomorrow", Priority::None, at(2026, 10, 19, 0, 0), false)).unwrap();
    db.create_task(Task::new("no deadline".into())).unwrap();

    let day = date(2026, 10, 18);
    let today_view: Vec<_> = queries::tasks_for_date(db, day, false).into_iter().map(|t| t.title).collect();
    let calendar_view: Vec<_> = queries::tasks_for_date(db, day, true).into_iter().map(|t| t.title).collect();
    assert_eq!(today_view, ["open"]);
    assert_eq!(calendar_view, ["open", "done"]);
}

#[test]
fn calendar_titles_cover_only_open_tasks_in_month() {
    let store = open_store();
    let db = &store.db;
    db.create_task(task("a", Priority::None, at(2026, 10, 3, 8, 0), false)).unwrap();
    db.create_task(task("b", Priority::None, at(2026, 10, 3, 9, 0), false)).unwrap();
    db.create_task(task("finished", Priority::None, at(2026, 10, 4, 9, 0), true)).unwrap();
    db.create_task(task("november", Priority::None, at(2026, 11, 3, 9, 0), false)).unwrap();

    let by_date = queries::task_titles_by_date(db, 2026, 10);
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date[&date(2026, 10, 3)], vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn find_by_title_and_date() {
    let store = open_store();
    let db = &store.db;
    db.create_task(task("Dentist", Priority::None, at(2026, 10, 3, 8, 0), false)).unwrap();
    db.create_task(task("Dentist", Priority::Urgent, at(2026, 10, 9, 8, 0), false)).unwrap();

    let found = queries::find_task_by_title_and_date(db, "Dentist", date(2026, 10, 9)).unwrap();
    assert_eq!(found.priority, Priority::Urgent);
    assert!(queries::find_task_by_title_and_date(db, "Dentist", date(2026, 10, 10)).is_none());
}

#[test]
fn items_for_date_aggregate_every_plan_that_day() {
    let store = open_store();
    let db = &store.db;
    let day = date(2026, 10, 18);
    let morning = db.create_todo_list(TodoList::new("Morning".into(), day)).unwrap();
    let evening = db.create_todo_list(TodoList::new("Evening".into(), day)).unwrap();
    let other = db.create_todo_list(TodoList::new("Other day".into(), date(2026, 10, 17))).unwrap();

    db.create_todo_item(TodoItem::new(morning.id.unwrap(), "Coffee".into())).unwrap();
    db.create_todo_item(TodoItem::new(evening.id.unwrap(), "Read".into())).unwrap();
    db.create_todo_item(TodoItem::new(other.id.unwrap(), "Yesterday".into())).unwrap();

    assert_eq!(queries::todo_lists_for_date(db, day).len(), 2);
    let titles: Vec<_> = queries::items_for_date(db, day).into_iter().map(|i| i.title).collect();
    assert_eq!(titles, ["Coffee", "Read"]);
}

#[test]
fn todays_views_use_the_local_date() {
    let store = open_store();
    let db = &store.db;
    let today = Local::now().date_naive();
    let list = db.create_todo_list(TodoList::new("Daily Plan".into(), today)).unwrap();
    db.create_todo_item(TodoItem::new(list.id.unwrap(), "Today item".into())).unwrap();
    db.create_task(task("Today task", Priority::None, today.and_hms_opt(23, 59, 0).unwrap(), false))
        .unwrap();

    assert_eq!(queries::todays_items(db).len(), 1);
    assert_eq!(queries::todays_tasks(db).len(), 1);
}

#[test]
fn plan_progress_reads_stored_items() {
    let store = open_store();
    let db = &store.db;
    let list = db.create_todo_list(TodoList::new("Daily Plan".into(), date(2026, 10, 18))).unwrap();
    let list_id = list.id.unwrap();
    assert_eq!(queries::plan_progress(db, list_id), 0);

    let first = db.create_todo_item(TodoItem::new(list_id, "one".into())).unwrap();
    db.create_todo_item(TodoItem::new(list_id, "two".into())).unwrap();
    db.create_todo_item(TodoItem::new(list_id, "three".into())).unwrap();
    db.set_todo_item_completed(first.id.unwrap(), true).unwrap();

    assert_eq!(queries::plan_progress(db, list_id), 33);
}
