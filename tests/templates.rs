mod common;

use common::{date, open_store};
use taskplan::templates::{create_list_from_template, save_list_as_template, DEFAULT_PLAN_NAME};
use taskplan::{DatabaseError, Priority, Template, TemplateItem, TodoItem, TodoList};

#[test]
fn plan_from_template_copies_every_item_uncompleted() {
    let store = open_store();
    let db = &store.db;
    let template = db.create_template(Template::new("Weekday".into())).unwrap();
    let template_id = template.id.unwrap();

    let specs = [
        ("Email", Some("triage inbox"), Priority::Urgent, 15),
        ("Deep work", None, Priority::Important, 120),
        ("Walk", Some("outside"), Priority::None, 30),
    ];
    for (title, description, priority, duration) in specs {
        let mut item = TemplateItem::new(template_id, title.to_string());
        item.description = description.map(str::to_string);
        item.priority = priority;
        item.duration = duration;
        db.create_template_item(item).unwrap();
    }

    let day = date(2026, 10, 19);
    let (list, items) = create_list_from_template(db, template_id, day, DEFAULT_PLAN_NAME).unwrap();
    let list_id = list.id.unwrap();
    assert_eq!(list.name, "Daily Plan");
    assert_eq!(list.date, day);

    let stored = db.get_items_for_list(list_id);
    assert_eq!(stored, items);
    assert_eq!(stored.len(), specs.len());
    for (item, (title, description, priority, duration)) in stored.iter().zip(specs) {
        assert_eq!(item.list_id, list_id);
        assert_eq!(item.title, title);
        assert_eq!(item.description.as_deref(), description);
        assert_eq!(item.priority, priority);
        assert_eq!(item.duration, duration);
        assert!(!item.completed);
    }

    // The template itself is untouched
    assert_eq!(db.get_items_for_template(template_id).len(), 3);
}

#[test]
fn empty_template_yields_empty_plan() {
    let store = open_store();
    let template = store.db.create_template(Template::new("Blank".into())).unwrap();
    let (list, items) =
        create_list_from_template(&store.db, template.id.unwrap(), date(2026, 10, 19), "Blank day").unwrap();
    assert!(items.is_empty());
    assert_eq!(store.db.get_todo_list(list.id.unwrap()).unwrap(), Some(list));
}

#[test]
fn unknown_template_creates_nothing() {
    let store = open_store();
    let err = create_list_from_template(&store.db, 77, date(2026, 10, 19), DEFAULT_PLAN_NAME).unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound { entity: "template", id: 77 }));
    assert!(store.db.get_all_todo_lists().is_empty());
}

#[test]
fn save_plan_as_template_drops_completion() {
    let store = open_store();
    let db = &store.db;
    let list = db.create_todo_list(TodoList::new("Sunday".into(), date(2026, 10, 18))).unwrap();
    let list_id = list.id.unwrap();

    let mut done = TodoItem::new(list_id, "Laundry".into());
    done.completed = true;
    done.duration = 90;
    db.create_todo_item(done).unwrap();
    let mut open = TodoItem::new(list_id, "Meal prep".into());
    open.priority = Priority::UrgentImportant;
    db.create_todo_item(open).unwrap();

    let (template, items) = save_list_as_template(db, list_id, "Sunday routine").unwrap();
    let template_id = template.id.unwrap();
    assert_eq!(db.get_template(template_id).unwrap().unwrap().name, "Sunday routine");

    let stored = db.get_items_for_template(template_id);
    assert_eq!(stored, items);
    let summary: Vec<_> = stored.iter().map(|i| (i.title.as_str(), i.duration, i.priority)).collect();
    assert_eq!(
        summary,
        [("Laundry", 90, Priority::None), ("Meal prep", 30, Priority::UrgentImportant)]
    );

    // Round trip back into a fresh plan: nothing starts completed
    let (_, copies) = create_list_from_template(db, template_id, date(2026, 10, 25), "Next Sunday").unwrap();
    assert!(copies.iter().all(|i| !i.completed));
}

#[test]
fn unknown_plan_creates_no_template() {
    let store = open_store();
    let err = save_list_as_template(&store.db, 5, "Ghost").unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound { entity: "plan", id: 5 }));
    assert!(store.db.get_all_templates().is_empty());
}

/// Make inserts of a row titled `Boom` into `table` abort
fn fail_inserts_titled_boom(db: &taskplan::Database, table: &str) {
    let conn = rusqlite::Connection::open(db.path()).unwrap();
    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_on_boom BEFORE INSERT ON {table}
         WHEN NEW.title = 'Boom'
         BEGIN SELECT RAISE(ABORT, 'boom'); END;"
    ))
    .unwrap();
}

#[test]
fn failing_item_leaves_no_partial_plan() {
    let store = open_store();
    let db = &store.db;
    let template = db.create_template(Template::new("Fragile".into())).unwrap();
    let template_id = template.id.unwrap();
    for title in ["Fine", "Boom", "Never reached"] {
        db.create_template_item(TemplateItem::new(template_id, title.to_string())).unwrap();
    }
    fail_inserts_titled_boom(db, "todo_items");

    let err = create_list_from_template(db, template_id, date(2026, 10, 19), DEFAULT_PLAN_NAME).unwrap_err();
    assert!(matches!(err, DatabaseError::SqliteError(_)));
    assert!(db.get_all_todo_lists().is_empty());
    assert!(db.get_all_todo_items().is_empty());
}

#[test]
fn failing_item_leaves_no_partial_template() {
    let store = open_store();
    let db = &store.db;
    let list = db.create_todo_list(TodoList::new("Fragile".into(), date(2026, 10, 18))).unwrap();
    let list_id = list.id.unwrap();
    for title in ["Fine", "Boom", "Never reached"] {
        db.create_todo_item(TodoItem::new(list_id, title.to_string())).unwrap();
    }
    fail_inserts_titled_boom(db, "template_items");

    let err = save_list_as_template(db, list_id, "Fragile routine").unwrap_err();
    assert!(matches!(err, DatabaseError::SqliteError(_)));
    assert!(db.get_all_templates().is_empty());
    assert!(db.get_all_template_items().is_empty());
    // The source plan is untouched
    assert_eq!(db.get_items_for_list(list_id).len(), 3);
}
