//! Copying between templates and plans.
//!
//! Both directions run inside one transaction, so a failure part-way through
//! leaves neither a half-filled plan nor a half-filled template behind.

use chrono::NaiveDate;
use tracing::info;

use crate::database::{Database, DatabaseError};
use crate::models::{Template, TemplateItem, TodoItem, TodoList};

pub const DEFAULT_PLAN_NAME: &str = "Daily Plan";
pub const DEFAULT_TEMPLATE_NAME: &str = "Daily Template";

/// Create a plan for `date` holding a fresh, uncompleted copy of every item
/// in the template
pub fn create_list_from_template(
    db: &Database,
    template_id: i64,
    date: NaiveDate,
    name: &str,
) -> Result<(TodoList, Vec<TodoItem>), DatabaseError> {
    if db.get_template(template_id)?.is_none() {
        return Err(DatabaseError::NotFound { entity: "template", id: template_id });
    }

    let tx = db.conn().unchecked_transaction()?;

    let list = db.create_todo_list(TodoList::new(name.to_string(), date))?;
    let list_id = list.id.ok_or(DatabaseError::MissingId("plan"))?;

    let template_items = db.query_template_items(Some(template_id))?;
    let mut items = Vec::with_capacity(template_items.len());
    for template_item in &template_items {
        items.push(db.create_todo_item(TodoItem::from_template_item(list_id, template_item))?);
    }

    tx.commit()?;
    info!(template_id, list_id, items = items.len(), "plan created from template");
    Ok((list, items))
}

/// Save a plan's items as a new template, dropping their completion state
pub fn save_list_as_template(
    db: &Database,
    list_id: i64,
    name: &str,
) -> Result<(Template, Vec<TemplateItem>), DatabaseError> {
    if db.get_todo_list(list_id)?.is_none() {
        return Err(DatabaseError::NotFound { entity: "plan", id: list_id });
    }

    let tx = db.conn().unchecked_transaction()?;

    let template = db.create_template(Template::new(name.to_string()))?;
    let template_id = template.id.ok_or(DatabaseError::MissingId("template"))?;

    let plan_items = db.query_todo_items(Some(list_id))?;
    let mut items = Vec::with_capacity(plan_items.len());
    for plan_item in &plan_items {
        items.push(db.create_template_item(TemplateItem::from_todo_item(template_id, plan_item))?);
    }

    tx.commit()?;
    info!(list_id, template_id, items = items.len(), "plan saved as template");
    Ok((template, items))
}
