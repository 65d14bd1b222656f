use rusqlite::params;
use tracing::{debug, warn};

use super::{decode_rows, optional, or_empty, require_id, Database, DatabaseError};
use crate::models::TodoItem;

const ITEM_COLUMNS: &str = "id, list_id, title, description, priority, duration, completed";

impl Database {
    fn row_to_todo_item(row: &rusqlite::Row) -> Result<TodoItem, rusqlite::Error> {
        Ok(TodoItem {
            id: Some(row.get(0)?),
            list_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            priority: row.get(4)?,
            duration: row.get(5)?,
            completed: row.get(6)?,
        })
    }

    /// Insert a plan item and return it with its new id
    pub fn create_todo_item(&self, mut item: TodoItem) -> Result<TodoItem, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO todo_items (list_id, title, description, priority, duration, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    item.list_id,
                    item.title,
                    item.description,
                    item.priority,
                    item.duration,
                    item.completed
                ],
            )
            .inspect_err(|e| warn!(error = %e, list_id = item.list_id, "create_todo_item failed"))?;
        let id = self.conn().last_insert_rowid();
        debug!(id, list_id = item.list_id, "plan item created");
        item.id = Some(id);
        Ok(item)
    }

    /// Update an existing plan item, including the list it belongs to
    pub fn update_todo_item(&self, item: &TodoItem) -> Result<(), DatabaseError> {
        let id = require_id(item.id, "plan item")?;
        self.conn()
            .execute(
                "UPDATE todo_items SET list_id = ?1, title = ?2, description = ?3,
                 priority = ?4, duration = ?5, completed = ?6 WHERE id = ?7",
                params![
                    item.list_id,
                    item.title,
                    item.description,
                    item.priority,
                    item.duration,
                    item.completed,
                    id
                ],
            )
            .inspect_err(|e| warn!(error = %e, id, "update_todo_item failed"))?;
        Ok(())
    }

    pub fn set_todo_item_completed(&self, id: i64, completed: bool) -> Result<(), DatabaseError> {
        self.conn()
            .execute("UPDATE todo_items SET completed = ?1 WHERE id = ?2", params![completed, id])
            .inspect_err(|e| warn!(error = %e, id, "set_todo_item_completed failed"))?;
        Ok(())
    }

    /// Delete a plan item by ID
    pub fn delete_todo_item(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM todo_items WHERE id = ?1", params![id])
            .inspect_err(|e| warn!(error = %e, id, "delete_todo_item failed"))?;
        Ok(())
    }

    /// Get a single plan item by ID, whether or not its plan still exists
    pub fn get_todo_item(&self, id: i64) -> Result<Option<TodoItem>, DatabaseError> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {ITEM_COLUMNS} FROM todo_items WHERE id = ?1"))?;
        optional(stmt.query_row(params![id], Self::row_to_todo_item))
    }

    pub(crate) fn query_todo_items(&self, list_id: Option<i64>) -> Result<Vec<TodoItem>, DatabaseError> {
        if let Some(list_id) = list_id {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {ITEM_COLUMNS} FROM todo_items WHERE list_id = ?1 ORDER BY id"
            ))?;
            let items = decode_rows("plan items", stmt.query_map(params![list_id], Self::row_to_todo_item)?)?;
            return Ok(items);
        }

        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {ITEM_COLUMNS} FROM todo_items ORDER BY id"))?;
        let items = decode_rows("plan items", stmt.query_map([], Self::row_to_todo_item)?)?;
        Ok(items)
    }

    /// Every plan item across all plans
    pub fn get_all_todo_items(&self) -> Vec<TodoItem> {
        or_empty("get_all_todo_items", self.query_todo_items(None))
    }

    /// Items of one plan, in insertion order; empty if the read fails
    pub fn get_items_for_list(&self, list_id: i64) -> Vec<TodoItem> {
        or_empty("get_items_for_list", self.query_todo_items(Some(list_id)))
    }
}
