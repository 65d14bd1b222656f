use rusqlite::params;
use tracing::{debug, warn};

use super::{decode_rows, optional, or_empty, require_id, Database, DatabaseError};
use crate::models::TodoList;

impl Database {
    fn row_to_todo_list(row: &rusqlite::Row) -> Result<TodoList, rusqlite::Error> {
        Ok(TodoList {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            date: row.get(2)?,
        })
    }

    /// Insert a plan and return it with its new id
    pub fn create_todo_list(&self, mut list: TodoList) -> Result<TodoList, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO todo_lists (name, date) VALUES (?1, ?2)",
                params![list.name, list.date],
            )
            .inspect_err(|e| warn!(error = %e, "create_todo_list failed"))?;
        let id = self.conn().last_insert_rowid();
        debug!(id, date = %list.date, "plan created");
        list.id = Some(id);
        Ok(list)
    }

    /// Update an existing plan
    pub fn update_todo_list(&self, list: &TodoList) -> Result<(), DatabaseError> {
        let id = require_id(list.id, "plan")?;
        self.conn()
            .execute(
                "UPDATE todo_lists SET name = ?1, date = ?2 WHERE id = ?3",
                params![list.name, list.date, id],
            )
            .inspect_err(|e| warn!(error = %e, id, "update_todo_list failed"))?;
        Ok(())
    }

    /// Delete a plan row only. Its items stay behind with a dangling `list_id`.
    pub fn delete_todo_list(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM todo_lists WHERE id = ?1", params![id])
            .inspect_err(|e| warn!(error = %e, id, "delete_todo_list failed"))?;
        debug!(id, "plan deleted");
        Ok(())
    }

    /// Delete a plan together with all of its items, atomically
    pub fn delete_todo_list_cascade(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn().unchecked_transaction()?;
        let items = tx.execute("DELETE FROM todo_items WHERE list_id = ?1", params![id])?;
        tx.execute("DELETE FROM todo_lists WHERE id = ?1", params![id])?;
        tx.commit()?;
        debug!(id, items, "plan deleted with its items");
        Ok(())
    }

    /// Get a single plan by ID
    pub fn get_todo_list(&self, id: i64) -> Result<Option<TodoList>, DatabaseError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, date FROM todo_lists WHERE id = ?1")?;
        optional(stmt.query_row(params![id], Self::row_to_todo_list))
    }

    fn query_all_todo_lists(&self) -> Result<Vec<TodoList>, DatabaseError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, date FROM todo_lists ORDER BY id")?;
        let lists = decode_rows("plans", stmt.query_map([], Self::row_to_todo_list)?)?;
        Ok(lists)
    }

    /// Every plan in insertion order; empty if the read fails
    pub fn get_all_todo_lists(&self) -> Vec<TodoList> {
        or_empty("get_all_todo_lists", self.query_all_todo_lists())
    }
}
