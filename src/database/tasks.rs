use rusqlite::params;
use tracing::{debug, warn};

use super::{decode_rows, optional, or_empty, require_id, Database, DatabaseError};
use crate::models::Task;

const TASK_COLUMNS: &str = "id, title, description, deadline, priority, is_completed";

impl Database {
    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            deadline: row.get(3)?,
            priority: row.get(4)?,
            is_completed: row.get(5)?,
        })
    }

    /// Insert a task and return it with its new id
    pub fn create_task(&self, mut task: Task) -> Result<Task, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO tasks (title, description, deadline, priority, is_completed)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![task.title, task.description, task.deadline, task.priority, task.is_completed],
            )
            .inspect_err(|e| warn!(error = %e, "create_task failed"))?;
        let id = self.conn().last_insert_rowid();
        debug!(id, "task created");
        task.id = Some(id);
        Ok(task)
    }

    /// Overwrite every column of an existing task. Unknown ids change nothing.
    pub fn update_task(&self, task: &Task) -> Result<(), DatabaseError> {
        let id = require_id(task.id, "task")?;
        let changed = self
            .conn()
            .execute(
                "UPDATE tasks SET title = ?1, description = ?2, deadline = ?3,
                 priority = ?4, is_completed = ?5 WHERE id = ?6",
                params![task.title, task.description, task.deadline, task.priority, task.is_completed, id],
            )
            .inspect_err(|e| warn!(error = %e, id, "update_task failed"))?;
        debug!(id, changed, "task updated");
        Ok(())
    }

    /// Flip a task's completion flag without rewriting the rest of the row
    pub fn set_task_completed(&self, id: i64, completed: bool) -> Result<(), DatabaseError> {
        self.conn()
            .execute("UPDATE tasks SET is_completed = ?1 WHERE id = ?2", params![completed, id])
            .inspect_err(|e| warn!(error = %e, id, "set_task_completed failed"))?;
        Ok(())
    }

    /// Delete a task by ID
    pub fn delete_task(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .inspect_err(|e| warn!(error = %e, id, "delete_task failed"))?;
        debug!(id, "task deleted");
        Ok(())
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        optional(stmt.query_row(params![id], Self::row_to_task))
    }

    fn query_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))?;
        let tasks = decode_rows("tasks", stmt.query_map([], Self::row_to_task)?)?;
        Ok(tasks)
    }

    /// Every task in insertion order; empty if the read fails
    pub fn get_all_tasks(&self) -> Vec<Task> {
        or_empty("get_all_tasks", self.query_all_tasks())
    }
}
