use rusqlite::params;
use tracing::{debug, warn};

use super::{decode_rows, optional, or_empty, require_id, Database, DatabaseError};
use crate::models::{Template, TemplateItem};

const TEMPLATE_ITEM_COLUMNS: &str = "id, template_id, title, description, priority, duration";

impl Database {
    fn row_to_template(row: &rusqlite::Row) -> Result<Template, rusqlite::Error> {
        Ok(Template {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }

    fn row_to_template_item(row: &rusqlite::Row) -> Result<TemplateItem, rusqlite::Error> {
        Ok(TemplateItem {
            id: Some(row.get(0)?),
            template_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            priority: row.get(4)?,
            duration: row.get(5)?,
        })
    }

    /// Insert a template and return it with its new id
    pub fn create_template(&self, mut template: Template) -> Result<Template, DatabaseError> {
        self.conn()
            .execute("INSERT INTO templates (name) VALUES (?1)", params![template.name])
            .inspect_err(|e| warn!(error = %e, "create_template failed"))?;
        let id = self.conn().last_insert_rowid();
        debug!(id, name = %template.name, "template created");
        template.id = Some(id);
        Ok(template)
    }

    /// Rename a template
    pub fn update_template(&self, template: &Template) -> Result<(), DatabaseError> {
        let id = require_id(template.id, "template")?;
        self.conn()
            .execute("UPDATE templates SET name = ?1 WHERE id = ?2", params![template.name, id])
            .inspect_err(|e| warn!(error = %e, id, "update_template failed"))?;
        Ok(())
    }

    /// Delete a template row only. Its items are left in place.
    pub fn delete_template(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM templates WHERE id = ?1", params![id])
            .inspect_err(|e| warn!(error = %e, id, "delete_template failed"))?;
        debug!(id, "template deleted");
        Ok(())
    }

    /// Delete a template and every item that belongs to it, atomically
    pub fn delete_template_cascade(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
        let items = tx.execute("DELETE FROM template_items WHERE template_id = ?1", params![id])?;
        tx.commit()?;
        debug!(id, items, "template deleted with its items");
        Ok(())
    }

    pub fn get_template(&self, id: i64) -> Result<Option<Template>, DatabaseError> {
        let mut stmt = self.conn().prepare("SELECT id, name FROM templates WHERE id = ?1")?;
        optional(stmt.query_row(params![id], Self::row_to_template))
    }

    fn query_all_templates(&self) -> Result<Vec<Template>, DatabaseError> {
        let mut stmt = self.conn().prepare("SELECT id, name FROM templates ORDER BY id")?;
        let templates = decode_rows("templates", stmt.query_map([], Self::row_to_template)?)?;
        Ok(templates)
    }

    /// Every template in insertion order; empty if the read fails
    pub fn get_all_templates(&self) -> Vec<Template> {
        or_empty("get_all_templates", self.query_all_templates())
    }

    /// Insert a template item and return it with its new id
    pub fn create_template_item(&self, mut item: TemplateItem) -> Result<TemplateItem, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO template_items (template_id, title, description, priority, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![item.template_id, item.title, item.description, item.priority, item.duration],
            )
            .inspect_err(|e| warn!(error = %e, template_id = item.template_id, "create_template_item failed"))?;
        item.id = Some(self.conn().last_insert_rowid());
        Ok(item)
    }

    pub fn update_template_item(&self, item: &TemplateItem) -> Result<(), DatabaseError> {
        let id = require_id(item.id, "template item")?;
        self.conn()
            .execute(
                "UPDATE template_items SET template_id = ?1, title = ?2, description = ?3,
                 priority = ?4, duration = ?5 WHERE id = ?6",
                params![item.template_id, item.title, item.description, item.priority, item.duration, id],
            )
            .inspect_err(|e| warn!(error = %e, id, "update_template_item failed"))?;
        Ok(())
    }

    pub fn delete_template_item(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM template_items WHERE id = ?1", params![id])
            .inspect_err(|e| warn!(error = %e, id, "delete_template_item failed"))?;
        Ok(())
    }

    /// Remove every item of a template, leaving the template row itself
    pub fn delete_template_items_for_template(&self, template_id: i64) -> Result<(), DatabaseError> {
        let removed = self
            .conn()
            .execute("DELETE FROM template_items WHERE template_id = ?1", params![template_id])
            .inspect_err(|e| warn!(error = %e, template_id, "delete_template_items_for_template failed"))?;
        debug!(template_id, removed, "template items deleted");
        Ok(())
    }

    pub fn get_template_item(&self, id: i64) -> Result<Option<TemplateItem>, DatabaseError> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TEMPLATE_ITEM_COLUMNS} FROM template_items WHERE id = ?1"
        ))?;
        optional(stmt.query_row(params![id], Self::row_to_template_item))
    }

    pub(crate) fn query_template_items(&self, template_id: Option<i64>) -> Result<Vec<TemplateItem>, DatabaseError> {
        if let Some(template_id) = template_id {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {TEMPLATE_ITEM_COLUMNS} FROM template_items WHERE template_id = ?1 ORDER BY id"
            ))?;
            let items = decode_rows("template items", stmt.query_map(params![template_id], Self::row_to_template_item)?)?;
            return Ok(items);
        }

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TEMPLATE_ITEM_COLUMNS} FROM template_items ORDER BY id"
        ))?;
        let items = decode_rows("template items", stmt.query_map([], Self::row_to_template_item)?)?;
        Ok(items)
    }

    /// Every template item across all templates
    pub fn get_all_template_items(&self) -> Vec<TemplateItem> {
        or_empty("get_all_template_items", self.query_template_items(None))
    }

    /// Items of one template, in insertion order; empty if the read fails
    pub fn get_items_for_template(&self, template_id: i64) -> Vec<TemplateItem> {
        or_empty("get_items_for_template", self.query_template_items(Some(template_id)))
    }
}
