use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default length of a plan item, in minutes
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Priority levels, stored as a flat ordinal 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    None,
    Urgent,
    Important,
    UrgentImportant,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::None,
        Priority::Urgent,
        Priority::Important,
        Priority::UrgentImportant,
    ];

    pub fn as_i64(self) -> i64 {
        match self {
            Priority::None => 0,
            Priority::Urgent => 1,
            Priority::Important => 2,
            Priority::UrgentImportant => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Priority::None),
            1 => Some(Priority::Urgent),
            2 => Some(Priority::Important),
            3 => Some(Priority::UrgentImportant),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Urgent => "Urgent",
            Priority::Important => "Important",
            Priority::UrgentImportant => "Urgent & Important",
        }
    }

    /// Parse a priority from a CLI-style string: an ordinal ("0".."3") or a name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Self::from_i64(n);
        }
        match s.to_lowercase().as_str() {
            "none" => Some(Priority::None),
            "urgent" => Some(Priority::Urgent),
            "important" => Some(Priority::Important),
            "both" | "urgent&important" | "urgent-important" => Some(Priority::UrgentImportant),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let n = i64::column_result(value)?;
        Priority::from_i64(n).ok_or(FromSqlError::OutOfRange(n))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub priority: Priority,
    pub is_completed: bool,
}

/// A plan: a named list of items for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: Option<i64>,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Option<i64>,
    pub list_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub duration: u32, // minutes
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub id: Option<i64>,
    pub template_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub duration: u32,
}

impl Task {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            description: None,
            deadline: None,
            priority: Priority::None,
            is_completed: false,
        }
    }
}

impl TodoList {
    pub fn new(name: String, date: NaiveDate) -> Self {
        Self { id: None, name, date }
    }
}

impl TodoItem {
    pub fn new(list_id: i64, title: String) -> Self {
        Self {
            id: None,
            list_id,
            title,
            description: None,
            priority: Priority::None,
            duration: DEFAULT_DURATION_MINUTES,
            completed: false,
        }
    }

    /// Build a fresh, uncompleted plan item from a template item
    pub fn from_template_item(list_id: i64, item: &TemplateItem) -> Self {
        Self {
            id: None,
            list_id,
            title: item.title.clone(),
            description: item.description.clone(),
            priority: item.priority,
            duration: item.duration,
            completed: false,
        }
    }
}

impl Template {
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }
}

impl TemplateItem {
    pub fn new(template_id: i64, title: String) -> Self {
        Self {
            id: None,
            template_id,
            title,
            description: None,
            priority: Priority::None,
            duration: DEFAULT_DURATION_MINUTES,
        }
    }

    /// Copy a plan item into a template, dropping its completion state
    pub fn from_todo_item(template_id: i64, item: &TodoItem) -> Self {
        Self {
            id: None,
            template_id,
            title: item.title.clone(),
            description: item.description.clone(),
            priority: item.priority,
            duration: item.duration,
        }
    }
}
