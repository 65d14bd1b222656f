pub mod backup;
pub mod cli;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod queries;
pub mod templates;
pub mod utils;

pub use backup::{BackupError, RestoreMode};
pub use config::Config;
pub use database::{Database, DatabaseError};
pub use models::{Priority, Task, Template, TemplateItem, TodoItem, TodoList};
pub use utils::Profile;
