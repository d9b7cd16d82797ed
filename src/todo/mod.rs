#![forbid(unsafe_code)]

pub mod date;
pub mod model;
pub mod project;

pub use date::DueDateInput;
pub use model::{Priority, Status, ToDo, TodoId, TodoRecord};
pub use project::{Board, BoardColumn, DEFAULT_PROJECT, Project, ProjectRecord};
