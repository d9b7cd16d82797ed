#![forbid(unsafe_code)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TodoError;
use crate::todo::model::{Status, ToDo, TodoId, TodoRecord};

/// The protected project every registry holds.
pub const DEFAULT_PROJECT: &str = "Default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default)]
    pub todos: Vec<TodoRecord>,
}

/// A named collection of tasks, keyed by task id in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    todos: IndexMap<TodoId, ToDo>,
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            todos: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Inserts `todo` under its id. Returns the task it replaced, if the id
    /// was already present.
    pub fn add_task(&mut self, todo: ToDo) -> Option<ToDo> {
        self.todos.insert(todo.id().clone(), todo)
    }

    pub fn remove_task(&mut self, id: &str) -> bool {
        self.take_task(id).is_some()
    }

    pub fn take_task(&mut self, id: &str) -> Option<ToDo> {
        self.todos.shift_remove(id)
    }

    /// Like [`Project::take_task`], also returning the position the task held.
    pub fn take_task_full(&mut self, id: &str) -> Option<(usize, ToDo)> {
        self.todos
            .shift_remove_full(id)
            .map(|(index, _, todo)| (index, todo))
    }

    /// Inserts `todo` at `index`, or at the end when `index` is past it.
    pub fn insert_task_at(&mut self, index: usize, todo: ToDo) {
        let index = index.min(self.todos.len());
        self.todos.shift_insert(index, todo.id().clone(), todo);
    }

    #[must_use]
    pub fn get_task(&self, id: &str) -> Option<&ToDo> {
        self.todos.get(id)
    }

    pub fn get_task_mut(&mut self, id: &str) -> Option<&mut ToDo> {
        self.todos.get_mut(id)
    }

    #[must_use]
    pub fn contains_task(&self, id: &str) -> bool {
        self.todos.contains_key(id)
    }

    /// Owned copy of the current tasks.
    #[must_use]
    pub fn list_tasks(&self) -> Vec<ToDo> {
        self.todos.values().cloned().collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ToDo> {
        self.todos.values()
    }

    /// Tasks grouped by status column, each column sorted by priority (high
    /// first) and then by due date (earliest first).
    #[must_use]
    pub fn board(&self) -> Board<'_> {
        let columns = Status::ALL
            .into_iter()
            .map(|status| {
                let mut todos: Vec<&ToDo> =
                    self.tasks().filter(|t| t.status() == status).collect();
                todos.sort_by(|a, b| {
                    b.priority()
                        .cmp(&a.priority())
                        .then_with(|| a.due_date().cmp(&b.due_date()))
                });
                BoardColumn { status, todos }
            })
            .collect();
        Board {
            project: &self.name,
            columns,
        }
    }

    #[must_use]
    pub fn to_record(&self) -> ProjectRecord {
        ProjectRecord {
            name: self.name.clone(),
            todos: self.tasks().map(ToDo::to_record).collect(),
        }
    }

    /// Rebuilds a project from its stored shape. Tasks whose `projectName`
    /// disagrees with the containing project are re-pointed at it; a repeated
    /// task id is rejected.
    pub fn from_record(record: ProjectRecord) -> Result<Self, TodoError> {
        let mut project = Self::new(record.name);
        for mut record in record.todos {
            if record.project_name != project.name {
                warn!(
                    id = record.id.as_deref().unwrap_or(""),
                    stored = %record.project_name,
                    project = %project.name,
                    "to-do project name disagrees with its project; correcting"
                );
                record.project_name.clone_from(&project.name);
            }
            let todo = ToDo::from_record(record)?;
            if project.contains_task(todo.id().as_str()) {
                return Err(TodoError::validation(format!(
                    "to-do id '{}' appears twice in project '{}'",
                    todo.id(),
                    project.name
                )));
            }
            project.add_task(todo);
        }
        Ok(project)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project: {}", self.name)?;
        if self.is_empty() {
            return write!(f, "\n  No to-dos");
        }
        for todo in self.tasks() {
            write!(f, "\n  - {todo}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Board<'a> {
    pub project: &'a str,
    pub columns: Vec<BoardColumn<'a>>,
}

#[derive(Debug, Clone)]
pub struct BoardColumn<'a> {
    pub status: Status,
    pub todos: Vec<&'a ToDo>,
}
