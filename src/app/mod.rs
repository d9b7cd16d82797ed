#![forbid(unsafe_code)]

//! The application registry: every project, the protected Default project, and
//! the task lifecycle operations. Each successful mutation writes a full
//! snapshot to the backing store before returning; a failed write undoes the
//! mutation so memory never runs ahead of storage.

pub mod import;

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::TodoError;
use crate::storage::{KeyValueStore, MemoryStore, STORAGE_KEY, Snapshot};
use crate::todo::{DEFAULT_PROJECT, DueDateInput, Priority, Project, Status, ToDo};

/// Result of [`App::delete_project`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { tasks_removed: usize },
    /// The Default project cannot be deleted.
    Protected,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub destination: String,
    /// The requested destination did not exist and Default was used instead.
    pub fell_back: bool,
}

/// A set of optional changes applied to one task as a unit.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<DueDateInput>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub project: Option<String>,
}

impl TaskEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.project.is_none()
    }
}

#[derive(Debug)]
pub struct App<S = MemoryStore> {
    default: Project,
    projects: IndexMap<String, Project>,
    store: S,
    key: String,
}

impl App<MemoryStore> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for App<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeyValueStore> App<S> {
    /// A registry holding only the Default project. Nothing is read from
    /// `store` until [`App::load`].
    #[must_use]
    pub fn with_store(store: S) -> Self {
        Self::with_store_key(store, STORAGE_KEY)
    }

    #[must_use]
    pub fn with_store_key(store: S, key: impl Into<String>) -> Self {
        Self {
            default: Project::new(DEFAULT_PROJECT),
            projects: IndexMap::new(),
            store,
            key: key.into(),
        }
    }

    pub fn open(store: S) -> Result<Self, TodoError> {
        Self::open_with_key(store, STORAGE_KEY)
    }

    pub fn open_with_key(store: S, key: impl Into<String>) -> Result<Self, TodoError> {
        let mut app = Self::with_store_key(store, key);
        app.load()?;
        Ok(app)
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the in-memory projects with the stored snapshot. Returns
    /// `false` (and changes nothing) when the store has no entry. A snapshot
    /// that fails validation is rejected as a whole.
    pub fn load(&mut self) -> Result<bool, TodoError> {
        let Some(raw) = self.store.get(&self.key)? else {
            debug!(key = %self.key, "no stored data; starting fresh");
            return Ok(false);
        };
        let restored = Snapshot::decode(&self.key, &raw)?.restore()?;
        self.default = restored.default;
        self.projects = restored.others;
        info!(
            key = %self.key,
            projects = self.project_count(),
            todos = self.task_count(),
            synthesized_default = restored.synthesized_default,
            "loaded stored data"
        );
        Ok(true)
    }

    /// Writes the current state. Needed after mutating a task through
    /// [`App::task_mut`].
    pub fn save(&mut self) -> Result<(), TodoError> {
        let raw = Snapshot::capture(self.projects()).encode()?;
        self.store.set(&self.key, &raw)?;
        debug!(key = %self.key, bytes = raw.len(), "persisted snapshot");
        Ok(())
    }

    pub fn create_project(&mut self, name: &str) -> Result<&Project, TodoError> {
        if name.trim().is_empty() {
            return Err(TodoError::validation("project name is required"));
        }
        if self.get_project(name).is_some() {
            return Err(TodoError::DuplicateProject(name.to_owned()));
        }
        let (index, _) = self
            .projects
            .insert_full(name.to_owned(), Project::new(name));
        if let Err(e) = self.save() {
            self.projects.shift_remove_index(index);
            return Err(e);
        }
        info!(project = name, "created project");
        Ok(&self.projects[index])
    }

    pub fn delete_project(&mut self, name: &str) -> Result<DeleteOutcome, TodoError> {
        if name == DEFAULT_PROJECT {
            info!("refusing to delete the Default project");
            return Ok(DeleteOutcome::Protected);
        }
        let Some((index, key, project)) = self.projects.shift_remove_full(name) else {
            return Ok(DeleteOutcome::Missing);
        };
        let tasks_removed = project.len();
        if let Err(e) = self.save() {
            self.projects.shift_insert(index, key, project);
            return Err(e);
        }
        info!(project = name, tasks_removed, "deleted project");
        Ok(DeleteOutcome::Deleted { tasks_removed })
    }

    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&Project> {
        if name == DEFAULT_PROJECT {
            return Some(&self.default);
        }
        self.projects.get(name)
    }

    pub fn get_project_mut(&mut self, name: &str) -> Option<&mut Project> {
        if name == DEFAULT_PROJECT {
            return Some(&mut self.default);
        }
        self.projects.get_mut(name)
    }

    #[must_use]
    pub fn default_project(&self) -> &Project {
        &self.default
    }

    /// Default first, then the rest in creation order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        std::iter::once(&self.default).chain(self.projects.values())
    }

    #[must_use]
    pub fn list_projects(&self) -> Vec<Project> {
        self.projects().cloned().collect()
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        1 + self.projects.len()
    }

    #[must_use]
    pub fn task_count(&self) -> usize {
        self.projects().map(Project::len).sum()
    }

    #[must_use]
    pub fn get_task(&self, project: &str, id: &str) -> Option<&ToDo> {
        self.get_project(project)?.get_task(id)
    }

    /// Direct access for in-place edits. Call [`App::save`] afterwards.
    pub fn task_mut(&mut self, project: &str, id: &str) -> Option<&mut ToDo> {
        self.get_project_mut(project)?.get_task_mut(id)
    }

    /// Finds a task anywhere by full id or by an unambiguous id prefix.
    pub fn find_task(&self, id_or_prefix: &str) -> Result<&ToDo, TodoError> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(TodoError::validation("to-do id is required"));
        }
        if let Some(todo) = self.projects().find_map(|p| p.get_task(needle)) {
            return Ok(todo);
        }
        let mut matches = self
            .projects()
            .flat_map(Project::tasks)
            .filter(|t| t.id().as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(todo), None) => Ok(todo),
            (None, _) => Err(TodoError::NoMatchingTask(needle.to_owned())),
            (Some(_), Some(_)) => Err(TodoError::validation(format!(
                "to-do id prefix '{needle}' is ambiguous"
            ))),
        }
    }

    pub fn add_task_to_project(
        &mut self,
        title: &str,
        description: &str,
        due: impl Into<DueDateInput>,
        priority: Priority,
        project_name: &str,
        status: Status,
    ) -> Result<ToDo, TodoError> {
        if self.get_project(project_name).is_none() {
            return Err(TodoError::ProjectNotFound(project_name.to_owned()));
        }
        let due_date = due.into().resolve()?;
        let todo = ToDo::new(title, description, due_date, priority, project_name, status)?;
        let id = todo.id().clone();

        let project = self
            .get_project_mut(project_name)
            .ok_or_else(|| TodoError::ProjectNotFound(project_name.to_owned()))?;
        project.add_task(todo.clone());
        if let Err(e) = self.save() {
            if let Some(p) = self.get_project_mut(project_name) {
                p.remove_task(id.as_str());
            }
            return Err(e);
        }
        debug!(project = project_name, id = %id, "added to-do");
        Ok(todo)
    }

    /// Inserts already-built tasks into their projects and persists once.
    /// Every target project must exist; a failed write removes the whole
    /// batch again.
    pub fn add_tasks(&mut self, todos: Vec<ToDo>) -> Result<(), TodoError> {
        if let Some(missing) = todos
            .iter()
            .find(|t| self.get_project(t.project_name()).is_none())
        {
            return Err(TodoError::ProjectNotFound(missing.project_name().to_owned()));
        }
        let placed: Vec<(String, String)> = todos
            .iter()
            .map(|t| (t.project_name().to_owned(), t.id().to_string()))
            .collect();
        for todo in todos {
            if let Some(p) = self.get_project_mut(todo.project_name()) {
                p.add_task(todo);
            }
        }
        if let Err(e) = self.save() {
            for (project, id) in &placed {
                if let Some(p) = self.get_project_mut(project) {
                    p.remove_task(id);
                }
            }
            return Err(e);
        }
        debug!(count = placed.len(), "added to-dos");
        Ok(())
    }

    /// Moves a task between projects. An unknown destination falls back to
    /// Default. Either the whole move is applied and stored, or nothing is.
    pub fn move_task(
        &mut self,
        id: &str,
        from: &str,
        to: &str,
    ) -> Result<MoveOutcome, TodoError> {
        self.require_task(from, id)?;
        let outcome = self.resolve_destination(to);

        let index = self.relocate(id, from, &outcome.destination);
        if let Err(e) = self.save() {
            self.relocate_to(id, &outcome.destination, from, index);
            return Err(e);
        }
        info!(
            id,
            from,
            to = %outcome.destination,
            fell_back = outcome.fell_back,
            "moved to-do"
        );
        Ok(outcome)
    }

    pub fn update_task_status(
        &mut self,
        id: &str,
        project: &str,
        status: Status,
    ) -> Result<(), TodoError> {
        let todo = self.require_task_mut(project, id)?;
        let previous = todo.status();
        todo.update_status(status);
        if let Err(e) = self.save() {
            if let Some(todo) = self.task_mut(project, id) {
                todo.update_status(previous);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes one task. `Ok(false)` when the project exists but the task does
    /// not.
    pub fn remove_task(&mut self, project: &str, id: &str) -> Result<bool, TodoError> {
        let p = self
            .get_project_mut(project)
            .ok_or_else(|| TodoError::ProjectNotFound(project.to_owned()))?;
        let Some((index, todo)) = p.take_task_full(id) else {
            return Ok(false);
        };
        if let Err(e) = self.save() {
            if let Some(p) = self.get_project_mut(project) {
                p.insert_task_at(index, todo);
            }
            return Err(e);
        }
        debug!(project, id, "removed to-do");
        Ok(true)
    }

    /// Applies every change in `edit` or none of them. A project change follows
    /// the [`App::move_task`] rules, including the fallback to Default.
    pub fn edit_task(
        &mut self,
        id: &str,
        project: &str,
        edit: TaskEdit,
    ) -> Result<ToDo, TodoError> {
        let original = self.require_task(project, id)?.clone();

        let mut updated = original.clone();
        if let Some(title) = edit.title {
            updated.update_title(title)?;
        }
        if let Some(description) = edit.description {
            updated.update_description(description);
        }
        if let Some(due) = edit.due {
            updated.update_due_date(due)?;
        }
        if let Some(priority) = edit.priority {
            updated.update_priority(priority);
        }
        if let Some(status) = edit.status {
            updated.update_status(status);
        }

        let destination = edit
            .project
            .filter(|p| p != project)
            .map(|p| self.resolve_destination(&p))
            .filter(|o| o.destination != project);
        if let Some(outcome) = &destination
            && outcome.fell_back
        {
            warn!(id, "edit target project does not exist; moving to Default");
        }

        if let Some(slot) = self.task_mut(project, id) {
            *slot = updated;
        }
        let mut current_project = project.to_owned();
        let mut index = None;
        if let Some(outcome) = &destination {
            index = self.relocate(id, project, &outcome.destination);
            current_project.clone_from(&outcome.destination);
        }

        if let Err(e) = self.save() {
            if destination.is_some() {
                self.relocate_to(id, &current_project, project, index);
            }
            if let Some(slot) = self.task_mut(project, id) {
                *slot = original;
            }
            return Err(e);
        }

        self.get_task(&current_project, id)
            .cloned()
            .ok_or_else(|| TodoError::TaskNotFound {
                project: current_project.clone(),
                id: id.to_owned(),
            })
    }

    fn require_task(&self, project: &str, id: &str) -> Result<&ToDo, TodoError> {
        self.get_project(project)
            .ok_or_else(|| TodoError::ProjectNotFound(project.to_owned()))?
            .get_task(id)
            .ok_or_else(|| TodoError::TaskNotFound {
                project: project.to_owned(),
                id: id.to_owned(),
            })
    }

    fn require_task_mut(&mut self, project: &str, id: &str) -> Result<&mut ToDo, TodoError> {
        self.get_project_mut(project)
            .ok_or_else(|| TodoError::ProjectNotFound(project.to_owned()))?
            .get_task_mut(id)
            .ok_or_else(|| TodoError::TaskNotFound {
                project: project.to_owned(),
                id: id.to_owned(),
            })
    }

    fn resolve_destination(&self, to: &str) -> MoveOutcome {
        match self.get_project(to) {
            Some(p) => MoveOutcome {
                destination: p.name().to_owned(),
                fell_back: false,
            },
            None => MoveOutcome {
                destination: DEFAULT_PROJECT.to_owned(),
                fell_back: true,
            },
        }
    }

    /// Moves `id` from `from` to the end of `to` in memory, keeping
    /// `project_name` in step. Returns the position it held in `from`.
    fn relocate(&mut self, id: &str, from: &str, to: &str) -> Option<usize> {
        self.relocate_to(id, from, to, None)
    }

    /// Reverses [`App::relocate`], putting the task back at `index`.
    fn relocate_to(
        &mut self,
        id: &str,
        from: &str,
        to: &str,
        index: Option<usize>,
    ) -> Option<usize> {
        if from == to || self.get_project(to).is_none() {
            return None;
        }
        let (old, mut todo) = self.get_project_mut(from)?.take_task_full(id)?;
        todo.update_project(to);
        if let Some(dest) = self.get_project_mut(to) {
            match index {
                Some(i) => dest.insert_task_at(i, todo),
                None => {
                    dest.add_task(todo);
                }
            }
        }
        Some(old)
    }
}

impl<S> fmt::Display for App<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default)?;
        for project in self.projects.values() {
            write!(f, "\n\n{project}")?;
        }
        Ok(())
    }
}
