#![forbid(unsafe_code)]

//! Bulk creation of to-dos from a YAML file:
//!
//! ```yaml
//! version: "1.0"
//! project: Work            # used when an entry names none
//! tasks:
//!   - title: Write spec
//!     due: 2025-11-10
//!     priority: high
//!   - title: Review
//!     due: 2025-11-12
//!     project: Default
//!     status: In Progress
//! ```
//!
//! Every entry is checked before any is added, and the batch is stored with a
//! single write.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use time::Date;

use crate::app::App;
use crate::error::TodoError;
use crate::storage::KeyValueStore;
use crate::todo::{DEFAULT_PROJECT, Priority, Status, ToDo, date};

#[derive(Debug, Deserialize)]
struct TaskFile {
    version: String,
    #[serde(default)]
    project: String,
    tasks: Vec<TaskFileEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskFileEntry {
    title: String,
    #[serde(default)]
    description: String,
    due: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    project: String,
}

struct Prepared {
    title: String,
    description: String,
    due: Date,
    priority: Priority,
    status: Status,
    project: String,
}

pub fn import_file<S: KeyValueStore>(app: &mut App<S>, path: &Path) -> anyhow::Result<Vec<ToDo>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read task file: {}", path.display()))?;
    import_str(app, &data).with_context(|| format!("failed to import {}", path.display()))
}

pub fn import_str<S: KeyValueStore>(app: &mut App<S>, data: &str) -> anyhow::Result<Vec<ToDo>> {
    let def: TaskFile = serde_yaml::from_str(data).context("failed to parse YAML")?;
    if def.version.trim() != "1.0" {
        anyhow::bail!(
            "unsupported task file version: {} (expected 1.0)",
            def.version
        );
    }

    let file_project = match def.project.trim() {
        "" => DEFAULT_PROJECT,
        p => p,
    };
    let mut prepared = Vec::with_capacity(def.tasks.len());
    for (i, entry) in def.tasks.into_iter().enumerate() {
        let item = prepare(app, entry, file_project).with_context(|| format!("task #{}", i + 1))?;
        prepared.push(item);
    }

    let created: Vec<ToDo> = prepared
        .into_iter()
        .map(|p| ToDo::new(p.title, p.description, p.due, p.priority, p.project, p.status))
        .collect::<Result<_, _>>()?;
    app.add_tasks(created.clone())?;
    Ok(created)
}

fn prepare<S: KeyValueStore>(
    app: &App<S>,
    entry: TaskFileEntry,
    file_project: &str,
) -> Result<Prepared, TodoError> {
    if entry.title.trim().is_empty() {
        return Err(TodoError::validation("title is required"));
    }
    let project = match entry.project.trim() {
        "" => file_project.to_owned(),
        p => p.to_owned(),
    };
    if app.get_project(&project).is_none() {
        return Err(TodoError::ProjectNotFound(project));
    }
    Ok(Prepared {
        title: entry.title,
        description: entry.description,
        due: date::parse_picker_date(&entry.due)?,
        priority: entry
            .priority
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
        status: entry
            .status
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default(),
        project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_every_entry() {
        let mut app = App::new();
        app.create_project("Work").unwrap();
        let yaml = r#"
version: "1.0"
project: Work
tasks:
  - title: Write spec
    due: 2025-11-10
    priority: high
  - title: Review
    due: "2025-11-12"
    project: Default
    status: In Progress
"#;
        let created = import_str(&mut app, yaml).unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].project_name(), "Work");
        assert_eq!(created[0].priority(), Priority::High);
        assert_eq!(created[0].status(), Status::ToDo);
        assert_eq!(created[1].project_name(), DEFAULT_PROJECT);
        assert_eq!(created[1].status(), Status::InProgress);
        assert_eq!(created[1].priority(), Priority::Medium);
        assert_eq!(app.task_count(), 2);
    }

    #[test]
    fn one_bad_entry_imports_nothing() {
        let mut app = App::new();
        let yaml = r#"
version: "1.0"
tasks:
  - title: fine
    due: 2025-11-10
  - title: broken
    due: 2025-02-30
"#;
        assert!(import_str(&mut app, yaml).is_err());
        assert_eq!(app.task_count(), 0);

        let yaml = r#"
version: "1.0"
tasks:
  - title: fine
    due: 2025-11-10
    project: Nope
"#;
        assert!(import_str(&mut app, yaml).is_err());
        assert_eq!(app.task_count(), 0);
    }

    #[test]
    fn imported_todos_are_stored_in_file_order() {
        let mut app = App::new();
        let yaml = r#"
version: "1.0"
tasks:
  - title: one
    due: 2025-11-10
  - title: two
    due: 2025-11-11
"#;
        import_str(&mut app, yaml).unwrap();
        let reopened = App::open(app.store().clone()).unwrap();
        let titles: Vec<&str> = reopened.default_project().tasks().map(ToDo::title).collect();
        assert_eq!(titles, ["one", "two"]);
    }

    #[test]
    fn rejects_unknown_versions() {
        let mut app = App::new();
        let yaml = "version: \"2.0\"\ntasks: []\n";
        assert!(import_str(&mut app, yaml).is_err());
    }
}
