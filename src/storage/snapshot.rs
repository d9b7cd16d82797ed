#![forbid(unsafe_code)]

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TodoError;
use crate::todo::{DEFAULT_PROJECT, Project, ProjectRecord};

pub const STORAGE_KEY: &str = "todoAppData";

/// Full persisted state: `{ "projects": [ { "name", "todos": [...] } ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

/// A validated project set ready to replace a registry's state.
#[derive(Debug, Clone)]
pub struct Restored {
    pub default: Project,
    pub others: IndexMap<String, Project>,
    pub synthesized_default: bool,
}

impl Snapshot {
    pub fn capture<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        Self {
            projects: projects.into_iter().map(Project::to_record).collect(),
        }
    }

    pub fn encode(&self) -> Result<String, TodoError> {
        serde_json::to_string(self).map_err(TodoError::Encode)
    }

    pub fn decode(key: &str, raw: &str) -> Result<Self, TodoError> {
        serde_json::from_str(raw).map_err(|source| TodoError::CorruptSnapshot {
            key: key.to_owned(),
            source,
        })
    }

    /// Validates every record and splits out the Default project, creating an
    /// empty one if the snapshot has none. Nothing is returned unless the whole
    /// snapshot is consistent.
    pub fn restore(self) -> Result<Restored, TodoError> {
        let mut default = None;
        let mut others = IndexMap::new();
        let mut seen_ids = HashSet::new();

        for record in self.projects {
            if record.name.trim().is_empty() {
                return Err(TodoError::validation("stored project has an empty name"));
            }
            let project = Project::from_record(record)?;
            for todo in project.tasks() {
                if !seen_ids.insert(todo.id().clone()) {
                    return Err(TodoError::validation(format!(
                        "to-do id '{}' is stored in more than one project",
                        todo.id()
                    )));
                }
            }

            let duplicate = if project.name() == DEFAULT_PROJECT {
                default.replace(project).is_some()
            } else {
                let name = project.name().to_owned();
                others.insert(name, project).is_some()
            };
            if duplicate {
                return Err(TodoError::validation(
                    "stored data lists the same project name twice",
                ));
            }
        }

        let synthesized_default = default.is_none();
        if synthesized_default {
            warn!("stored data has no Default project; creating an empty one");
        }
        Ok(Restored {
            default: default.unwrap_or_else(|| Project::new(DEFAULT_PROJECT)),
            others,
            synthesized_default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_documented_layout() {
        let raw = r#"{
            "projects": [
                { "name": "Default", "todos": [] },
                { "name": "Work", "todos": [
                    { "id": "abc", "title": "Write spec", "description": "No description",
                      "dueDate": "2025-11-10T00:00:00.000Z", "priority": "high",
                      "projectName": "Work", "status": "To-Do" }
                ] }
            ]
        }"#;
        let restored = Snapshot::decode(STORAGE_KEY, raw).unwrap().restore().unwrap();
        assert!(!restored.synthesized_default);
        assert!(restored.default.is_empty());
        let work = restored.others.get("Work").unwrap();
        assert_eq!(work.get_task("abc").unwrap().title(), "Write spec");
    }

    #[test]
    fn missing_default_is_synthesized() {
        let raw = r#"{ "projects": [ { "name": "Work", "todos": [] } ] }"#;
        let restored = Snapshot::decode(STORAGE_KEY, raw).unwrap().restore().unwrap();
        assert!(restored.synthesized_default);
        assert_eq!(restored.default.name(), DEFAULT_PROJECT);
        assert_eq!(restored.others.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_corrupt_snapshot() {
        let err = Snapshot::decode(STORAGE_KEY, "{ nope").unwrap_err();
        assert!(matches!(err, TodoError::CorruptSnapshot { .. }));
    }

    #[test]
    fn repeated_project_names_and_ids_are_rejected() {
        let raw = r#"{ "projects": [ { "name": "A" }, { "name": "A" } ] }"#;
        let err = Snapshot::decode(STORAGE_KEY, raw).unwrap().restore().unwrap_err();
        assert!(err.is_validation());

        let todo = r#"{ "id": "same", "title": "t", "dueDate": "2025-01-01",
                        "projectName": "x" }"#;
        let raw = format!(
            r#"{{ "projects": [ {{ "name": "A", "todos": [{todo}] }},
                                {{ "name": "B", "todos": [{todo}] }} ] }}"#
        );
        let err = Snapshot::decode(STORAGE_KEY, &raw).unwrap().restore().unwrap_err();
        assert!(err.is_validation());
    }
}
