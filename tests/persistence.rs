use std::path::Path;

use todoboard::app::App;
use todoboard::error::TodoError;
use todoboard::storage::{FileStore, STORAGE_KEY};
use todoboard::todo::{DEFAULT_PROJECT, Priority, Status};

fn store_file(dir: &Path) -> std::path::PathBuf {
    dir.join(format!("{STORAGE_KEY}.json"))
}

#[test]
fn state_survives_a_reopen() {
    let td = tempfile::tempdir().expect("tempdir");

    let mut app = App::open(FileStore::new(td.path().to_path_buf())).expect("open");
    app.create_project("Work").expect("create");
    app.create_project("Home").expect("create");
    let spec = app
        .add_task_to_project(
            "Write spec",
            "first draft",
            "2025-11-10",
            Priority::High,
            "Work",
            Status::InProgress,
        )
        .expect("add");
    app.add_task_to_project("Dishes", "", "2025-11-11", Priority::Low, "Home", Status::ToDo)
        .expect("add");
    app.add_task_to_project("Inbox", "", "2025-12-01", Priority::Medium, DEFAULT_PROJECT, Status::Completed)
        .expect("add");
    drop(app);

    let app = App::open(FileStore::new(td.path().to_path_buf())).expect("reopen");
    let names: Vec<String> = app.projects().map(|p| p.name().to_owned()).collect();
    assert_eq!(names, [DEFAULT_PROJECT, "Work", "Home"]);
    assert_eq!(app.task_count(), 3);

    let restored = app.get_task("Work", spec.id().as_str()).expect("task");
    assert_eq!(restored, &spec);
    assert_eq!(restored.description(), "first draft");
    assert_eq!(restored.status(), Status::InProgress);
}

#[test]
fn stored_records_use_camel_case_and_midnight_utc() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut app = App::open(FileStore::new(td.path().to_path_buf())).expect("open");
    app.add_task_to_project("t", "", "2025-11-10", Priority::High, DEFAULT_PROJECT, Status::ToDo)
        .expect("add");

    let raw = std::fs::read_to_string(store_file(td.path())).expect("read");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let todo = &value["projects"][0]["todos"][0];
    assert_eq!(value["projects"][0]["name"], DEFAULT_PROJECT);
    assert_eq!(todo["dueDate"], "2025-11-10T00:00:00.000Z");
    assert_eq!(todo["projectName"], DEFAULT_PROJECT);
    assert_eq!(todo["priority"], "high");
    assert_eq!(todo["status"], "To-Do");
}

#[test]
fn loads_legacy_records() {
    let td = tempfile::tempdir().expect("tempdir");
    let raw = r#"{
        "projects": [
            {
                "name": "Work",
                "todos": [
                    {
                        "title": "Old task",
                        "description": "",
                        "dueDate": "11/10/2025",
                        "priority": "low",
                        "projectName": "Work",
                        "status": "Completed"
                    }
                ]
            }
        ]
    }"#;
    std::fs::write(store_file(td.path()), raw).expect("write");

    let app = App::open(FileStore::new(td.path().to_path_buf())).expect("open");
    // Default is recreated when the snapshot lacks it.
    assert!(app.get_project(DEFAULT_PROJECT).is_some());
    let work = app.get_project("Work").expect("work");
    let todo = work.tasks().next().expect("task");
    assert_eq!(todo.title(), "Old task");
    assert_eq!(todo.description(), "No description");
    assert_eq!(todo.id().as_str().len(), 32);
    assert_eq!(
        todoboard::todo::date::format_iso_date(todo.due_date()),
        "2025-11-10"
    );
}

#[test]
fn records_without_project_name_join_their_project() {
    let td = tempfile::tempdir().expect("tempdir");
    let raw = r#"{"projects":[{"name":"Work","todos":[
        {"title":"Old","dueDate":"06/09/2025","priority":"high"},
        {"title":"Blank","dueDate":"2025-06-10","projectName":""}
    ]}]}"#;
    std::fs::write(store_file(td.path()), raw).expect("write");

    let app = App::open(FileStore::new(td.path().to_path_buf())).expect("open");
    let work = app.get_project("Work").expect("work");
    let titles: Vec<&str> = work.tasks().map(|t| t.title()).collect();
    assert_eq!(titles, ["Old", "Blank"]);
    assert!(work.tasks().all(|t| t.project_name() == "Work"));
    assert_eq!(work.tasks().next().map(|t| t.priority()), Some(Priority::High));
}

#[test]
fn corrupt_snapshot_leaves_memory_untouched() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut app = App::open(FileStore::new(td.path().to_path_buf())).expect("open");
    app.create_project("Work").expect("create");
    app.add_task_to_project("t", "", "2025-11-10", Priority::Low, "Work", Status::ToDo)
        .expect("add");

    std::fs::write(store_file(td.path()), "{ not json").expect("write");
    let err = app.load().unwrap_err();
    assert!(matches!(err, TodoError::CorruptSnapshot { .. }), "{err}");
    assert_eq!(app.project_count(), 2);
    assert_eq!(app.task_count(), 1);

    assert!(App::open(FileStore::new(td.path().to_path_buf())).is_err());
}

#[test]
fn custom_storage_key_writes_its_own_file() {
    let td = tempfile::tempdir().expect("tempdir");
    let mut app =
        App::open_with_key(FileStore::new(td.path().to_path_buf()), "work-board").expect("open");
    app.create_project("Work").expect("create");

    assert!(td.path().join("work-board.json").exists());
    assert!(!store_file(td.path()).exists());
}
