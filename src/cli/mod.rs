#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{ArgAction, CommandFactory as _, Parser, Subcommand};
use tracing::debug;

use crate::app::import;
use crate::app::{App, DeleteOutcome, TaskEdit};
use crate::config::{self, Config};
use crate::logging;
use crate::output::board::{self, Style};
use crate::output::table::Table;
use crate::storage::{FileStore, Snapshot};
use crate::todo::{DEFAULT_PROJECT, DueDateInput, Priority, Status, ToDo, TodoRecord};

#[derive(Debug, Parser)]
#[command(
    name = "todoboard",
    version,
    about = "Projects, to-dos and a status board in the terminal"
)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Project(ProjectArgs),
    Todo(TodoArgs),
    Board(BoardArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub cmd: ProjectCmd,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCmd {
    /// Create an empty project
    Add(ProjectAddArgs),
    /// Delete a project and every to-do in it
    #[command(alias = "remove")]
    Rm(ProjectRmArgs),
    /// List projects with per-status counts
    #[command(alias = "ls")]
    List(OutputArgs),
}

#[derive(Debug, Parser)]
pub struct ProjectAddArgs {
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct ProjectRmArgs {
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Output in JSON format
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output in CSV format
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct TodoArgs {
    #[command(subcommand)]
    pub cmd: TodoCmd,
}

#[derive(Debug, Subcommand)]
pub enum TodoCmd {
    Add(TodoAddArgs),
    #[command(alias = "ls")]
    List(TodoListArgs),
    Show(TodoShowArgs),
    Edit(TodoEditArgs),
    Move(TodoMoveArgs),
    Status(TodoStatusArgs),
    #[command(alias = "remove")]
    Rm(TodoShowArgs),
    /// Create to-dos from a YAML file
    Import(TodoImportArgs),
}

#[derive(Debug, Parser)]
pub struct TodoAddArgs {
    pub title: String,
    /// Due date (YYYY-MM-DD)
    #[arg(short = 'd', long = "due")]
    pub due: String,
    #[arg(long = "description", default_value = "")]
    pub description: String,
    /// low, medium or high
    #[arg(short = 'p', long = "priority", value_parser = parse_priority_arg, default_value = "medium")]
    pub priority: Priority,
    /// todo, in-progress or completed
    #[arg(short = 's', long = "status", value_parser = parse_status_arg, default_value = "todo")]
    pub status: Status,
    #[arg(short = 'P', long = "project", default_value = DEFAULT_PROJECT)]
    pub project: String,
}

#[derive(Debug, Parser)]
pub struct TodoListArgs {
    /// Only list to-dos in this project
    #[arg(short = 'P', long = "project")]
    pub project: Option<String>,
    /// Only list to-dos with this status
    #[arg(short = 's', long = "status", value_parser = parse_status_arg)]
    pub status: Option<Status>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser)]
pub struct TodoShowArgs {
    /// Full id or unique id prefix
    pub id: String,
}

#[derive(Debug, Parser)]
pub struct TodoEditArgs {
    /// Full id or unique id prefix
    pub id: String,
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,
    #[arg(long = "description")]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(short = 'd', long = "due")]
    pub due: Option<String>,
    #[arg(short = 'p', long = "priority", value_parser = parse_priority_arg)]
    pub priority: Option<Priority>,
    #[arg(short = 's', long = "status", value_parser = parse_status_arg)]
    pub status: Option<Status>,
    /// Move to this project (unknown names fall back to Default)
    #[arg(short = 'P', long = "project")]
    pub project: Option<String>,
}

#[derive(Debug, Parser)]
pub struct TodoMoveArgs {
    /// Full id or unique id prefix
    pub id: String,
    /// Destination project (unknown names fall back to Default)
    #[arg(long = "to", default_value = DEFAULT_PROJECT)]
    pub to: String,
}

#[derive(Debug, Parser)]
pub struct TodoStatusArgs {
    /// Full id or unique id prefix
    pub id: String,
    #[arg(value_parser = parse_status_arg)]
    pub status: Status,
}

#[derive(Debug, Parser)]
pub struct TodoImportArgs {
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct BoardArgs {
    /// Project to show (unknown names fall back to Default)
    #[arg(short = 'P', long = "project", default_value = DEFAULT_PROJECT)]
    pub project: String,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = || config::resolve_path(cli.config.as_deref());
    match cli.cmd {
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "todoboard", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Version) => Ok(cmd_version()),
        Some(Commands::Config(args)) => {
            logging::init(cli.verbose, &config::LogConfig::default().level);
            cmd_config(&config_path()?, args.cmd)
        }
        cmd => {
            let config_path = config_path()?;
            let cfg = config::load_at(&config_path)?;
            logging::init(cli.verbose, &cfg.log.level);
            debug!(config = %config_path.display(), "loaded configuration");
            let mut app = open_app(&cfg)?;
            let style = Style::from(&cfg.ui);
            match cmd {
                Some(Commands::Board(args)) => cmd_board(&app, &args.project, style),
                Some(Commands::Project(args)) => cmd_project(&mut app, args.cmd),
                Some(Commands::Todo(args)) => cmd_todo(&mut app, args.cmd, style),
                // No subcommand shows the Default board.
                _ => cmd_board(&app, DEFAULT_PROJECT, style),
            }
        }
    }
}

fn open_app(cfg: &Config) -> anyhow::Result<App<FileStore>> {
    let store = FileStore::new(cfg.data_dir()?);
    let dir = store.dir().display().to_string();
    App::open_with_key(store, cfg.storage.key.as_str())
        .with_context(|| format!("failed to load to-dos from {dir}"))
}

fn cmd_config(path: &Path, cmd: ConfigCmd) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCmd::List => {
            print!("{}", config::list_resolved_toml(path)?);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Set(set) => {
            config::set_value_string_at_path(path, &set.key, &set.value)?;
            println!("Set {} = {}", set.key, set.value);
            Ok(ExitCode::SUCCESS)
        }
        ConfigCmd::Get(get) => match config::get_value_string_at_path(path, &get.key)? {
            Some(v) => {
                println!("{v}");
                Ok(ExitCode::SUCCESS)
            }
            None => anyhow::bail!(
                "configuration key '{}' not found - use 'todoboard config list' to see available keys",
                get.key
            ),
        },
    }
}

fn cmd_board(app: &App<FileStore>, project: &str, style: Style) -> anyhow::Result<ExitCode> {
    let shown = match app.get_project(project) {
        Some(p) => p,
        None => {
            eprintln!("Project '{project}' not found; showing {DEFAULT_PROJECT}");
            app.default_project()
        }
    };
    print!("{}", board::render_board(&shown.board(), style));
    Ok(ExitCode::SUCCESS)
}

fn cmd_project(app: &mut App<FileStore>, cmd: ProjectCmd) -> anyhow::Result<ExitCode> {
    match cmd {
        ProjectCmd::Add(args) => {
            let project = app.create_project(&args.name)?;
            println!("Created project '{}'", project.name());
            Ok(ExitCode::SUCCESS)
        }
        ProjectCmd::Rm(args) => match app.delete_project(&args.name)? {
            DeleteOutcome::Deleted { tasks_removed } => {
                println!(
                    "Deleted project '{}' and {tasks_removed} to-do(s)",
                    args.name
                );
                Ok(ExitCode::SUCCESS)
            }
            DeleteOutcome::Protected => {
                eprintln!("The {DEFAULT_PROJECT} project cannot be deleted");
                Ok(ExitCode::from(1))
            }
            DeleteOutcome::Missing => {
                eprintln!("Project '{}' not found", args.name);
                Ok(ExitCode::from(1))
            }
        },
        ProjectCmd::List(out) => {
            if out.json {
                print_json(&Snapshot::capture(app.projects()))?;
                return Ok(ExitCode::SUCCESS);
            }
            let mut table = Table::new(["NAME", "TASKS", "TO-DO", "IN PROGRESS", "COMPLETED"]);
            for p in app.projects() {
                let count = |s: Status| p.tasks().filter(|t| t.status() == s).count().to_string();
                table.row([
                    p.name().to_owned(),
                    p.len().to_string(),
                    count(Status::ToDo),
                    count(Status::InProgress),
                    count(Status::Completed),
                ]);
            }
            emit_table(&table, out.csv)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_todo(app: &mut App<FileStore>, cmd: TodoCmd, style: Style) -> anyhow::Result<ExitCode> {
    match cmd {
        TodoCmd::Add(args) => {
            let todo = app.add_task_to_project(
                &args.title,
                &args.description,
                args.due.as_str(),
                args.priority,
                &args.project,
                args.status,
            )?;
            println!(
                "Added '{}' to {} (ID: {})",
                todo.title(),
                todo.project_name(),
                todo.id().short()
            );
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::List(args) => todo_list(app, &args, style),
        TodoCmd::Show(args) => {
            let todo = app.find_task(&args.id)?;
            print_todo_details(todo, style);
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::Edit(args) => {
            let (id, project) = locate(app, &args.id)?;
            let edit = TaskEdit {
                title: args.title,
                description: args.description,
                due: args.due.map(DueDateInput::from),
                priority: args.priority,
                status: args.status,
                project: args.project,
            };
            if edit.is_empty() {
                anyhow::bail!("nothing to change - pass at least one of --title, --description, --due, --priority, --status, --project");
            }
            let requested = edit.project.clone();
            let todo = app.edit_task(&id, &project, edit)?;
            if let Some(requested) = requested
                && requested != todo.project_name()
            {
                eprintln!("Project '{requested}' not found; moved to {DEFAULT_PROJECT}");
            }
            println!("Updated '{}' (ID: {})", todo.title(), todo.id().short());
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::Move(args) => {
            let (id, from) = locate(app, &args.id)?;
            let outcome = app.move_task(&id, &from, &args.to)?;
            if outcome.fell_back {
                eprintln!("Project '{}' not found; moved to {DEFAULT_PROJECT}", args.to);
            }
            println!("Moved {} from {from} to {}", truncate(&id, 8), outcome.destination);
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::Status(args) => {
            let (id, project) = locate(app, &args.id)?;
            app.update_task_status(&id, &project, args.status)?;
            println!("{} is now {}", truncate(&id, 8), style.status(args.status));
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::Rm(args) => {
            let (id, project) = locate(app, &args.id)?;
            if !app.remove_task(&project, &id)? {
                anyhow::bail!("no to-do found matching id: {}", args.id);
            }
            println!("Removed {} from {project}", truncate(&id, 8));
            Ok(ExitCode::SUCCESS)
        }
        TodoCmd::Import(args) => {
            let created = import::import_file(app, &args.file)?;
            for todo in &created {
                println!(
                    "Added '{}' to {} (ID: {})",
                    todo.title(),
                    todo.project_name(),
                    todo.id().short()
                );
            }
            println!("Imported {} to-do(s)", created.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn todo_list(app: &App<FileStore>, args: &TodoListArgs, style: Style) -> anyhow::Result<ExitCode> {
    if let Some(name) = args.project.as_deref()
        && app.get_project(name).is_none()
    {
        anyhow::bail!("project '{name}' not found");
    }
    let todos: Vec<&ToDo> = app
        .projects()
        .filter(|p| args.project.as_deref().is_none_or(|name| p.name() == name))
        .flat_map(|p| p.tasks())
        .filter(|t| args.status.is_none_or(|s| t.status() == s))
        .collect();

    if args.output.json {
        let records: Vec<TodoRecord> = todos.iter().map(|t| t.to_record()).collect();
        print_json(&records)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = Table::new(["ID", "TITLE", "PROJECT", "STATUS", "PRIORITY", "DUE"]);
    for t in &todos {
        table.row([
            t.id().short().to_owned(),
            truncate(t.title(), 40),
            t.project_name().to_owned(),
            style.status(t.status()),
            t.priority().to_string(),
            style.due(t.due_date()),
        ]);
    }
    if table.is_empty() && !args.output.csv {
        println!("No to-dos found");
        return Ok(ExitCode::SUCCESS);
    }
    emit_table(&table, args.output.csv)?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves an id or prefix to the full id and the owning project.
fn locate(app: &App<FileStore>, pattern: &str) -> anyhow::Result<(String, String)> {
    let todo = app.find_task(pattern)?;
    Ok((todo.id().to_string(), todo.project_name().to_owned()))
}

fn print_todo_details(todo: &ToDo, style: Style) {
    println!("To-do: {} (ID: {})", todo.title(), todo.id());
    println!("Project: {}", todo.project_name());
    println!("Status: {}", style.status(todo.status()));
    println!("Priority: {}", todo.priority());
    println!("Due: {}", style.due(todo.due_date()));
    println!("\nDescription:\n{}", todo.description());
}

fn emit_table(table: &Table, csv: bool) -> anyhow::Result<()> {
    if csv {
        table.print_csv()?;
    } else {
        table.print()?;
    }
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    print!("{out}");
    Ok(())
}

fn cmd_version() -> ExitCode {
    println!("todoboard version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}

fn parse_status_arg(s: &str) -> Result<Status, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "todo" | "to-do" => Ok(Status::ToDo),
        "in-progress" | "in progress" | "doing" => Ok(Status::InProgress),
        "completed" | "done" => Ok(Status::Completed),
        _ => Err(format!(
            "invalid status '{s}' (expected todo, in-progress or completed)"
        )),
    }
}

fn parse_priority_arg(s: &str) -> Result<Priority, String> {
    s.trim()
        .to_ascii_lowercase()
        .parse::<Priority>()
        .map_err(|e| e.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    if s.chars().count() > max {
        out.push_str("...");
    }
    out
}
