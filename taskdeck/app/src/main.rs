use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use taskdeck_app::connectors::{InMemoryBackend, JsonFileStore};
use taskdeck_app::{Action, App, AppError, Config, Connectors, feed, wire};
use taskdeck_core::{SessionState, SortMode, Task, TaskDraft, TaskStatus, TaskStore, ViewQuery};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(version, about = "Personal task lists with live search and sorting")]
struct Cli {
    /// Config file, read if present
    #[arg(long, default_value = taskdeck_app::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Run a scripted session against an in-memory backend
    Demo,
    /// Print the dashboard list for a JSON array of task documents
    View {
        file: PathBuf,
        /// Case-insensitive text to look for in title and description
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = SortMode::default())]
        sort: SortMode,
        /// Print the tasks as JSON instead of one row per task
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::load(&args.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Commands::Demo => demo(config).await,
        Commands::View {
            file,
            query,
            sort,
            json,
        } => view(&file, ViewQuery::new(query, sort), json),
    }
}

fn view(file: &Path, query: ViewQuery, json: bool) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let records = wire::records_from_json(&contents)
        .with_context(|| format!("{} is not a JSON array of task documents", file.display()))?;
    let mut store = TaskStore::new();
    store.replace_all(feed::tasks_from_snapshot(&records));
    let visible = store.view(&query);

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        println!("{} of {} tasks, sorted {}", visible.len(), store.len(), query.sort_mode.label());
        for task in visible {
            println!("  {}", render_row(task));
        }
    }
    Ok(())
}

async fn demo(config: Config) -> anyhow::Result<()> {
    let cache = JsonFileStore::open(&config.cache_path)
        .with_context(|| format!("cannot open cache {}", config.cache_path.display()))?;
    let backend = InMemoryBackend::new();
    let mut app = App::new(Connectors::in_memory(&backend, Arc::new(cache)), config);
    app.start();

    let state = wait_for_session(&app, |s| *s != SessionState::Initializing).await?;
    println!("Started on {:?}", state.screens().initial());
    if let Some(email) = app.auth().last_email() {
        println!("Last signed in as {email}");
    }

    let email = "demo@example.com";
    report(Action::SignUp, app.auth().sign_up(email, "secret123").await);
    report(Action::SignIn, app.auth().sign_in(email, "wrong-password").await);
    let state = wait_for_session(&app, SessionState::is_signed_in).await?;
    println!("Signed in, showing {:?}", state.screens().initial());

    let dashboard = app.open_dashboard();
    let drafts = [
        TaskDraft::new("Write report")
            .description("Quarterly numbers")
            .assigned_date(date(2024, 1, 10))
            .due_date(date(2024, 2, 1)),
        TaskDraft::new("Buy milk").assigned_date(date(2024, 1, 12)),
        TaskDraft::new("Call plumber").due_date(date(2024, 1, 20)),
        TaskDraft::new("   "),
    ];
    let mut created = Vec::new();
    for draft in drafts {
        if let Some(task) = report(Action::CreateTask, app.tasks().create(draft).await) {
            created.push(task);
        }
    }
    print_tasks(&app, "Dashboard", &ViewQuery::default());

    if let Some(task) = created.first() {
        let done = task.clone().with_status(TaskStatus::Completed);
        report(Action::UpdateTask, app.tasks().update(done).await);
    }
    if let Some(task) = created.get(1) {
        report(Action::DeleteTask, app.tasks().delete(&task.id).await);
    }
    print_tasks(&app, "After edits", &ViewQuery::default());
    print_tasks(&app, "Search \"REPORT\"", &ViewQuery::new("REPORT", SortMode::default()));
    print_tasks(&app, "Sorted by due date", &ViewQuery::new("", SortMode::DueDateAsc));

    report(Action::SignOut, app.auth().sign_out().await);
    let state = wait_for_session(&app, |s| *s == SessionState::SignedOut).await?;
    println!("Signed out, showing {:?}", state.screens().initial());

    dashboard.cancel().await;
    app.shutdown().await;
    info!(remote_tasks = backend.records(&app.config().tasks_collection).len(), "Demo finished");
    Ok(())
}

async fn wait_for_session(
    app: &App,
    predicate: impl FnMut(&SessionState) -> bool,
) -> anyhow::Result<SessionState> {
    let mut rx = app.state().session.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .context("timed out waiting for the session")??
        .clone();
    Ok(state)
}

/// Prints the alert the screen would show and hands back the value on success.
fn report<T>(action: Action, result: Result<T, AppError>) -> Option<T> {
    match result {
        Ok(value) => {
            if let Some(alert) = action.success_alert() {
                println!("[{}] {}", alert.title, alert.message);
            }
            Some(value)
        }
        Err(e) => {
            let alert = e.alert(action);
            println!("[{}] {}", alert.title, alert.message);
            None
        }
    }
}

fn print_tasks(app: &App, heading: &str, query: &ViewQuery) {
    let tasks = app.state().tasks.visible(query);
    println!("{heading} ({}):", query.sort_mode.label());
    if tasks.is_empty() {
        println!("  no tasks");
    }
    for task in &tasks {
        println!("  {}", render_row(task));
    }
}

fn render_row(task: &Task) -> String {
    format!(
        "{} [{}] {} → {}",
        task.title,
        task.status,
        show_date(task.assigned_date),
        show_date(task.due_date)
    )
}

fn show_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
