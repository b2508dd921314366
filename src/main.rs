use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use taskboard_lib::auth::MemoryIdentityProvider;
use taskboard_lib::config::Config;
use taskboard_lib::logging::init_logging;
use taskboard_lib::presenter::Presenter;
use taskboard_lib::rest::{RestIdentityProvider, RestTaskStore};
use taskboard_lib::store::{MemoryStore, TaskStore};
use taskboard_lib::{
    Backend, BackendCell, LoginController, LoginOutcome, Session, Task, TaskListController,
    TaskListView,
};

static BACKEND: BackendCell = BackendCell::new();

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Parser)]
#[command(name = "taskboard", about = "Personal task list synced with a real-time database")]
struct Args {
    /// Keep accounts and tasks in memory instead of using the remote backend.
    #[arg(long)]
    memory: bool,

    /// Directory for config.json and log files. Defaults to $TASKBOARD_DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn navigate_back(&self) {
        println!("No user session, back to sign in.");
    }

    fn alert(&self, title: &str, message: &str) {
        println!("[{title}] {message}");
    }

    fn focus_input(&self) {}

    fn dismiss_input(&self) {}

    fn render(&self, view: &TaskListView) {
        if view.loading {
            println!("Loading tasks...");
            return;
        }
        println!();
        if view.tasks.is_empty() {
            println!("  (no tasks)");
        }
        for (index, task) in view.tasks.iter().enumerate() {
            println!("  {:>2}. {}", index + 1, task.description);
        }
        if view.editing {
            println!("You are editing a task! (:cancel to stop)");
        }
    }
}

enum Command {
    Quit,
    Reload,
    Cancel,
    Edit(usize),
    Delete(usize),
    Help,
    Text(String),
}

fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Text(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let index = parts.next().and_then(|value| value.parse::<usize>().ok());
    match (name, index) {
        ("q" | "quit", _) => Command::Quit,
        ("r" | "reload", _) => Command::Reload,
        ("c" | "cancel", _) => Command::Cancel,
        ("e" | "edit", Some(n)) => Command::Edit(n),
        ("d" | "delete", Some(n)) => Command::Delete(n),
        _ => Command::Help,
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>, Box<dyn Error>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(input
        .next_line()
        .await?
        .map(|line| line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Tasks are numbered from 1 on screen.
fn nth_task(controller: &TaskListController<TerminalPresenter>, n: usize) -> Option<Task> {
    n.checked_sub(1)
        .and_then(|index| controller.tasks().get(index))
        .cloned()
}

async fn home(
    store: Arc<dyn TaskStore>,
    session: Session,
    input: &mut Input,
) -> Result<(), Box<dyn Error>> {
    let mut controller = TaskListController::new(store, TerminalPresenter);
    if controller.initialize(session).await.is_err() {
        return Ok(());
    }
    println!("== {} ==", controller.title());

    loop {
        let label = if controller.view().editing { "edit> " } else { "new> " };
        let Some(line) = prompt(input, label).await? else {
            return Ok(());
        };
        match parse_command(&line) {
            Command::Quit => return Ok(()),
            Command::Reload => controller.load_all().await?,
            Command::Cancel => controller.cancel_edit(),
            Command::Edit(n) => {
                let task = nth_task(&controller, n);
                match task {
                    Some(task) => controller.begin_edit(&task),
                    None => println!("No task #{n}"),
                }
            }
            Command::Delete(n) => {
                let Some(task) = nth_task(&controller, n) else {
                    println!("No task #{n}");
                    continue;
                };
                let Some(confirmation) = controller.request_delete(&task.id) else {
                    println!("No task #{n}");
                    continue;
                };
                let question =
                    format!("{}: {} [y/N] ", confirmation.title(), confirmation.message());
                let answer = prompt(input, &question).await?.unwrap_or_default();
                if answer.trim().eq_ignore_ascii_case("y") {
                    controller.confirm_delete(confirmation).await?;
                } else {
                    controller.cancel_delete(confirmation);
                }
            }
            Command::Help => println!(
                "Type text to save it. Commands: :edit N, :cancel, :delete N, :reload, :quit"
            ),
            Command::Text(text) => {
                controller.set_text(text);
                controller.save().await?;
            }
        }
    }
}

async fn run(args: Args, config: Config) -> Result<(), Box<dyn Error>> {
    let mut rest_store: Option<Arc<RestTaskStore>> = None;
    let backend = if args.memory {
        BACKEND.get_or_init(|| {
            Backend::new(
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryIdentityProvider::new()),
            )
        })
    } else {
        config.validate()?;
        let store = Arc::new(RestTaskStore::new(&config)?);
        let identity = Arc::new(RestIdentityProvider::new(&config)?);
        rest_store = Some(Arc::clone(&store));
        BACKEND.get_or_init(|| Backend::new(store, identity))
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let mut login = LoginController::new(Arc::clone(&backend.identity), TerminalPresenter);
        let Some(choice) = prompt(&mut input, "[l]ogin, [r]egister or [q]uit: ").await? else {
            return Ok(());
        };
        match choice.trim() {
            "q" => return Ok(()),
            "r" => login.toggle_mode(),
            _ => {}
        }
        let Some(email) = prompt(&mut input, "email: ").await? else {
            return Ok(());
        };
        let Some(password) = prompt(&mut input, "password: ").await? else {
            return Ok(());
        };
        login.set_email(email.trim());
        login.set_password(password);

        match login.submit().await {
            LoginOutcome::SignedIn(session) => {
                if let Some(store) = &rest_store {
                    store.set_token(session.id_token.clone());
                }
                home(Arc::clone(&backend.store), session, &mut input).await?;
                if let Some(store) = &rest_store {
                    store.set_token(None);
                }
            }
            LoginOutcome::Registered => println!("Account created, you can sign in now."),
            LoginOutcome::Rejected => {}
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let loaded = match &args.data_dir {
        Some(dir) => Config::load(dir).map(|mut config| {
            config.apply_overrides(|key| std::env::var(key).ok());
            config.data_dir = dir.clone();
            config
        }),
        None => Config::from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Keep the handle alive so buffered log lines get flushed on exit.
    let _logger = match init_logging(&config.data_dir) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("logging disabled: {err}");
            None
        }
    };

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("taskboard exited with error: {err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
