mod version;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nudge_core::affirmation::{default_affirmation_path, read_affirmation};
use nudge_core::commands::{format_task_list, CommandOutcome, Session, Toggle};
use nudge_core::layout::hint_line;
use nudge_core::settings::{Settings, PRESETS, SETTINGS};
use nudge_core::store::Store;
use nudge_core::width::strip_ansi;

const DEFAULT_COLUMNS: usize = 80;
const HINT_EVERY_SECS: i64 = 5;
const HINTS: &[&str] = &[
    "nudge done <start of task> marks it complete",
    "nudge config preset vibrant for louder colors",
    "nudge toggle affirmation hides the message on the left",
    "nudge config set show-hints false silences these hints",
];

#[derive(Parser)]
#[command(
    name = "nudge",
    version = version::FULL,
    about = "Task reminders drawn above your shell prompt"
)]
struct Cli {
    /// Task file to use instead of $NUDGE_HOME/tasks.save
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Complete the first task whose text starts with PATTERN (case-insensitive)
    Done {
        #[arg(required = true, num_args = 1..)]
        pattern: Vec<String>,
    },
    /// List tasks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the reminder box (meant for a precmd hook)
    Render {
        /// Terminal width; defaults to $COLUMNS or the detected size
        #[arg(long)]
        columns: Option<usize>,
    },
    /// Hide the box and the affirmation
    Hide,
    /// Show the box and the affirmation
    Show,
    /// Flip visibility of part of the display
    Toggle {
        #[arg(value_enum, default_value_t = ToggleArg::All)]
        what: ToggleArg,
    },
    /// Inspect and change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum ToggleArg {
    Affirmation,
    Box,
    All,
}

impl From<ToggleArg> for Toggle {
    fn from(value: ToggleArg) -> Self {
        match value {
            ToggleArg::Affirmation => Toggle::Affirmation,
            ToggleArg::Box => Toggle::Box,
            ToggleArg::All => Toggle::All,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Set a value, e.g. `config set border-color 33`
    Set { key: String, value: String },
    /// Print one value
    Get { key: String },
    /// Print every setting
    List {
        #[arg(long)]
        json: bool,
    },
    /// Restore defaults: all, content, display, padding, colors or box
    Reset {
        #[arg(default_value = "all")]
        scope: String,
    },
    /// Apply a named color preset
    Preset { name: String },
    /// List available presets
    Presets,
    /// Write settings to a file
    Export {
        path: PathBuf,
        #[arg(long)]
        colors_only: bool,
    },
    /// Read settings from a file written by export
    Import { path: PathBuf },
    /// Reassign task colors from the current palette
    Recolor,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NUDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn open_session(file: Option<PathBuf>) -> Result<Session> {
    match file {
        Some(path) => Ok(Session::open(Store::new(path, Settings::from_env()))),
        None => Session::open_default(),
    }
}

fn report(outcome: CommandOutcome) -> ExitCode {
    if outcome.ok {
        println!("{}", outcome.message);
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", outcome.message);
        ExitCode::FAILURE
    }
}

fn terminal_columns(explicit: Option<usize>) -> usize {
    if let Some(columns) = explicit {
        return columns;
    }
    if let Some(columns) = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|columns| *columns > 0)
    {
        return columns;
    }
    crossterm::terminal::size()
        .ok()
        .map(|(width, _)| width as usize)
        .filter(|columns| *columns > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

fn color_disabled() -> bool {
    std::env::var_os("NO_COLOR")
        .map(|value| !value.is_empty())
        .unwrap_or(false)
}

fn render(session: &mut Session, columns: Option<usize>) {
    let columns = terminal_columns(columns);
    debug!(columns, "rendering");
    let affirmation = read_affirmation(default_affirmation_path().as_deref());
    let Some(mut lines) = session.render(columns, &affirmation) else {
        return;
    };
    let now = Local::now().timestamp();
    if session.settings().show_hints && now % HINT_EVERY_SECS == 0 {
        let hint = HINTS[(now / HINT_EVERY_SECS) as usize % HINTS.len()];
        lines.push(hint_line(session.settings(), columns, hint));
    }
    let plain = color_disabled();
    for line in lines {
        if plain {
            println!("{}", strip_ansi(&line));
        } else {
            println!("{}", line);
        }
    }
}

fn run_config(session: &mut Session, command: ConfigCommand) -> Result<ExitCode> {
    let code = match command {
        ConfigCommand::Set { key, value } => report(session.config_set(&key, &value)),
        ConfigCommand::Get { key } => match session.settings().get(&key) {
            Ok(value) => {
                println!("{}", value);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}", err);
                ExitCode::FAILURE
            }
        },
        ConfigCommand::List { json } => {
            let entries = session.settings().entries();
            if json {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), serde_json::Value::String(value)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                let key_width = SETTINGS.iter().map(|spec| spec.key.len()).max().unwrap_or(0);
                for (key, value) in entries {
                    println!("{:<width$}  {}", key, value, width = key_width);
                }
            }
            ExitCode::SUCCESS
        }
        ConfigCommand::Reset { scope } => report(session.config_reset(&scope)),
        ConfigCommand::Preset { name } => report(session.config_apply_preset(&name)),
        ConfigCommand::Presets => {
            for preset in PRESETS {
                println!("{:<10}{}", preset.name, preset.description);
            }
            ExitCode::SUCCESS
        }
        ConfigCommand::Export { path, colors_only } => {
            report(session.config_export(&path, colors_only))
        }
        ConfigCommand::Import { path } => report(session.config_import(&path)),
        ConfigCommand::Recolor => report(session.recolor()),
    };
    Ok(code)
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    };
    if let Command::Version = command {
        println!("nudge {}", version::FULL);
        return Ok(ExitCode::SUCCESS);
    }

    let mut session = open_session(cli.file)?;
    let code = match command {
        Command::Add { text } => report(session.add(&text.join(" "))),
        Command::Done { pattern } => report(session.complete(&pattern.join(" "))),
        Command::List { json } => {
            let tasks = session.tasks();
            if json {
                let body = json!({
                    "tasks": tasks.tasks,
                    "color_cursor": tasks.color_cursor,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", format_task_list(tasks));
            }
            ExitCode::SUCCESS
        }
        Command::Render { columns } => {
            render(&mut session, columns);
            ExitCode::SUCCESS
        }
        Command::Hide => report(session.hide()),
        Command::Show => report(session.show()),
        Command::Toggle { what } => report(session.toggle(what.into())),
        Command::Config { command } => run_config(&mut session, command)?,
        Command::Version => ExitCode::SUCCESS,
    };
    Ok(code)
}
