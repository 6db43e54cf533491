// live-snippet: edit a markup snippet and watch it render

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use live_snippet::config::PlaygroundConfig;
use live_snippet::interpreter::constants::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_STEP_LIMIT};
use live_snippet::log_panel::panel_text;
use live_snippet::playground::Playground;
use live_snippet::render::layout::{layout, plain_text};
use live_snippet::render::{Outcome, ResultView, TracingPanicHook};
use live_snippet::transpiler::transpile;
use live_snippet::ui::App;

/// Snippet shown when no file is given
const DEMO_SNIPPET: &str = include_str!("../demos/counter.tsx");

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snippet to load (defaults to a built-in demo)
    file: Option<PathBuf>,

    /// Run one pass headless and print the result
    #[arg(long)]
    once: bool,

    /// With --once, print the result view as JSON
    #[arg(long, requires = "once")]
    json: bool,

    /// Print the lowered script and exit
    #[arg(long)]
    emit_script: bool,

    /// Steps one attempt may execute
    #[arg(long, env = "LIVE_SNIPPET_STEP_LIMIT", default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: u64,

    /// Nested calls before a RangeError
    #[arg(long, env = "LIVE_SNIPPET_MAX_CALL_DEPTH", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Keep entries logged before a failure above the error
    #[arg(long, env = "LIVE_SNIPPET_KEEP_LOGS_ON_FAILURE")]
    keep_logs_on_failure: bool,

    /// Append diagnostics to this file (the TUI logs nowhere otherwise)
    #[arg(long, env = "LIVE_SNIPPET_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> PlaygroundConfig {
        PlaygroundConfig {
            step_limit: self.step_limit,
            max_call_depth: self.max_call_depth,
            keep_logs_on_failure: self.keep_logs_on_failure,
            ..PlaygroundConfig::default()
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref(), args.once || args.emit_script)?;

    let source = match &args.file {
        Some(path) => match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("Error: cannot read '{}': {}", path.display(), err);
                return Ok(ExitCode::FAILURE);
            }
        },
        None => DEMO_SNIPPET.to_string(),
    };

    if args.emit_script {
        return match transpile(&source) {
            Ok(script) => {
                print!("{}", script);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", err);
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let mut playground = Playground::new(args.config());

    if args.once {
        let view = playground.update(&source);
        let mut stdout = io::stdout().lock();
        if args.json {
            serde_json::to_writer_pretty(&mut stdout, view)?;
            writeln!(stdout)?;
        } else {
            stdout.write_all(headless_text(view).as_bytes())?;
        }
        return Ok(if view.is_failure() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app; panics inside render passes are contained and
    // must not write to the alternate screen
    let panic_hook = TracingPanicHook::install();
    let mut app = App::new(playground, source);
    let res = app.run(&mut terminal);
    drop(panic_hook);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` filter, default `info`. Headless runs log to stderr; the TUI
/// only logs when a file is given.
fn init_tracing(log_file: Option<&Path>, headless: bool) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        None if headless => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Mounted tree, then the log panel when there is anything to show
fn headless_text(view: &ResultView) -> String {
    let mut out = String::new();
    match view.outcome {
        Outcome::Rendered => {
            out.push_str(&plain_text(&layout(&view.mounted)));
            out.push('\n');
        }
        Outcome::NonRenderable => {
            if let Some(value) = &view.value {
                out.push_str(&format!("(not renderable: {})\n", value.to_plain_text()));
            }
        }
        Outcome::Failed => {}
    }
    if view.shows_log_panel() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&panel_text(&view.logs));
    }
    out
}
