mod app;
mod config;
mod git;
mod logging;
mod ui;
mod watch;

use anyhow::{Context, Result};
use app::{App, PromptKind, Snapshot, View};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use git::{CommandRunner, Git};
use ratatui::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use watch::{FileWatcher, WatchEvent};

/// Delay between the last watch event and the refresh it triggers
const WATCH_SETTLE: Duration = Duration::from_millis(200);

/// Terminal dashboard for the live state of a git repository
#[derive(Parser)]
#[command(name = "rdash", version, about)]
struct Cli {
    /// Repository path (defaults to current directory)
    path: Option<String>,

    /// Maximum number of commits in the graph
    #[arg(long)]
    limit: Option<usize>,

    /// Periodic refresh interval in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Print one snapshot as JSON and exit
    #[arg(long)]
    json: bool,

    /// Disable the file watcher (periodic refresh only)
    #[arg(long)]
    no_watch: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let start = PathBuf::from(cli.path.as_deref().unwrap_or("."));
    let repo_root = find_repo_root(&start)?;

    let mut config = config::load_config(&repo_root);
    if let Some(limit) = cli.limit {
        config.git.log_limit = limit;
    }
    if let Some(interval) = cli.interval {
        config.refresh.interval_ms = interval;
    }
    if cli.no_watch {
        config.refresh.watch = false;
    }

    let log_path = logging::init(&config.log, cli.verbose);
    tracing::info!(repo = %repo_root.display(), log = ?log_path, "starting rdash");

    let git = Git::new(&repo_root)
        .program(config.git.program.clone())
        .remote(config.git.remote.clone())
        .default_branch_candidates(config.git.default_branch_candidates.clone());

    if cli.json {
        let snapshot = app::snapshot::collect(&git, config.git.log_limit);
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{json}");
        return Ok(());
    }

    let mut app = App::new(git, config);
    app.choose_start_view();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "event loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Walk up from `start` to the first directory containing `.git`
/// (a directory, or a file for linked worktrees)
fn find_repo_root(start: &Path) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .with_context(|| format!("Cannot access {}", start.display()))?;
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Not a git repository: {}", start.display()))
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<Snapshot>();
    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();

    // Debounce state for watcher-triggered refreshes
    let mut pending_refresh = false;
    let mut refresh_deadline = Instant::now();

    let _watcher: Option<FileWatcher> = if app.config.refresh.watch {
        let root = app.git.repo_root().to_path_buf();
        match FileWatcher::new(&root, app.config.refresh.debounce_ms, watch_tx) {
            Ok(w) => {
                app.watching = true;
                Some(w)
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "file watcher unavailable, using periodic refresh");
                None
            }
        }
    } else {
        None
    };

    app.request_refresh(&snapshot_tx);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key, &snapshot_tx);
                }
            }
        }

        while let Ok(snapshot) = snapshot_rx.try_recv() {
            app.apply_snapshot(snapshot);
            if app.refresh_queued {
                app.request_refresh(&snapshot_tx);
            }
        }

        while let Ok(WatchEvent::FilesChanged(paths)) = watch_rx.try_recv() {
            tracing::debug!(count = paths.len(), "refresh scheduled by watcher");
            pending_refresh = true;
            refresh_deadline = Instant::now() + WATCH_SETTLE;
        }

        let now = Instant::now();
        if pending_refresh && now >= refresh_deadline && !app.refreshing {
            pending_refresh = false;
            app.request_refresh(&snapshot_tx);
        } else if app.refresh_due(now) {
            app.request_refresh(&snapshot_tx);
        }

        app.expire_notification(now);

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Apply one key press. Failed actions surface as a notification; successful
/// ones schedule a refresh so the dashboard reflects them.
fn handle_key<R: CommandRunner + 'static>(
    app: &mut App<R>,
    key: KeyEvent,
    snapshot_tx: &mpsc::Sender<Snapshot>,
) {
    if app.prompt.is_some() {
        handle_prompt_key(app, key, snapshot_tx);
        return;
    }

    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc if app.diff_preview.is_some() => {
            app.toggle_diff();
            return;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('r') => {
            app.request_refresh(snapshot_tx);
            return;
        }
        KeyCode::Char('1') => {
            app.view = View::Dashboard;
            return;
        }
        KeyCode::Char('2') => {
            app.view = View::Branches;
            return;
        }
        KeyCode::Char('3') => {
            app.view = View::Graph;
            return;
        }
        KeyCode::Tab => {
            app.cycle_view();
            return;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            return;
        }
        KeyCode::Char('s') if app.view == View::Dashboard => app.stage_selected(),
        KeyCode::Char('u') if app.view == View::Dashboard => app.unstage_selected(),
        KeyCode::Char('a') if app.view == View::Dashboard => app.stage_all(),
        KeyCode::Char('c') if app.view == View::Dashboard => {
            app.open_commit_prompt();
            return;
        }
        KeyCode::Char('d') if app.view == View::Dashboard => {
            app.toggle_diff();
            return;
        }
        KeyCode::Enter if app.view == View::Branches => app.checkout_selected(),
        KeyCode::Char('n') if app.view == View::Branches => {
            app.open_prompt(PromptKind::NewBranch);
            return;
        }
        KeyCode::Char('d') if app.view == View::Branches => app.delete_selected(false),
        KeyCode::Char('D') if app.view == View::Branches => app.delete_selected(true),
        _ => return,
    };

    finish_action(app, action, snapshot_tx);
}

fn handle_prompt_key<R: CommandRunner + 'static>(
    app: &mut App<R>,
    key: KeyEvent,
    snapshot_tx: &mpsc::Sender<Snapshot>,
) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => {
            let action = app.submit_prompt();
            finish_action(app, action, snapshot_tx);
        }
        KeyCode::Backspace => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.pop();
            }
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.cancel_prompt(),
        KeyCode::Char(ch) => {
            if let Some(prompt) = app.prompt.as_mut() {
                prompt.input.push(ch);
            }
        }
        _ => {}
    }
}

fn finish_action<R: CommandRunner + 'static>(
    app: &mut App<R>,
    action: Result<()>,
    snapshot_tx: &mpsc::Sender<Snapshot>,
) {
    match action {
        Ok(()) => app.request_refresh(snapshot_tx),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "action failed");
            app.notify(&format!("{err:#}"));
        }
    }
}
