use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::snapshot::{self, Snapshot};
use crate::config::DashConfig;
use crate::git::{Branch, CommandRunner, FileChange, Git, GitError, SystemRunner};

/// How long a notification stays in the status bar
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

// ── Enums ──

/// Which panel fills the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Branches,
    Graph,
}

impl View {
    pub const ALL: [View; 3] = [View::Dashboard, View::Branches, View::Graph];

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "DASHBOARD",
            View::Branches => "BRANCHES",
            View::Graph => "GRAPH",
        }
    }

    pub fn next(&self) -> View {
        match self {
            View::Dashboard => View::Branches,
            View::Branches => View::Graph,
            View::Graph => View::Dashboard,
        }
    }
}

/// What a text prompt in the bottom bar collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Commit,
    NewBranch,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Commit => "commit",
            PromptKind::NewBranch => "new branch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

// ── App State ──

pub struct App<R: CommandRunner = SystemRunner> {
    pub git: Arc<Git<R>>,
    pub config: DashConfig,
    pub view: View,
    pub snapshot: Snapshot,

    /// Index into `snapshot.files`
    pub selected_file: usize,

    /// Index into `visible_branches()`
    pub selected_branch: usize,

    /// First graph row shown
    pub graph_scroll: usize,

    /// A refresh worker is running
    pub refreshing: bool,
    /// A refresh was requested while one was running
    pub refresh_queued: bool,
    pub last_refresh: Option<Instant>,

    /// Whether the file watcher is active
    pub watching: bool,

    /// Active text prompt; keys go to it while set
    pub prompt: Option<Prompt>,

    /// Diff of the selected file, shown beside the file list while set
    pub diff_preview: Option<String>,

    pub notification: Option<(String, Instant)>,
    pub should_quit: bool,
}

impl<R: CommandRunner + 'static> App<R> {
    pub fn new(git: Git<R>, config: DashConfig) -> Self {
        Self {
            git: Arc::new(git),
            config,
            view: View::Dashboard,
            snapshot: Snapshot::default(),
            selected_file: 0,
            selected_branch: 0,
            graph_scroll: 0,
            refreshing: false,
            refresh_queued: false,
            last_refresh: None,
            watching: false,
            prompt: None,
            diff_preview: None,
            notification: None,
            should_quit: false,
        }
    }

    /// Open on the dashboard when there is work in the tree, otherwise on
    /// the branch list
    pub fn choose_start_view(&mut self) {
        self.view = match self.git.has_uncommitted_changes() {
            Ok(true) => View::Dashboard,
            Ok(false) => View::Branches,
            Err(err) => {
                tracing::warn!(error = %err, "could not read status for start view");
                View::Dashboard
            }
        };
    }

    /// Display name of the repository (last path component)
    pub fn repo_name(&self) -> String {
        let root = self.git.repo_root();
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string())
    }

    // ── Refresh ──

    /// Start a background refresh. While one is running the request is
    /// queued instead. The finished snapshot arrives on `tx`.
    pub fn request_refresh(&mut self, tx: &Sender<Snapshot>) {
        if self.refreshing {
            self.refresh_queued = true;
            return;
        }
        self.refreshing = true;
        self.refresh_queued = false;
        let git = Arc::clone(&self.git);
        let limit = self.config.git.log_limit;
        let tx = tx.clone();
        std::thread::spawn(move || {
            let snapshot = snapshot::collect(&git, limit);
            let _ = tx.send(snapshot);
        });
    }

    /// Install a finished snapshot, keeping selections in range
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.refreshing = false;
        self.last_refresh = Some(Instant::now());
        self.selected_file = clamp_index(self.selected_file, self.snapshot.files.len());
        let branch_count = self.visible_branches().len();
        self.selected_branch = clamp_index(self.selected_branch, branch_count);
        self.graph_scroll = clamp_index(self.graph_scroll, self.snapshot.graph.len());
        if self.diff_preview.is_some() {
            self.load_diff();
        }
    }

    /// True when the periodic refresh interval has elapsed
    pub fn refresh_due(&self, now: Instant) -> bool {
        if self.refreshing {
            return false;
        }
        match self.last_refresh {
            Some(last) => {
                now.duration_since(last) >= Duration::from_millis(self.config.refresh.interval_ms)
            }
            None => true,
        }
    }

    // ── Selection ──

    pub fn visible_branches(&self) -> Vec<&Branch> {
        self.snapshot
            .branches
            .iter()
            .filter(|b| self.config.display.show_remote_branches || !b.is_remote)
            .collect()
    }

    pub fn selected_file(&self) -> Option<&FileChange> {
        self.snapshot.files.get(self.selected_file)
    }

    pub fn selected_branch(&self) -> Option<&Branch> {
        self.visible_branches().get(self.selected_branch).copied()
    }

    pub fn select_next(&mut self) {
        match self.view {
            View::Dashboard => {
                self.selected_file =
                    clamp_index(self.selected_file + 1, self.snapshot.files.len());
                if self.diff_preview.is_some() {
                    self.load_diff();
                }
            }
            View::Branches => {
                let len = self.visible_branches().len();
                self.selected_branch = clamp_index(self.selected_branch + 1, len);
            }
            View::Graph => {
                self.graph_scroll = clamp_index(self.graph_scroll + 1, self.snapshot.graph.len());
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.view {
            View::Dashboard => {
                self.selected_file = self.selected_file.saturating_sub(1);
                if self.diff_preview.is_some() {
                    self.load_diff();
                }
            }
            View::Branches => self.selected_branch = self.selected_branch.saturating_sub(1),
            View::Graph => self.graph_scroll = self.graph_scroll.saturating_sub(1),
        }
    }

    pub fn cycle_view(&mut self) {
        self.view = self.view.next();
    }

    // ── Diff preview ──

    pub fn toggle_diff(&mut self) {
        if self.diff_preview.take().is_none() {
            self.load_diff();
        }
    }

    /// Load the selected file's diff: staged files against HEAD, the rest
    /// against the index. Untracked files have nothing to diff.
    fn load_diff(&mut self) {
        let selected = self
            .selected_file()
            .map(|f| (f.path.clone(), f.is_staged, f.is_untracked));
        let Some((path, staged, untracked)) = selected else {
            self.diff_preview = Some(String::new());
            return;
        };
        if untracked {
            self.diff_preview = Some(String::new());
            return;
        }
        match self.git.diff_text(&path, staged) {
            Ok(text) => self.diff_preview = Some(text),
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "diff failed");
                self.diff_preview = Some(String::new());
                self.notify(&format!("Failed to diff {path}"));
            }
        }
    }

    // ── Actions ──

    pub fn stage_selected(&mut self) -> Result<()> {
        let Some(path) = self.selected_file().map(|f| f.path.clone()) else {
            return Ok(());
        };
        self.git
            .stage_file(&path)
            .with_context(|| format!("Failed to stage {path}"))?;
        self.notify(&format!("Staged {path}"));
        Ok(())
    }

    pub fn unstage_selected(&mut self) -> Result<()> {
        let Some(path) = self.selected_file().map(|f| f.path.clone()) else {
            return Ok(());
        };
        self.git
            .unstage_file(&path)
            .with_context(|| format!("Failed to unstage {path}"))?;
        self.notify(&format!("Unstaged {path}"));
        Ok(())
    }

    pub fn stage_all(&mut self) -> Result<()> {
        self.git.stage_all().context("Failed to stage all files")?;
        self.notify("Staged all changes");
        Ok(())
    }

    /// Check out the selected branch. Remote-tracking branches are checked
    /// out by their short name so git creates a local tracking branch.
    pub fn checkout_selected(&mut self) -> Result<()> {
        let Some(branch) = self.selected_branch() else {
            return Ok(());
        };
        if branch.is_current {
            return Ok(());
        }
        let name = if branch.is_remote {
            let prefix = format!("{}/", self.git.remote_name());
            branch
                .name
                .strip_prefix(&prefix)
                .unwrap_or(&branch.name)
                .to_string()
        } else {
            branch.name.clone()
        };
        self.git
            .switch_branch(&name)
            .with_context(|| format!("Failed to check out {name}"))?;
        self.notify(&format!("Switched to {name}"));
        Ok(())
    }

    /// Delete the selected local branch. Without `force` git refuses
    /// branches with unmerged commits.
    pub fn delete_selected(&mut self, force: bool) -> Result<()> {
        let Some(branch) = self.selected_branch() else {
            return Ok(());
        };
        if branch.is_current || branch.is_remote {
            let name = branch.name.clone();
            self.notify(&format!("Cannot delete {name}"));
            return Ok(());
        }
        let name = branch.name.clone();
        self.git
            .delete_branch(&name, force)
            .with_context(|| format!("Failed to delete {name}"))?;
        self.notify(&format!("Deleted {name}"));
        Ok(())
    }

    // ── Prompt ──

    /// Open the commit prompt, or explain why there is nothing to commit
    pub fn open_commit_prompt(&mut self) {
        if self.snapshot.files.iter().any(|f| f.is_staged) {
            self.open_prompt(PromptKind::Commit);
        } else {
            self.notify("Nothing staged to commit");
        }
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Close the prompt and run its action. Empty input just closes it.
    pub fn submit_prompt(&mut self) -> Result<()> {
        let Some(prompt) = self.prompt.take() else {
            return Ok(());
        };
        let input = prompt.input.trim();
        if input.is_empty() {
            return Ok(());
        }
        match prompt.kind {
            PromptKind::Commit => {
                self.git.commit(input).context("Failed to commit")?;
                self.notify("Committed");
            }
            PromptKind::NewBranch => {
                self.create_branch(input)?;
                self.notify(&format!("Switched to new branch {input}"));
            }
        }
        Ok(())
    }

    /// Branch off the remote default branch, or off HEAD when the
    /// repository has no resolvable default
    fn create_branch(&self, name: &str) -> Result<()> {
        match self.git.create_branch_from_default(name) {
            Ok(()) => Ok(()),
            Err(GitError::DefaultBranchUnresolved { .. }) => {
                self.git
                    .create_branch(name)
                    .and_then(|()| self.git.switch_branch(name))
                    .with_context(|| format!("Failed to create {name}"))
            }
            Err(err) => Err(err).with_context(|| format!("Failed to create {name}")),
        }
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.notification = Some((msg.to_string(), Instant::now()));
    }

    /// Drop the notification once it has been visible long enough
    pub fn expire_notification(&mut self, now: Instant) {
        if let Some((_, shown_at)) = &self.notification {
            if now.duration_since(*shown_at) >= NOTIFICATION_TTL {
                self.notification = None;
            }
        }
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}
