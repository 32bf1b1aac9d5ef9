use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::thread::{self, ScopedJoinHandle};

use crate::git::{
    Branch, CommandRunner, DefaultComparison, Divergence, FileChange, Git, GitError, GitResult,
    GraphRow, LineStat, Parsed, RepoSummary,
};

/// Data categories fetched independently during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Branch,
    Status,
    Branches,
    LastCommit,
    LineStats,
    Graph,
    DefaultBranch,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Branch => "branch",
            Category::Status => "status",
            Category::Branches => "branches",
            Category::LastCommit => "last commit",
            Category::LineStats => "line stats",
            Category::Graph => "graph",
            Category::DefaultBranch => "default branch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryError {
    pub category: Category,
    pub message: String,
}

/// Everything the dashboard shows, gathered in one refresh cycle.
/// A failed category keeps its empty default and is listed in `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// `None` when unknown or detached
    pub branch: Option<String>,
    pub files: Vec<FileChange>,
    pub line_stats: HashMap<String, LineStat>,
    pub totals: LineStat,
    /// Current branch vs. its upstream
    pub upstream: Divergence,
    pub last_commit: Option<DateTime<Utc>>,
    pub default_comparison: Option<DefaultComparison>,
    pub branches: Vec<Branch>,
    pub graph: Vec<GraphRow>,
    /// Unparsable output lines dropped across all categories
    pub skipped_lines: usize,
    pub errors: Vec<CategoryError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or("unknown")
    }

    pub fn summary(&self) -> RepoSummary {
        if self.files.is_empty() {
            RepoSummary::Clean
        } else {
            RepoSummary::Changes(self.files.len())
        }
    }

    pub fn file_stat(&self, path: &str) -> Option<&LineStat> {
        self.line_stats.get(path)
    }

    pub fn has_failed(&self, category: Category) -> bool {
        self.errors.iter().any(|e| e.category == category)
    }

    fn fail(&mut self, category: Category, message: String) {
        tracing::warn!(category = category.label(), %message, "refresh category failed");
        self.errors.push(CategoryError { category, message });
    }

    /// Keep parsed records, or record the failure and leave the default
    fn take<T>(&mut self, category: Category, result: Result<Parsed<T>, String>) -> Option<T> {
        match result {
            Ok(parsed) => {
                self.skipped_lines += parsed.skipped;
                Some(parsed.into_records())
            }
            Err(message) => {
                self.fail(category, message);
                None
            }
        }
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, GitResult<T>>) -> Result<T, String> {
    match handle.join() {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("worker panicked".to_string()),
    }
}

/// Fetch every category concurrently. Categories do not share state, so one
/// failing only blanks its own fields.
pub fn collect<R: CommandRunner>(git: &Git<R>, log_limit: usize) -> Snapshot {
    let (branch, status, branches, last_commit, stats, graph) = thread::scope(|s| {
        let branch = s.spawn(|| git.current_branch());
        let status = s.spawn(|| git.working_tree_status());
        let branches = s.spawn(|| git.branches());
        // A fresh repository simply has no commits yet
        let last_commit = s.spawn(|| match git.last_commit_time() {
            Ok(time) => Ok(Some(time)),
            Err(GitError::NoCommits) => Ok(None),
            Err(err) => Err(err),
        });
        let stats = s.spawn(|| git.line_stats());
        let graph = s.spawn(|| git.commit_graph(Some(log_limit)));
        (
            join(branch),
            join(status),
            join(branches),
            join(last_commit),
            join(stats),
            join(graph),
        )
    });

    let mut snapshot = Snapshot {
        fetched_at: Some(Utc::now()),
        ..Snapshot::default()
    };

    match branch {
        Ok(name) if !name.is_empty() => snapshot.branch = Some(name),
        Ok(_) => {}
        Err(message) => snapshot.fail(Category::Branch, message),
    }

    if let Some(files) = snapshot.take(Category::Status, status) {
        snapshot.files = files;
    }

    if let Some(branches) = snapshot.take(Category::Branches, branches) {
        snapshot.upstream = branches
            .iter()
            .find(|b| b.is_current)
            .map(Branch::divergence)
            .unwrap_or_default();
        snapshot.branches = branches;
    }

    match last_commit {
        Ok(time) => snapshot.last_commit = time,
        Err(message) => snapshot.fail(Category::LastCommit, message),
    }

    if let Some(stats) = snapshot.take(Category::LineStats, stats) {
        snapshot.totals = LineStat::total(stats.values());
        snapshot.line_stats = stats;
    }

    if let Some(graph) = snapshot.take(Category::Graph, graph) {
        snapshot.graph = graph;
    }

    if let Some(current) = snapshot.branch.clone() {
        match git.default_comparison(&current) {
            Ok(cmp) => snapshot.default_comparison = Some(cmp),
            Err(err @ GitError::DefaultBranchUnresolved { .. }) => {
                tracing::debug!(%err, "skipping default-branch comparison");
            }
            Err(err) => snapshot.fail(Category::DefaultBranch, err.to_string()),
        }
    }

    snapshot
}
