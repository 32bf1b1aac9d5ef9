use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::cli::{CommandRunner, Git};
use super::error::{GitError, GitResult};
use super::parsed::Parsed;

/// File change status in git
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Updated,
}

impl ChangeStatus {
    /// Map the staging-area column (X) of a porcelain line
    pub fn from_staged_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(ChangeStatus::Modified),
            'A' => Some(ChangeStatus::Added),
            'D' => Some(ChangeStatus::Deleted),
            'R' => Some(ChangeStatus::Renamed),
            'C' => Some(ChangeStatus::Copied),
            'U' => Some(ChangeStatus::Updated),
            _ => None,
        }
    }

    /// Map the working-tree column (Y) of a porcelain line
    pub fn from_working_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(ChangeStatus::Modified),
            'D' => Some(ChangeStatus::Deleted),
            '?' => Some(ChangeStatus::Untracked),
            'U' => Some(ChangeStatus::Updated),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ChangeStatus::Modified => "M",
            ChangeStatus::Added => "A",
            ChangeStatus::Deleted => "D",
            ChangeStatus::Renamed => "R",
            ChangeStatus::Copied => "C",
            ChangeStatus::Untracked => "??",
            ChangeStatus::Updated => "U",
        }
    }
}

/// One entry of `git status --porcelain=v1`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileChange {
    /// Path after rename resolution (the destination for renames)
    pub path: String,
    /// Working-tree status (column Y)
    pub status: Option<ChangeStatus>,
    /// Staging-area status (column X)
    pub staged_status: Option<ChangeStatus>,
    pub is_staged: bool,
    pub is_untracked: bool,
}

impl FileChange {
    #[allow(dead_code)]
    /// Both codes unknown: the entry carries no actionable status
    pub fn has_status(&self) -> bool {
        self.status.is_some() || self.staged_status.is_some()
    }

    /// Two-column code as shown by `git status --short`
    pub fn display_status(&self) -> String {
        if self.is_untracked {
            return "??".to_string();
        }
        let staged = self.staged_status.map(|s| s.code()).unwrap_or(" ");
        let working = self.status.map(|s| s.code()).unwrap_or(" ");
        format!("{staged}{working}")
    }
}

/// Coarse repository state used in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoSummary {
    Clean,
    Changes(usize),
}

impl fmt::Display for RepoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoSummary::Clean => write!(f, "clean"),
            RepoSummary::Changes(n) => write!(f, "{n} changes"),
        }
    }
}

/// Parse `git status --porcelain=v1` output.
/// Format: `XY PATH` or `R  OLD -> NEW`. Lines shorter than four characters
/// are dropped and counted as skipped.
pub fn parse_status(raw: &[u8]) -> Parsed<Vec<FileChange>> {
    let text = String::from_utf8_lossy(raw);
    let mut files = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_status_line(line) {
            Some(file) => files.push(file),
            None => {
                tracing::debug!(line, "skipping malformed status line");
                skipped += 1;
            }
        }
    }

    Parsed::new(files, skipped)
}

fn parse_status_line(line: &str) -> Option<FileChange> {
    if line.len() < 4 {
        return None;
    }
    let mut codes = line.chars();
    let staged_code = codes.next()?;
    let working_code = codes.next()?;
    let mut path = line.get(3..)?.trim();

    if staged_code == 'R' {
        let parts: Vec<&str> = path.split(" -> ").collect();
        if parts.len() == 2 {
            path = parts[1];
        }
    }

    let staged_status = ChangeStatus::from_staged_code(staged_code);
    let status = ChangeStatus::from_working_code(working_code);

    Some(FileChange {
        path: unquote_path(path),
        status,
        staged_status,
        is_staged: staged_status.is_some(),
        is_untracked: working_code == '?',
    })
}

/// Undo git's C-style quoting of unusual paths (`"a\tb"`, `"caf\303\251"`)
pub(super) fn unquote_path(path: &str) -> String {
    let inner = match path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => return path.to_string(),
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('"') => bytes.push(b'"'),
            Some('\\') => bytes.push(b'\\'),
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Count entries of `git status --porcelain`
pub fn summarize_status(raw: &[u8]) -> RepoSummary {
    let text = String::from_utf8_lossy(raw);
    let count = text.lines().filter(|l| !l.trim().is_empty()).count();
    if count == 0 {
        RepoSummary::Clean
    } else {
        RepoSummary::Changes(count)
    }
}

/// Parse the output of `git log -1 --format=%ct`
pub fn parse_commit_time(raw: &str) -> GitResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GitError::NoCommits);
    }
    trimmed
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(GitError::NoCommits)
}

impl<R: CommandRunner> Git<R> {
    /// All working-tree and staging-area changes
    pub fn working_tree_status(&self) -> GitResult<Parsed<Vec<FileChange>>> {
        let out = self.run(&["status", "--porcelain=v1"])?;
        Ok(parse_status(&out))
    }

    /// Coarse clean/dirty summary of `git status --porcelain`
    pub fn status_summary(&self) -> GitResult<RepoSummary> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(summarize_status(&out))
    }

    pub fn has_uncommitted_changes(&self) -> GitResult<bool> {
        Ok(self.status_summary()? != RepoSummary::Clean)
    }

    /// Stage a single file
    pub fn stage_file(&self, path: &str) -> GitResult<()> {
        self.run(&["add", "--", path])?;
        Ok(())
    }

    /// Unstage a single file, keeping working-tree edits
    pub fn unstage_file(&self, path: &str) -> GitResult<()> {
        self.run(&["restore", "--staged", "--", path])?;
        Ok(())
    }

    /// Stage all files
    pub fn stage_all(&self) -> GitResult<()> {
        self.run(&["add", "-A"])?;
        Ok(())
    }

    /// Unified diff text for one file, against the index or (staged) HEAD
    pub fn diff_text(&self, path: &str, staged: bool) -> GitResult<String> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--staged");
        }
        args.extend(["--", path]);
        self.run_text(&args)
    }

    pub fn commit(&self, message: &str) -> GitResult<()> {
        self.run(&["commit", "-m", message])?;
        Ok(())
    }

    pub fn last_commit_time(&self) -> GitResult<DateTime<Utc>> {
        let out = self.run_text(&["log", "-1", "--format=%ct"])?;
        parse_commit_time(&out)
    }
}
