use serde::Serialize;

use super::branch::validate_branch_name;
use super::cli::{CommandRunner, Git};
use super::error::{GitError, GitResult};
use super::stats::Divergence;

/// Conventional names probed when the remote does not advertise its HEAD
pub const DEFAULT_BRANCH_CANDIDATES: [&str; 4] = ["main", "master", "dev", "develop"];

/// Current branch measured against the repository's default branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultComparison {
    pub default_branch: String,
    pub is_default: bool,
    pub divergence: Divergence,
}

/// Pull the branch name out of `git remote show <remote>` output
pub fn parse_remote_show_head(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("HEAD branch:"))?;
    let name = line.split(':').nth(1)?.trim();
    // git prints "(unknown)" when the remote HEAD is ambiguous
    if name.is_empty() || name.starts_with('(') {
        return None;
    }
    Some(name.to_string())
}

/// Parse `git rev-list --left-right --count <default>...HEAD`.
/// The left count is commits only on the default branch (we are behind by
/// that many), the right count is commits only on HEAD (ahead).
pub fn parse_left_right_counts(output: &str) -> Divergence {
    let mut counts = output
        .split_whitespace()
        .map(|field| field.parse::<usize>().unwrap_or(0));
    let behind = counts.next().unwrap_or(0);
    let ahead = counts.next().unwrap_or(0);
    Divergence { ahead, behind }
}

impl<R: CommandRunner> Git<R> {
    /// Resolve the default branch: remote HEAD symref, then `remote show`,
    /// then the first conventional name that exists on the remote.
    pub fn default_branch(&self) -> GitResult<String> {
        if let Some(name) = self.default_from_symbolic_ref() {
            return Ok(name);
        }
        if let Some(name) = self.default_from_remote_show() {
            return Ok(name);
        }
        if let Some(name) = self.default_from_candidates() {
            return Ok(name);
        }
        Err(GitError::DefaultBranchUnresolved {
            remote: self.remote_name().to_string(),
        })
    }

    fn default_from_symbolic_ref(&self) -> Option<String> {
        let head_ref = format!("refs/remotes/{}/HEAD", self.remote_name());
        let out = match self.run_text(&["symbolic-ref", &head_ref, "--short"]) {
            Ok(out) => out,
            Err(err) => {
                tracing::debug!(%err, "symbolic-ref probe failed");
                return None;
            }
        };
        let short = out.trim();
        let prefix = format!("{}/", self.remote_name());
        let name = short.strip_prefix(&prefix).unwrap_or(short);
        (!name.is_empty()).then(|| name.to_string())
    }

    fn default_from_remote_show(&self) -> Option<String> {
        match self.run_text(&["remote", "show", self.remote_name()]) {
            Ok(out) => parse_remote_show_head(&out),
            Err(err) => {
                tracing::debug!(%err, "remote show probe failed");
                None
            }
        }
    }

    fn default_from_candidates(&self) -> Option<String> {
        self.candidates()
            .iter()
            .find(|name| {
                let remote_ref = format!("{}/{}", self.remote_name(), name);
                self.run(&["rev-parse", "--verify", &remote_ref]).is_ok()
            })
            .cloned()
    }

    /// Ahead/behind of HEAD relative to `<remote>/<default_branch>`
    pub fn compare_with_default(&self, default_branch: &str) -> GitResult<Divergence> {
        let range = format!("{}/{}...HEAD", self.remote_name(), default_branch);
        let out = self.run_text(&["rev-list", "--left-right", "--count", &range])?;
        Ok(parse_left_right_counts(&out))
    }

    /// Resolve the default branch and compare the current branch against it
    pub fn default_comparison(&self, current_branch: &str) -> GitResult<DefaultComparison> {
        let default_branch = self.default_branch()?;
        let is_default = current_branch == default_branch;
        let divergence = if is_default {
            Divergence::default()
        } else {
            self.compare_with_default(&default_branch)?
        };
        Ok(DefaultComparison {
            default_branch,
            is_default,
            divergence,
        })
    }

    /// Fetch the default branch and start a new branch from its remote tip
    pub fn create_branch_from_default(&self, name: &str) -> GitResult<()> {
        validate_branch_name(name)?;
        let default_branch = self.default_branch()?;
        self.run(&["fetch", self.remote_name(), &default_branch])?;
        let start = format!("{}/{}", self.remote_name(), default_branch);
        self.run(&["checkout", "-b", name, &start])?;
        Ok(())
    }
}
