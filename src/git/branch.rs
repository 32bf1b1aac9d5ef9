use serde::Serialize;

use super::cli::{CommandRunner, Git};
use super::error::{GitError, GitResult};
use super::parsed::Parsed;
use super::stats::{parse_upstream_divergence, Divergence};

/// One entry of `git branch -vv --all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    /// Branch name; `remotes/` is stripped for remote-tracking branches
    pub name: String,
    pub hash: String,
    pub is_current: bool,
    pub is_remote: bool,
    /// Raw bracketed tracking text, e.g. `origin/main: ahead 2, behind 1`
    pub upstream: String,
    pub last_commit: String,
}

impl Branch {
    /// Ahead/behind counts relative to the upstream, zero when untracked
    pub fn divergence(&self) -> Divergence {
        parse_upstream_divergence(&self.upstream)
    }
}

/// Parse `git branch -vv --all` output.
///
/// Line shape: `[*] name hash [upstream] message`. Lines that do not yield
/// at least a name and a hash are skipped. The trailing message is located
/// by the first occurrence of the hash text in the line, so a hash that also
/// appears earlier (e.g. inside the branch name) shifts the message start.
pub fn parse_branches(raw: &[u8]) -> Parsed<Vec<Branch>> {
    let text = String::from_utf8_lossy(raw);
    let mut branches = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_branch_line(line) {
            BranchLine::Branch(branch) => branches.push(branch),
            BranchLine::Alias => {}
            BranchLine::Malformed => {
                tracing::debug!(line, "skipping malformed branch line");
                skipped += 1;
            }
        }
    }

    Parsed::new(branches, skipped)
}

enum BranchLine {
    Branch(Branch),
    /// `remotes/origin/HEAD -> origin/main`: a symbolic ref, not a branch
    Alias,
    Malformed,
}

fn parse_branch_line(line: &str) -> BranchLine {
    // '+' marks a branch checked out in another worktree
    let (is_current, in_worktree, rest) = match line.strip_prefix('*') {
        Some(rest) => (true, false, rest),
        None => match line.strip_prefix('+') {
            Some(rest) => (false, true, rest),
            None => (false, false, line),
        },
    };
    let line = rest.trim();

    // Detached HEAD: "(HEAD detached at 1a2b3c4) 1a2b3c4 message"
    let (name, after_name, detached) =
        match line.strip_prefix('(').and_then(|l| l.split_once(')')) {
            Some((inner, tail)) => (format!("({inner})"), tail, true),
            None => match line.split_once(char::is_whitespace) {
                Some((name, tail)) => (name.to_string(), tail, false),
                None => return BranchLine::Malformed,
            },
        };

    let mut tokens = after_name.split_whitespace();
    let hash = match tokens.next() {
        Some(hash) => hash,
        None => return BranchLine::Malformed,
    };
    if name.is_empty() {
        return BranchLine::Malformed;
    }
    if hash == "->" {
        return BranchLine::Alias;
    }

    let (is_remote, name) = match name.strip_prefix("remotes/") {
        Some(stripped) => (true, stripped.to_string()),
        None => (false, name),
    };

    // The detached label usually repeats the hash, so search past it
    let haystack = if detached { after_name } else { line };
    let mut after_hash = haystack
        .find(hash)
        .map_or("", |idx| &haystack[idx + hash.len()..]);

    let upstream = if in_worktree {
        // "+ name hash (/path/to/worktree) [upstream] message"
        after_hash = strip_worktree_path(after_hash);
        if after_hash.trim_start().starts_with('[') {
            extract_bracketed(after_hash).unwrap_or_default()
        } else {
            String::new()
        }
    } else {
        match tokens.next() {
            Some(token) if token.starts_with('[') => extract_bracketed(line).unwrap_or_default(),
            _ => String::new(),
        }
    };

    let last_commit = strip_leading_bracket(after_hash).trim().to_string();

    BranchLine::Branch(Branch {
        name,
        hash: hash.to_string(),
        is_current,
        is_remote,
        upstream,
        last_commit,
    })
}

/// Text between the first `[` and the first `]` of the line
fn extract_bracketed(line: &str) -> Option<String> {
    let start = line.find('[')?;
    let end = line.find(']')?;
    (end > start).then(|| line[start + 1..end].to_string())
}

fn strip_leading_bracket(message: &str) -> &str {
    let trimmed = message.trim_start();
    if trimmed.starts_with('[') {
        if let Some(end) = trimmed.find(']') {
            return &trimmed[end + 1..];
        }
    }
    trimmed
}

/// Drop the parenthesised worktree path git prints after the hash
fn strip_worktree_path(after_hash: &str) -> &str {
    let trimmed = after_hash.trim_start();
    if trimmed.starts_with('(') {
        if let Some(end) = trimmed.find(')') {
            return &trimmed[end + 1..];
        }
    }
    after_hash
}

pub(super) fn validate_branch_name(name: &str) -> GitResult<()> {
    if name.trim().is_empty() || name.starts_with('-') {
        return Err(GitError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

impl<R: CommandRunner> Git<R> {
    /// All local and remote-tracking branches
    pub fn branches(&self) -> GitResult<Parsed<Vec<Branch>>> {
        let out = self.run(&["branch", "-vv", "--all"])?;
        Ok(parse_branches(&out))
    }

    /// Name of the checked-out branch; empty when HEAD is detached
    pub fn current_branch(&self) -> GitResult<String> {
        Ok(self.run_text(&["branch", "--show-current"])?.trim().to_string())
    }

    pub fn switch_branch(&self, name: &str) -> GitResult<()> {
        validate_branch_name(name)?;
        self.run(&["checkout", name])?;
        Ok(())
    }

    pub fn create_branch(&self, name: &str) -> GitResult<()> {
        validate_branch_name(name)?;
        self.run(&["branch", name])?;
        Ok(())
    }

    /// Delete a local branch; `force` also drops unmerged work
    pub fn delete_branch(&self, name: &str, force: bool) -> GitResult<()> {
        validate_branch_name(name)?;
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, name])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::cli::fake::FakeRunner;

    const LISTING: &str = "\
* main                  a1b2c3d [origin/main: ahead 2, behind 1] fix bug
  feature/login         e4f5a6b [origin/feature/login] add login form
  scratch               0badf00 wip
  remotes/origin/HEAD   -> origin/main
  remotes/origin/main   9f8e7d6 merge pull request
";

    #[test]
    fn current_branch_with_upstream() {
        let parsed = parse_branches(b"* main a1b2c3d [origin/main: ahead 2, behind 1] fix bug");
        assert_eq!(
            parsed.records,
            vec![Branch {
                name: "main".to_string(),
                hash: "a1b2c3d".to_string(),
                is_current: true,
                is_remote: false,
                upstream: "origin/main: ahead 2, behind 1".to_string(),
                last_commit: "fix bug".to_string(),
            }]
        );
    }

    #[test]
    fn full_listing() {
        let parsed = parse_branches(LISTING.as_bytes());
        assert_eq!(parsed.skipped, 0);
        let names: Vec<&str> = parsed.records.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "feature/login", "scratch", "origin/main"]);

        let feature = &parsed.records[1];
        assert_eq!(feature.upstream, "origin/feature/login");
        assert_eq!(feature.last_commit, "add login form");

        let scratch = &parsed.records[2];
        assert_eq!(scratch.upstream, "");
        assert_eq!(scratch.last_commit, "wip");

        let remote = &parsed.records[3];
        assert!(remote.is_remote);
        assert_eq!(remote.hash, "9f8e7d6");
    }

    #[test]
    fn exactly_one_current_branch() {
        let parsed = parse_branches(LISTING.as_bytes());
        let current: Vec<&Branch> = parsed.records.iter().filter(|b| b.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "main");
    }

    #[test]
    fn local_and_remote_variants_are_distinct() {
        let parsed = parse_branches(b"  main 111aaaa msg\n  remotes/origin/main 111aaaa msg\n");
        assert_eq!(parsed.records.len(), 2);
        assert!(!parsed.records[0].is_remote);
        assert!(parsed.records[1].is_remote);
    }

    #[test]
    fn single_token_line_is_skipped() {
        let parsed = parse_branches(b"  lonely\n  ok 1234567 msg\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn missing_message_is_empty() {
        let parsed = parse_branches(b"  bare 1234567\n");
        assert_eq!(parsed.records[0].last_commit, "");
    }

    #[test]
    fn brackets_inside_message_are_kept() {
        let parsed = parse_branches(b"  topic 1234567 fix [ci] flake\n");
        assert_eq!(parsed.records[0].upstream, "");
        assert_eq!(parsed.records[0].last_commit, "fix [ci] flake");
    }

    #[test]
    fn other_worktree_marker_is_not_current() {
        let parsed = parse_branches(b"+ hotfix 7654321 [origin/hotfix] patch\n");
        let branch = &parsed.records[0];
        assert_eq!(branch.name, "hotfix");
        assert!(!branch.is_current);
        assert_eq!(branch.last_commit, "patch");
    }

    #[test]
    fn worktree_path_is_not_part_of_upstream_or_message() {
        let parsed =
            parse_branches(b"+ hotfix 7654321 (/home/u/wt) [origin/hotfix: ahead 1] patch\n");
        let branch = &parsed.records[0];
        assert_eq!(branch.name, "hotfix");
        assert_eq!(branch.hash, "7654321");
        assert!(!branch.is_current);
        assert_eq!(branch.upstream, "origin/hotfix: ahead 1");
        assert_eq!(branch.last_commit, "patch");
        assert_eq!(branch.divergence().ahead, 1);
    }

    #[test]
    fn untracked_worktree_branch_keeps_message() {
        let parsed = parse_branches(b"+ hotfix d614ab2 (/tmp/wtp/my wt) init\n");
        let branch = &parsed.records[0];
        assert_eq!(branch.upstream, "");
        assert_eq!(branch.last_commit, "init");
    }

    #[test]
    fn detached_head_keeps_parenthesised_name() {
        let parsed = parse_branches(b"* (HEAD detached at 1a2b3c4) 1a2b3c4 some commit\n");
        let branch = &parsed.records[0];
        assert_eq!(branch.name, "(HEAD detached at 1a2b3c4)");
        assert_eq!(branch.hash, "1a2b3c4");
        assert!(branch.is_current);
        assert_eq!(branch.last_commit, "some commit");
    }

    #[test]
    fn hash_recurring_in_name_shifts_message() {
        // Known limitation: message starts after the first hash occurrence.
        let parsed = parse_branches(b"  abc-abc1234 abc1234 message\n");
        assert_eq!(parsed.records[0].last_commit, "abc1234 message");
    }

    #[test]
    fn divergence_from_upstream() {
        let parsed = parse_branches(b"* main a1b2c3d [origin/main: ahead 2, behind 1] fix bug");
        let d = parsed.records[0].divergence();
        assert_eq!((d.ahead, d.behind), (2, 1));
    }

    // ── commands ──

    #[test]
    fn branch_mutations_use_expected_arguments() {
        let git = Git::with_runner(
            FakeRunner::new()
                .ok("checkout dev", "")
                .ok("branch topic", "")
                .ok("branch -d topic", "")
                .ok("branch -D topic", ""),
            "/repo",
        );
        git.switch_branch("dev").unwrap();
        git.create_branch("topic").unwrap();
        git.delete_branch("topic", false).unwrap();
        git.delete_branch("topic", true).unwrap();
        assert_eq!(
            git.runner().calls(),
            vec!["checkout dev", "branch topic", "branch -d topic", "branch -D topic"]
        );
    }

    #[test]
    fn empty_branch_name_is_rejected_without_spawning() {
        let git = Git::with_runner(FakeRunner::new(), "/repo");
        assert!(matches!(
            git.create_branch("  "),
            Err(GitError::InvalidBranchName(_))
        ));
        assert!(git.runner().calls().is_empty());
    }

    #[test]
    fn current_branch_is_trimmed() {
        let git = Git::with_runner(
            FakeRunner::new().ok("branch --show-current", "feature/x\n"),
            "/repo",
        );
        assert_eq!(git.current_branch().unwrap(), "feature/x");
    }
}
