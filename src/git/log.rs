use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cli::{CommandRunner, Git};
use super::error::GitResult;
use super::parsed::Parsed;

/// `--pretty` format of the typed log: hash|short|author|email|date|refs|parents|subject
pub const LOG_FORMAT: &str = "%H|%h|%an|%ae|%at|%D|%P|%s";

const FIELD_COUNT: usize = 8;

/// Separates graph glyphs from commit fields in the combined graph log
const GRAPH_MARKER: char = '\u{1e}';

/// One commit of `git log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    pub email: String,
    pub date: DateTime<Utc>,
    /// Decorations (branches, tags) in the order git prints them
    pub refs: Vec<String>,
    /// Empty for root commits, two or more for merges
    pub parents: Vec<String>,
    pub subject: String,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// One line of `git log --graph`: the glyph prefix plus the commit drawn on
/// that line, if any. Connector-only lines (`|\`, `|/`) carry no commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphRow {
    pub glyphs: String,
    pub commit: Option<Commit>,
}

/// Parse one `LOG_FORMAT` line. The subject is everything after the seventh
/// delimiter so subjects containing `|` stay intact.
pub fn parse_commit_line(line: &str) -> Option<Commit> {
    let parts: Vec<&str> = line.splitn(FIELD_COUNT, '|').collect();
    if parts.len() < FIELD_COUNT {
        return None;
    }

    let date = parts[4]
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default();

    let refs = parts[5]
        .split(", ")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    let parents = parts[6].split_whitespace().map(str::to_string).collect();

    Some(Commit {
        hash: parts[0].to_string(),
        short_hash: parts[1].to_string(),
        author: parts[2].to_string(),
        email: parts[3].to_string(),
        date,
        refs,
        parents,
        subject: parts[7].to_string(),
    })
}

/// Parse `git log --pretty=format:LOG_FORMAT` output
pub fn parse_commits(raw: &[u8]) -> Parsed<Vec<Commit>> {
    let text = String::from_utf8_lossy(raw);
    let mut commits = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_commit_line(line) {
            Some(commit) => commits.push(commit),
            None => {
                tracing::debug!(line, "skipping malformed log line");
                skipped += 1;
            }
        }
    }

    Parsed::new(commits, skipped)
}

/// Parse `git log --graph --pretty=format:%x1e<LOG_FORMAT>` output.
/// A marked line whose fields do not parse still yields its glyph row and is
/// counted as skipped.
pub fn parse_graph(raw: &[u8]) -> Parsed<Vec<GraphRow>> {
    let text = String::from_utf8_lossy(raw);
    let mut rows = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        let row = match line.split_once(GRAPH_MARKER) {
            Some((glyphs, fields)) => {
                let commit = parse_commit_line(fields);
                if commit.is_none() {
                    tracing::debug!(line, "skipping malformed graph commit");
                    skipped += 1;
                }
                GraphRow {
                    glyphs: glyphs.to_string(),
                    commit,
                }
            }
            None => GraphRow {
                glyphs: line.to_string(),
                commit: None,
            },
        };
        rows.push(row);
    }

    Parsed::new(rows, skipped)
}

fn limit_arg(limit: Option<usize>) -> Option<String> {
    limit.filter(|n| *n > 0).map(|n| format!("-{n}"))
}

impl<R: CommandRunner> Git<R> {
    /// Typed history of all branches in date order
    #[allow(dead_code)]
    pub fn commits(&self, limit: Option<usize>) -> GitResult<Parsed<Vec<Commit>>> {
        let format = format!("--pretty=format:{LOG_FORMAT}");
        let mut args = vec!["log", format.as_str(), "--all", "--date-order"];
        let limit = limit_arg(limit);
        if let Some(ref limit) = limit {
            args.push(limit);
        }
        let out = self.run(&args)?;
        Ok(parse_commits(&out))
    }

    /// Commit graph in a single invocation, glyphs and fields on the same line
    pub fn commit_graph(&self, limit: Option<usize>) -> GitResult<Parsed<Vec<GraphRow>>> {
        let format = format!("--pretty=format:%x1e{LOG_FORMAT}");
        let mut args = vec!["log", "--graph", format.as_str(), "--all", "--date-order"];
        let limit = limit_arg(limit);
        if let Some(ref limit) = limit {
            args.push(limit);
        }
        let out = self.run(&args)?;
        Ok(parse_graph(&out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::cli::fake::FakeRunner;

    const FULL: &str = "1111111111111111111111111111111111111111";

    fn line(short: &str, refs: &str, parents: &str, subject: &str) -> String {
        format!("{FULL}|{short}|Ada Lovelace|ada@example.com|1700000000|{refs}|{parents}|{subject}")
    }

    // ── parse_commits ──

    #[test]
    fn parses_all_fields() {
        let raw = line("1111111", "HEAD -> main, origin/main, tag: v1.0", "aaa bbb", "Merge branch 'x'");
        let parsed = parse_commits(raw.as_bytes());
        assert_eq!(parsed.skipped, 0);
        let commit = &parsed.records[0];
        assert_eq!(commit.hash, FULL);
        assert_eq!(commit.short_hash, "1111111");
        assert_eq!(commit.author, "Ada Lovelace");
        assert_eq!(commit.email, "ada@example.com");
        assert_eq!(commit.date.timestamp(), 1_700_000_000);
        assert_eq!(commit.refs, vec!["HEAD -> main", "origin/main", "tag: v1.0"]);
        assert_eq!(commit.parents, vec!["aaa", "bbb"]);
        assert!(commit.is_merge());
        assert_eq!(commit.subject, "Merge branch 'x'");
    }

    #[test]
    fn root_commit_has_no_parents_or_refs() {
        let raw = line("1111111", "", "", "initial");
        let commit = parse_commit_line(&raw).unwrap();
        assert!(commit.parents.is_empty());
        assert!(commit.refs.is_empty());
        assert!(!commit.is_merge());
    }

    #[test]
    fn malformed_line_among_well_formed_is_dropped() {
        let raw = format!(
            "{}\n{}\nnot|enough|fields\n{}\n",
            line("1111111", "", "p", "one"),
            line("2222222", "", "p", "two"),
            line("3333333", "", "p", "three"),
        );
        let parsed = parse_commits(raw.as_bytes());
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.skipped, 1);
        let subjects: Vec<&str> = parsed.records.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(subjects, vec!["one", "two", "three"]);
    }

    #[test]
    fn pipe_in_subject_is_preserved() {
        let commit = parse_commit_line(&line("1111111", "", "p", "a | b")).unwrap();
        assert_eq!(commit.subject, "a | b");
    }

    #[test]
    fn bad_timestamp_falls_back_to_epoch() {
        let raw = format!("{FULL}|1111111|A|a@b|soon||p|s");
        let commit = parse_commit_line(&raw).unwrap();
        assert_eq!(commit.date.timestamp(), 0);
    }

    // ── parse_graph ──

    #[test]
    fn graph_rows_split_glyphs_from_commits() {
        let raw = format!(
            "* \u{1e}{}\n|\\  \n| * \u{1e}{}\n|/  \n* \u{1e}{}\n",
            line("1111111", "HEAD -> main", "2222222 3333333", "merge"),
            line("3333333", "", "2222222", "side"),
            line("2222222", "", "", "root"),
        );
        let parsed = parse_graph(raw.as_bytes());
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records.len(), 5);

        assert_eq!(parsed.records[0].glyphs, "* ");
        assert_eq!(
            parsed.records[0].commit.as_ref().map(|c| c.short_hash.as_str()),
            Some("1111111")
        );
        assert_eq!(parsed.records[1].glyphs, "|\\  ");
        assert!(parsed.records[1].commit.is_none());
        assert_eq!(parsed.records[2].glyphs, "| * ");
        assert_eq!(
            parsed.records[2].commit.as_ref().map(|c| c.subject.as_str()),
            Some("side")
        );
    }

    #[test]
    fn graph_row_with_broken_fields_keeps_glyphs() {
        let parsed = parse_graph("* \u{1e}only|three|fields\n".as_bytes());
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.records[0].glyphs, "* ");
        assert!(parsed.records[0].commit.is_none());
    }

    // ── commands ──

    #[test]
    fn commits_invocation_with_limit() {
        let key = format!("log --pretty=format:{LOG_FORMAT} --all --date-order -100");
        let git = Git::with_runner(
            FakeRunner::new().ok(&key, &line("1111111", "", "", "s")),
            "/repo",
        );
        let parsed = git.commits(Some(100)).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(git.runner().was_called(&key));
    }

    #[test]
    fn graph_invocation_without_limit() {
        let key = format!("log --graph --pretty=format:%x1e{LOG_FORMAT} --all --date-order");
        let git = Git::with_runner(FakeRunner::new().ok(&key, "* \u{1e}x\n"), "/repo");
        let parsed = git.commit_graph(None).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
    }
}
