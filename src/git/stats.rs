use serde::Serialize;
use std::collections::HashMap;

use super::cli::{CommandRunner, Git};
use super::error::GitResult;
use super::parsed::Parsed;
use super::status::unquote_path;

/// Placeholder git prints instead of counts for binary files
const BINARY_PLACEHOLDER: &str = "-";

/// Added/deleted line counts for one path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineStat {
    pub added: usize,
    pub deleted: usize,
}

impl LineStat {
    /// Sum of all per-file counts
    pub fn total<'a>(stats: impl IntoIterator<Item = &'a LineStat>) -> LineStat {
        stats.into_iter().fold(LineStat::default(), |acc, s| LineStat {
            added: acc.added + s.added,
            deleted: acc.deleted + s.deleted,
        })
    }
}

/// Commits ahead of / behind a reference branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub ahead: usize,
    pub behind: usize,
}

impl Divergence {
    pub fn is_even(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

/// Parse `git diff --numstat` into `path -> counts`.
/// Binary placeholders and unparsable numbers count as zero; a repeated path
/// keeps the last line.
pub fn parse_numstat(raw: &[u8]) -> Parsed<HashMap<String, LineStat>> {
    let text = String::from_utf8_lossy(raw);
    let mut stats = HashMap::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match split_numstat_line(line) {
            Some((added, deleted, path)) => {
                stats.insert(
                    path,
                    LineStat {
                        added: parse_count(added),
                        deleted: parse_count(deleted),
                    },
                );
            }
            None => {
                tracing::debug!(line, "skipping malformed numstat line");
                skipped += 1;
            }
        }
    }

    Parsed::new(stats, skipped)
}

/// `added<TAB>deleted<TAB>path`; falls back to whitespace fields, joining the
/// remainder as the path. Quoted paths are unquoted the same way as in status
/// output so both key on the same name.
fn split_numstat_line(line: &str) -> Option<(&str, &str, String)> {
    let tabbed: Vec<&str> = line.splitn(3, '\t').collect();
    if tabbed.len() == 3 && !tabbed[2].trim().is_empty() {
        return Some((tabbed[0].trim(), tabbed[1].trim(), unquote_path(tabbed[2])));
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return None;
    }
    Some((fields[0], fields[1], unquote_path(&fields[2..].join(" "))))
}

fn parse_count(field: &str) -> usize {
    if field == BINARY_PLACEHOLDER {
        return 0;
    }
    field.parse().unwrap_or(0)
}

/// Extract ahead/behind counts from upstream tracking text such as
/// `origin/main: ahead 2, behind 1`. Missing clauses and bad numbers are 0.
pub fn parse_upstream_divergence(upstream: &str) -> Divergence {
    let mut divergence = Divergence::default();
    let status = match upstream.split_once(':') {
        Some((_, status)) => status,
        None => return divergence,
    };

    let tokens: Vec<&str> = status
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    for pair in tokens.windows(2) {
        let count = pair[1].parse().unwrap_or(0);
        match pair[0] {
            "ahead" => divergence.ahead = count,
            "behind" => divergence.behind = count,
            _ => {}
        }
    }
    divergence
}

impl<R: CommandRunner> Git<R> {
    /// Per-file line counts of unstaged changes
    pub fn line_stats(&self) -> GitResult<Parsed<HashMap<String, LineStat>>> {
        let out = self.run(&["diff", "--numstat"])?;
        Ok(parse_numstat(&out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_numstat ──

    #[test]
    fn counts_per_path() {
        let parsed = parse_numstat(b"10\t2\tsrc/main.rs\n0\t5\tREADME.md\n");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.records["src/main.rs"],
            LineStat { added: 10, deleted: 2 }
        );
        assert_eq!(
            parsed.records["README.md"],
            LineStat { added: 0, deleted: 5 }
        );
    }

    #[test]
    fn binary_placeholder_is_zero() {
        let parsed = parse_numstat(b"-\t-\tlogo.png\n3\t-\thalf.bin\n");
        assert_eq!(parsed.records["logo.png"], LineStat::default());
        assert_eq!(
            parsed.records["half.bin"],
            LineStat { added: 3, deleted: 0 }
        );
    }

    #[test]
    fn garbage_numbers_are_zero() {
        let parsed = parse_numstat(b"x\t7\tfile.rs\n");
        assert_eq!(
            parsed.records["file.rs"],
            LineStat { added: 0, deleted: 7 }
        );
    }

    #[test]
    fn paths_with_spaces_survive() {
        let parsed = parse_numstat(b"1\t1\tdocs/my notes.md\n2 3 other dir/file.txt\n");
        assert!(parsed.records.contains_key("docs/my notes.md"));
        assert_eq!(
            parsed.records["other dir/file.txt"],
            LineStat { added: 2, deleted: 3 }
        );
    }

    #[test]
    fn quoted_paths_are_unquoted() {
        let raw = "3\t1\t\"caf\\303\\251.txt\"\n2\t0\t\"tab\\there.txt\"\n";
        let stats = parse_numstat(raw.as_bytes()).into_records();
        assert_eq!(stats.get("café.txt"), Some(&LineStat { added: 3, deleted: 1 }));
        assert_eq!(stats.get("tab\there.txt"), Some(&LineStat { added: 2, deleted: 0 }));
    }

    #[test]
    fn short_lines_are_skipped() {
        let parsed = parse_numstat(b"1\t2\n4\t4\tok.rs\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn last_write_wins_for_repeated_path() {
        let parsed = parse_numstat(b"1\t1\ta.rs\n9\t9\ta.rs\n");
        assert_eq!(parsed.records["a.rs"], LineStat { added: 9, deleted: 9 });
    }

    #[test]
    fn totals() {
        let parsed = parse_numstat(b"1\t2\ta\n3\t4\tb\n");
        assert_eq!(
            LineStat::total(parsed.records.values()),
            LineStat { added: 4, deleted: 6 }
        );
    }

    // ── parse_upstream_divergence ──

    #[test]
    fn ahead_and_behind() {
        let d = parse_upstream_divergence("origin/main: ahead 2, behind 1");
        assert_eq!(d, Divergence { ahead: 2, behind: 1 });
    }

    #[test]
    fn extra_whitespace_is_ignored() {
        let d = parse_upstream_divergence("origin/main:   ahead  2 ,  behind   1 ");
        assert_eq!(d, Divergence { ahead: 2, behind: 1 });
        assert_eq!(d, parse_upstream_divergence("origin/main:   ahead  2 ,  behind   1 "));
    }

    #[test]
    fn single_clauses() {
        assert_eq!(
            parse_upstream_divergence("origin/main: ahead 3"),
            Divergence { ahead: 3, behind: 0 }
        );
        assert_eq!(
            parse_upstream_divergence("origin/main: behind 4"),
            Divergence { ahead: 0, behind: 4 }
        );
    }

    #[test]
    fn no_status_clause() {
        assert!(parse_upstream_divergence("origin/main").is_even());
        assert!(parse_upstream_divergence("").is_even());
        assert!(parse_upstream_divergence("origin/gone: gone").is_even());
    }

    #[test]
    fn bad_count_is_zero() {
        assert_eq!(
            parse_upstream_divergence("origin/main: ahead many, behind 2"),
            Divergence { ahead: 0, behind: 2 }
        );
    }
}
