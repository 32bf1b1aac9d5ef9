use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::git::DEFAULT_BRANCH_CANDIDATES;

const LOCAL_CONFIG_FILE: &str = ".rdash.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// [refresh] section: when the dashboard re-fetches repository state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_true")]
    pub watch: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// [git] section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
    #[serde(default = "default_candidates")]
    pub default_branch_candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_remote_branches: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_program() -> String {
    "git".into()
}

fn default_remote() -> String {
    "origin".into()
}

fn default_log_limit() -> usize {
    100
}

fn default_candidates() -> Vec<String> {
    DEFAULT_BRANCH_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            watch: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            remote: default_remote(),
            log_limit: default_log_limit(),
            default_branch_candidates: default_candidates(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_remote_branches: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Global config location (`~/.config/rdash/config.toml` on Linux)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rdash").join("config.toml"))
}

/// Load config by merging global defaults with per-repo overrides.
/// Priority: per-repo `.rdash.toml` > global config > built-in defaults.
/// Merging is deep: individual fields within sections override independently.
pub fn load_config(repo_root: &Path) -> DashConfig {
    load_config_from(global_config_path().as_deref(), &repo_root.join(LOCAL_CONFIG_FILE))
}

fn load_config_from(global_path: Option<&Path>, local_path: &Path) -> DashConfig {
    let global_table = global_path.and_then(read_table);
    let local_table = read_table(local_path);

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            global
        }
        (Some(global), None) => global,
        (None, Some(local)) => local,
        (None, None) => return DashConfig::default(),
    };

    toml::Value::Table(merged).try_into().unwrap_or_else(|err| {
        tracing::warn!(%err, "invalid config, using defaults");
        DashConfig::default()
    })
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(table) => Some(table),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring unparsable config file");
            None
        }
    }
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(None, &dir.path().join(LOCAL_CONFIG_FILE));
        assert_eq!(config, DashConfig::default());
        assert_eq!(config.refresh.interval_ms, 2000);
        assert_eq!(config.git.remote, "origin");
        assert_eq!(
            config.git.default_branch_candidates,
            vec!["main", "master", "dev", "develop"]
        );
    }

    #[test]
    fn local_overrides_single_fields() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&local, "[git]\nremote = \"upstream\"\n").unwrap();

        let config = load_config_from(None, &local);
        assert_eq!(config.git.remote, "upstream");
        assert_eq!(config.git.log_limit, 100);
        assert!(config.refresh.watch);
    }

    #[test]
    fn local_wins_over_global_and_merges_deeply() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let local = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(
            &global,
            "[refresh]\ninterval_ms = 5000\nwatch = false\n[git]\nlog_limit = 50\n",
        )
        .unwrap();
        fs::write(&local, "[refresh]\ninterval_ms = 1000\n").unwrap();

        let config = load_config_from(Some(&global), &local);
        assert_eq!(config.refresh.interval_ms, 1000);
        assert!(!config.refresh.watch);
        assert_eq!(config.git.log_limit, 50);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&local, "this is = = not toml").unwrap();
        assert_eq!(load_config_from(None, &local), DashConfig::default());
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&local, "[refresh]\ninterval_ms = \"fast\"\n").unwrap();
        assert_eq!(load_config_from(None, &local), DashConfig::default());
    }

    #[test]
    fn deep_merge_replaces_scalars_and_merges_tables() {
        let mut base: toml::Table = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Table = toml::from_str("a = 2\n[t]\ny = 3\n").unwrap();
        deep_merge(&mut base, overlay);
        assert_eq!(base["a"].as_integer(), Some(2));
        assert_eq!(base["t"]["x"].as_integer(), Some(1));
        assert_eq!(base["t"]["y"].as_integer(), Some(3));
    }
}
