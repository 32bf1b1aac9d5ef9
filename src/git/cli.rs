use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::default_branch::DEFAULT_BRANCH_CANDIDATES;
use super::error::{GitError, GitResult};

/// Runs an external program in a given directory and returns its stdout.
///
/// Implementations must fail with [`GitError::ExternalTool`] on a non-zero
/// exit and [`GitError::Launch`] when the program cannot be started. There is
/// no retry and no timeout; callers wanting a deadline wrap the runner.
pub trait CommandRunner: Send + Sync {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> GitResult<Vec<u8>>;
}

/// Spawns real child processes via `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> GitResult<Vec<u8>> {
        tracing::trace!(repo = ?dir, "Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Launch {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let command = format!("{} {}", program, args.join(" "));
            let output = combined_output(&output.stdout, &output.stderr, output.status.code());
            tracing::debug!(%command, %output, "command failed");
            return Err(GitError::ExternalTool { command, output });
        }

        Ok(output.stdout)
    }
}

/// Merge stdout and stderr of a failed command into one message
fn combined_output(stdout: &[u8], stderr: &[u8], code: Option<i32>) -> String {
    let stdout = String::from_utf8_lossy(stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(stderr).trim().to_string();
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => match code {
            Some(code) => format!("exited with status {code} and no output"),
            None => "terminated by signal with no output".to_string(),
        },
        (false, true) => stdout,
        (true, false) => stderr,
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

/// Handle on one repository: every command runs with `repo_root` as its
/// working directory, never the process cwd.
#[derive(Debug, Clone)]
pub struct Git<R = SystemRunner> {
    runner: R,
    repo_root: PathBuf,
    program: String,
    remote: String,
    default_candidates: Vec<String>,
}

impl Git<SystemRunner> {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self::with_runner(SystemRunner, repo_root)
    }
}

impl<R: CommandRunner> Git<R> {
    pub fn with_runner(runner: R, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo_root: repo_root.into(),
            program: "git".to_string(),
            remote: "origin".to_string(),
            default_candidates: DEFAULT_BRANCH_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Conventional names probed, in order, by the last default-branch strategy
    pub fn default_branch_candidates(mut self, candidates: Vec<String>) -> Self {
        self.default_candidates = candidates;
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn remote_name(&self) -> &str {
        &self.remote
    }

    pub(crate) fn candidates(&self) -> &[String] {
        &self.default_candidates
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a subcommand and return raw stdout bytes
    pub(crate) fn run(&self, args: &[&str]) -> GitResult<Vec<u8>> {
        self.runner.run(&self.repo_root, &self.program, args)
    }

    /// Run a subcommand and return stdout as (lossy) UTF-8 text
    pub(crate) fn run_text(&self, args: &[&str]) -> GitResult<String> {
        let out = self.run(args)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
