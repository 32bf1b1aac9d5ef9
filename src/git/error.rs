use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed: {output}")]
    ExternalTool { command: String, output: String },
    #[error("could not resolve the default branch of remote `{remote}`")]
    DefaultBranchUnresolved { remote: String },
    #[error("repository has no commits")]
    NoCommits,
    #[error("invalid branch name: {0:?}")]
    InvalidBranchName(String),
}

pub type GitResult<T> = Result<T, GitError>;
