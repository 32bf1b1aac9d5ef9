mod branch;
mod cli;
mod default_branch;
mod error;
mod log;
mod parsed;
mod stats;
mod status;

#[allow(unused_imports)]
pub use branch::{parse_branches, Branch};
pub use cli::{CommandRunner, Git, SystemRunner};
#[cfg(test)]
pub(crate) use cli::fake::FakeRunner;
pub use default_branch::{DefaultComparison, DEFAULT_BRANCH_CANDIDATES};
pub use error::{GitError, GitResult};
#[allow(unused_imports)]
pub use log::{parse_commits, parse_graph, Commit, GraphRow, LOG_FORMAT};
pub use parsed::Parsed;
pub use stats::{Divergence, LineStat};
pub use status::{ChangeStatus, FileChange, RepoSummary};
