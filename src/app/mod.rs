pub mod snapshot;
mod state;

pub use snapshot::{Category, Snapshot};
pub use state::{App, PromptKind, View};
