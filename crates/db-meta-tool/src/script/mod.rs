//! SQL script handling: statement splitting and transactional execution.

mod runner;
mod splitter;

pub use runner::{FileSummary, RunSummary, ScriptFile, ScriptRunner};
pub use splitter::{strip_block_comments, StatementSplitter};
