pub mod analysis;
pub mod cli;
pub mod commands;
pub mod error;
pub mod format;
pub mod queue;
pub mod shard;
pub mod storage;
pub mod tracking;
pub mod tui;

pub use error::{Error, Result};
