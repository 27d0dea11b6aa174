//! Process lifecycle: shutdown and reload signals

mod shutdown;

pub use shutdown::{Signal, Signals};
