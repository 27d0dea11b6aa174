//! IPC module for status observers and external recognizers

mod protocol;
mod server;

pub use server::{Server, ServerContext};
