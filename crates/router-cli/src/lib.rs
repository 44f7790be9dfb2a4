//! Library surface of the `semantic-mcp-router` binary, split out so
//! integration tests and `main.rs` share the same modules.

pub mod cli;
pub mod logging;
pub mod server;
