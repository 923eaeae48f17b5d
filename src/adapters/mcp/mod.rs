//! MCP (Model Context Protocol) adapter.
//!
//! Exposes the reasoning operations as tools over newline-delimited JSON-RPC
//! on stdin/stdout.

pub mod stdio_server;

pub use stdio_server::StdioServer;
