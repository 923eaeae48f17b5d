//! Adapters implementing domain ports and external surfaces.

pub mod mcp;
pub mod memory;
pub mod sqlite;
