//! MCP (Model Context Protocol) server exposing the recommender over stdio.
//!
//! JSON-RPC 2.0 messages, one per line, protocol version 2025-06-18.


pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{ConnectionState, McpServer, MessageHandler, ToolHandler};
