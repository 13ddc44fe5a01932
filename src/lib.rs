//! Demo agents and configuration for the `weft` binary.

mod llm;
pub mod search_agent;
pub mod settings;
pub mod sql_agent;
