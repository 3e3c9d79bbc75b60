//! Feed acquisition: transport, per-source parsers, and the fallback orchestrator.

pub mod github_api;
pub mod orchestrator;
pub mod rich_json;
pub mod simple_text;
pub mod source;
pub mod transport;
