//! Orchestration loop
//!
//! Ties the session, tool catalog, and completion gateway together: one
//! completion round with tools enabled, sequential dispatch of any requested
//! tool calls, then a final tool-disabled round. Exactly one round of tool
//! use per query; a model that wants to chain tool calls cannot.

mod engine;

pub use engine::Orchestrator;
