//! Storage is organized through [document_store::DocumentStore].
//! The basic idea is:
//!   - A store holds JSON documents under string keys.
//!   - The tracker keeps the whole [entities::TimeStore] under a single key.
//!   - The reporting server keeps one document per user.

pub mod document_store;
pub mod entities;
pub mod time_data;
