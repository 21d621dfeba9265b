//! Tracks how long the active browser tab stays on each website and sorts that time into
//! productive, unproductive and neutral. Data is kept per day in a local file, shown in a
//! terminal dashboard, and can be pushed to a small reporting server.
//!

pub mod classify;
pub mod cli;
pub mod fs;
pub mod server;
pub mod storage;
pub mod tracker;
pub mod utils;
