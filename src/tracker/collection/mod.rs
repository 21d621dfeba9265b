pub mod collector;
pub mod host;
pub mod session;
