//! CLI command implementations.

mod chat;
mod condense;
mod config;
mod doctor;
mod serve;
mod split;

pub use chat::run_chat;
pub use condense::run_condense;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use split::run_split;
