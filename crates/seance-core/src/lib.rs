pub mod actions;
pub mod commands;
pub mod config;
pub mod persistence;
pub mod phase;
pub mod reducer;
pub mod state;

pub use actions::*;
pub use config::EngineConfig;
pub use persistence::*;
pub use phase::*;
pub use reducer::*;
pub use state::*;
