pub mod config;
pub mod enumerate;
pub mod errors;
pub mod grid;
pub mod matcher;
pub mod model;
pub mod server;
pub mod sheets;
pub mod state;

pub use config::{CliArgs, ServerConfig, TeamMapping};
pub use errors::{LookupError, SheetAccessError};
pub use state::AppState;
