pub mod config_manager;
pub mod error;
pub mod state;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use state::*;
pub use types::*;
