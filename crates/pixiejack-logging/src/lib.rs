//! Tracing setup shared by the pixiejack binary and its libraries.

pub mod config;
pub mod fs;
pub mod init;
pub mod retention;
pub mod targets;

pub use config::LoggingConfig;
pub use fs::{read_config, write_config_atomic};
pub use init::{init, LoggingGuards};
pub use retention::run_retention;
pub use targets::T_WPS;
