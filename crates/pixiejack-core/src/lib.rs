//! Orchestration for the `pixiejack` binary: target selection, the WPS
//! session driver, Pixie Dust follow-up and credential reporting.

pub mod cli;
pub mod config;
pub mod context;
pub mod loot;
pub mod report;
pub mod select;
pub mod session;

pub use cli::Cli;
pub use config::{Config, COMPONENT};
pub use context::{install_interrupt_handler, SessionContext, SharedContext};
pub use loot::{save_credentials, Credentials};
pub use report::{Marker, Reporter};
pub use select::{parse_selection, render_table, select_target, Selection};
pub use session::{AttemptReport, RunReport, SessionDriver, SessionOptions};
