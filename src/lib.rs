pub mod core;
pub mod models;

pub use crate::core::execute::{run, run_until};
pub use crate::models::config::{ClientIdentity, LoadConfig, ReportFormat};
pub use crate::models::error::ConfigError;
pub use crate::models::result::{RunSummary, WindowReport, WindowSnapshot};
