//! Command implementations for mantle-cli
//!
//! Each command returns the process exit status on success.

pub mod config;
pub mod deploy;
pub mod interpolate;
pub mod login;
pub mod session;
pub mod status;

pub use config::{run_cloud_config, run_runtime_config};
pub use deploy::run_apply;
pub use interpolate::run_interpolate;
pub use login::run_login;
pub use session::run_session;
pub use status::run_status;
