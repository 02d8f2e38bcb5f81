//! Filesystem layer for mantle
//!
//! Discovers manifest fragments and variable sources under an environment
//! root, loads layered configuration files and writes rendered output
//! atomically.

pub mod checksum;
pub mod config;
pub mod error;
pub mod fragments;
pub mod io;
pub mod layout;
pub mod sources;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use fragments::{FileSetResolver, FragmentFile, FragmentFilter};
pub use layout::{EnvironmentLayout, LayoutConfig};
pub use sources::{Provenance, VariableSource, aggregate_variable_sources};
