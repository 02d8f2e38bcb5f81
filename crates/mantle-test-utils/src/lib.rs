//! Shared test utilities for the mantle workspace.
//!
//! This crate is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`env`]: [`TestEnv`] builder for environment roots on disk
//! - [`toolchain`]: [`FakeToolchain`], a `CommandRunner` standing in for
//!   the interpolation engine, the director and the credential store

pub mod env;
pub mod toolchain;

pub use env::TestEnv;
pub use toolchain::{FakeToolchain, ObservedFile};
