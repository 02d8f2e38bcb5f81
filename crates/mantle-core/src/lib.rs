//! Manifest assembly and session credential discovery
//!
//! This crate renders layered deployment manifests and discovers the
//! session facts needed to talk to the director and the credential store.
//!
//! # Architecture
//!
//! - [`ManifestInterpolator`] combines fragments and variable sources into
//!   one manifest through the external [`InterpolationEngine`]
//! - [`VariableSearchIndex`] finds the first variable source defining a key
//! - [`SessionCredentialResolver`] fills a [`SessionEnvironment`] using
//!   per-fact fallback policies
//! - [`CredentialStoreBootstrapper`] logs in to the credential store with
//!   trust chains held in [`ScopedTempFile`]s
//! - [`DirectorClient`] drives the director with the exported session
//!
//! File discovery lives in `mantle-fs`; process execution in `mantle-exec`.

pub mod cleanup;
pub mod credentials;
pub mod credstore;
pub mod director;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod key;
pub mod probe;
pub mod search;
pub mod session;
pub mod settings;

pub use cleanup::{CleanupRegistry, ManifestDestination, ScopedTempFile};
pub use credentials::SessionCredentialResolver;
pub use credstore::{CredentialStoreBootstrapper, TrustChainKeys, credhub_url};
pub use director::{DirectorAction, DirectorClient, EnvironmentInfo};
pub use engine::{InterpolationEngine, InterpolationRequest, ensure_success};
pub use error::{EXIT_SKIPPED, Error, ProcessFailure, Result};
pub use interpolate::{ManifestInterpolator, RenderOutcome, RenderRequest, RenderedManifest};
pub use key::KeyPath;
pub use probe::{ReachabilityProbe, TcpProbe};
pub use search::{VariableSearchIndex, VariableSearchResult, lookup_in};
pub use session::{SessionCredentials, SessionEnvironment};
pub use settings::{
    CONFIG_FILE, CredentialStoreSettings, LoggingSettings, SessionSettings, Settings,
    SettingsResolver, ToolSettings,
};

// Re-exported so callers need not depend on the lower crates directly
pub use mantle_fs::{EnvironmentLayout, FileSetResolver, LayoutConfig, VariableSource};
