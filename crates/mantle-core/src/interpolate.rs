//! Manifest rendering
//!
//! The first fragment in resolved order is the base document; every later
//! fragment is applied on top of it as an overlay, in order. All variable
//! sources are available throughout, with the optional inline document
//! taking precedence.
//!
//! Fragment precedence is purely lexicographic on the full path. Name
//! fragments with zero-padded numeric prefixes (`00-base.yml`,
//! `10-network.yml`) to encode the intended order.

use std::path::{Path, PathBuf};

use mantle_fs::{FileSetResolver, FragmentFile, VariableSource, checksum, io};
use tracing::{debug, info};

use crate::error::{EXIT_SKIPPED, ProcessFailure};
use crate::{Error, InterpolationEngine, InterpolationRequest, Result};

/// What to render and where to put it.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub fragment_dir: PathBuf,
    /// Overwritten on success, untouched on failure
    pub output: PathBuf,
    pub inline_vars: Option<PathBuf>,
    pub sources: Vec<VariableSource>,
    /// Treat a missing fragment directory like an empty one
    pub optional: bool,
}

impl RenderRequest {
    pub fn new(
        fragment_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        sources: Vec<VariableSource>,
    ) -> Self {
        Self {
            fragment_dir: fragment_dir.into(),
            output: output.into(),
            inline_vars: None,
            sources,
            optional: false,
        }
    }

    pub fn with_inline_vars(mut self, path: Option<PathBuf>) -> Self {
        self.inline_vars = path;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A manifest written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedManifest {
    pub path: PathBuf,
    /// Fragments in the order they were applied
    pub fragments: Vec<PathBuf>,
    /// `sha256:<hex>` of the written content
    pub checksum: String,
}

/// Result of a render that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderedManifest),
    /// There was legitimately nothing to render
    Skipped { fragment_dir: PathBuf },
}

impl RenderOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Rendered(_) => 0,
            Self::Skipped { .. } => EXIT_SKIPPED,
        }
    }

    pub fn manifest(&self) -> Option<&RenderedManifest> {
        match self {
            Self::Rendered(manifest) => Some(manifest),
            Self::Skipped { .. } => None,
        }
    }
}

/// Combines fragments and variable sources into one manifest.
///
/// Holds no mutable state; concurrent renders to different outputs are
/// independent.
pub struct ManifestInterpolator<'a> {
    engine: &'a InterpolationEngine<'a>,
    resolver: FileSetResolver,
}

impl<'a> ManifestInterpolator<'a> {
    pub fn new(engine: &'a InterpolationEngine<'a>, resolver: FileSetResolver) -> Self {
        Self { engine, resolver }
    }

    /// Fragments of a directory that must exist and must not be empty.
    pub fn fragments(&self, dir: &Path) -> Result<Vec<FragmentFile>> {
        let fragments = self.resolver.resolve(dir)?;
        if fragments.is_empty() {
            return Err(Error::EmptyFragmentSet {
                dir: dir.to_path_buf(),
            });
        }
        Ok(fragments)
    }

    pub fn render(&self, request: &RenderRequest) -> Result<RenderOutcome> {
        let skipped = || -> Result<RenderOutcome> {
            info!(dir = %request.fragment_dir.display(), "No fragments found, skipping render");
            Ok(RenderOutcome::Skipped {
                fragment_dir: request.fragment_dir.clone(),
            })
        };

        let fragments = match self.fragments(&request.fragment_dir) {
            Ok(fragments) => fragments,
            Err(Error::EmptyFragmentSet { .. }) => return skipped(),
            Err(Error::NotFound { .. }) if request.optional => return skipped(),
            Err(err) => return Err(err),
        };

        if let Some(inline) = &request.inline_vars
            && !inline.is_file()
        {
            return Err(Error::NotFound {
                path: inline.clone(),
            });
        }

        let mut paths = fragments.into_iter().map(|f| f.path);
        // fragments() guarantees at least one entry
        let Some(base) = paths.next() else {
            return skipped();
        };
        let overlays: Vec<PathBuf> = paths.collect();

        let interpolation = InterpolationRequest {
            base: base.clone(),
            overlays: overlays.clone(),
            var_files: request.sources.iter().map(|s| s.path.clone()).collect(),
            inline_vars: request.inline_vars.clone(),
            path: None,
        };

        let (command, output) = self.engine.run(&interpolation)?;
        if !output.success() {
            return Err(Error::ExternalProcess {
                command: command.to_string(),
                reason: ProcessFailure::Exit(output.code),
                output: output.combined(),
            });
        }

        io::write_atomic(&request.output, &output.stdout)?;
        let checksum = checksum::compute_content_checksum(&output.stdout);
        info!(
            output = %request.output.display(),
            fragments = overlays.len() + 1,
            %checksum,
            "Rendered manifest"
        );
        debug!(base = %base.display(), ?overlays, "Applied fragments");

        let mut applied = Vec::with_capacity(overlays.len() + 1);
        applied.push(base);
        applied.extend(overlays);
        Ok(RenderOutcome::Rendered(RenderedManifest {
            path: request.output.clone(),
            fragments: applied,
            checksum,
        }))
    }
}
