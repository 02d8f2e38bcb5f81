//! Interpolate command implementation

use std::io::Write;
use std::path::{Path, PathBuf};

use mantle_core::{
    InterpolationEngine, ManifestDestination, ManifestInterpolator, RenderOutcome, RenderRequest,
};
use mantle_fs::{FileSetResolver, aggregate_variable_sources};

use crate::cli::{FragmentSet, RenderArgs};
use crate::context::Context;
use crate::error::Result;

/// A render attempt and where its manifest went.
pub struct Rendered {
    pub outcome: RenderOutcome,
    pub destination: ManifestDestination,
}

impl Rendered {
    pub fn manifest_path(&self) -> Option<&Path> {
        self.outcome.manifest().map(|m| m.path.as_path())
    }
}

fn fragment_dir(ctx: &Context, set: FragmentSet) -> PathBuf {
    match set {
        FragmentSet::Operations => ctx.layout.operations_dir(),
        FragmentSet::CloudConfig => ctx.layout.cloud_config_dir(),
        FragmentSet::RuntimeConfig => ctx.layout.runtime_config_dir(),
    }
}

/// Render `set` to `output`, or to a scoped temporary file.
pub fn render(
    ctx: &Context,
    engine: &InterpolationEngine<'_>,
    set: FragmentSet,
    output: Option<PathBuf>,
    vars: Option<PathBuf>,
) -> Result<Rendered> {
    let destination = ManifestDestination::resolve(output, &ctx.registry)?;
    let sources = aggregate_variable_sources(&ctx.layout)?;

    let mut request = RenderRequest::new(fragment_dir(ctx, set), destination.path(), sources)
        .with_inline_vars(vars);
    if set != FragmentSet::Operations {
        request = request.optional();
    }

    let interpolator =
        ManifestInterpolator::new(engine, FileSetResolver::new(ctx.layout.fragment_filter()));
    let outcome = interpolator.render(&request)?;
    Ok(Rendered {
        outcome,
        destination,
    })
}

/// Run the interpolate command
pub fn run_interpolate(ctx: &Context, set: FragmentSet, args: &RenderArgs) -> Result<i32> {
    let engine = ctx.engine();
    let rendered = render(ctx, &engine, set, args.output.clone(), args.vars.clone())?;

    if rendered.destination.is_temporary()
        && let Some(path) = rendered.manifest_path()
    {
        let manifest = std::fs::read(path)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&manifest)?;
        stdout.flush()?;
    }
    Ok(rendered.outcome.exit_code())
}
