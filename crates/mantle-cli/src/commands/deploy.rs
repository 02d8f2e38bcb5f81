//! Deploy and destroy command implementations

use std::fs;

use colored::Colorize;
use mantle_core::DirectorAction;

use super::interpolate::render;
use crate::cli::{FragmentSet, RenderArgs};
use crate::context::Context;
use crate::error::Result;

/// Render the operations manifest and hand it to the director.
pub fn run_apply(ctx: &Context, action: DirectorAction, args: &RenderArgs) -> Result<i32> {
    let engine = ctx.engine();
    let rendered = render(
        ctx,
        &engine,
        FragmentSet::Operations,
        args.output.clone(),
        args.vars.clone(),
    )?;
    let Some(manifest) = rendered.manifest_path() else {
        return Ok(rendered.outcome.exit_code());
    };

    // create-env runs before the director exists, so no target is required
    let session = ctx.session(&engine)?;

    let state = ctx.layout.state_file();
    if let Some(parent) = state.parent() {
        fs::create_dir_all(parent)?;
    }
    ctx.director(&session)
        .apply(action, manifest, &state, &ctx.layout.vars_store())?;

    let verb = match action {
        DirectorAction::CreateOrUpdate => "Deployed",
        DirectorAction::Delete => "Destroyed",
        DirectorAction::Render => "Rendered",
    };
    println!("{} {}", verb.green().bold(), ctx.layout.root().display());
    Ok(0)
}
