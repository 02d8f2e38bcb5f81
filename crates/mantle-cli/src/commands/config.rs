//! Cloud-config and runtime-config command implementations

use std::path::PathBuf;

use colored::Colorize;

use super::interpolate::render;
use crate::cli::FragmentSet;
use crate::context::Context;
use crate::error::Result;

/// Render the cloud-config fragments and upload them
pub fn run_cloud_config(ctx: &Context, vars: Option<PathBuf>) -> Result<i32> {
    let engine = ctx.engine();
    let rendered = render(ctx, &engine, FragmentSet::CloudConfig, None, vars)?;
    let Some(manifest) = rendered.manifest_path() else {
        return Ok(rendered.outcome.exit_code());
    };

    let session = ctx.targeted_session(&engine)?;
    ctx.director(&session).update_cloud_config(manifest)?;
    println!("{} cloud config", "Updated".green().bold());
    Ok(0)
}

/// Render the runtime-config fragments and upload them
pub fn run_runtime_config(ctx: &Context, name: Option<&str>, vars: Option<PathBuf>) -> Result<i32> {
    let engine = ctx.engine();
    let rendered = render(ctx, &engine, FragmentSet::RuntimeConfig, None, vars)?;
    let Some(manifest) = rendered.manifest_path() else {
        return Ok(rendered.outcome.exit_code());
    };

    let session = ctx.targeted_session(&engine)?;
    ctx.director(&session).update_runtime_config(name, manifest)?;
    println!(
        "{} runtime config {}",
        "Updated".green().bold(),
        name.unwrap_or("default").cyan()
    );
    Ok(0)
}
