//! Status command implementation

use colored::Colorize;
use serde_json::json;

use crate::context::Context;
use crate::error::Result;

/// Run the status command
pub fn run_status(ctx: &Context, json: bool) -> Result<i32> {
    let engine = ctx.engine();
    let session = ctx.targeted_session(&engine)?;
    let info = ctx.director(&session).environment()?;
    let target = session.target_address().unwrap_or_default();

    if json {
        let report = json!({
            "target": target,
            "name": info.name,
            "uuid": info.uuid,
            "cpi": info.cpi,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    let show = |value: &Option<String>| match value {
        Some(value) => value.cyan(),
        None => "unknown".dimmed(),
    };

    println!("{}", "Director Status".bold());
    println!();
    println!("{}: {}", "Target".dimmed(), target.cyan());
    println!("{}:   {}", "Name".dimmed(), show(&info.name));
    println!("{}:   {}", "UUID".dimmed(), show(&info.uuid));
    println!("{}:    {}", "CPI".dimmed(), show(&info.cpi));
    Ok(0)
}
