//! Session command implementation

use crate::context::Context;
use crate::error::Result;

/// Print the resolved session as `export` lines.
///
/// A missing target is reported but still exits 0 so the output can be
/// sourced for partial sessions.
pub fn run_session(ctx: &Context, reveal: bool) -> Result<i32> {
    let engine = ctx.engine();
    let session = ctx.session(&engine)?;
    print!("{}", session.describe(reveal));
    Ok(0)
}
