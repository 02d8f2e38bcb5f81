//! Login command implementation

use colored::Colorize;
use mantle_core::{CredentialStoreBootstrapper, TrustChainKeys, credhub_url};

use crate::context::Context;
use crate::error::{CliError, Result};

/// Log in to the credential store on the session target
pub fn run_login(ctx: &Context) -> Result<i32> {
    let engine = ctx.engine();
    let session = ctx.targeted_session(&engine)?;
    let target = session
        .target_address()
        .ok_or_else(|| CliError::user("No director target resolved"))?;

    let store = &ctx.settings.credential_store;
    let url = credhub_url(target, store.port);
    let keys = TrustChainKeys {
        uaa_ca: store.uaa_ca_key.clone(),
        tls_ca: store.tls_ca_key.clone(),
    };

    CredentialStoreBootstrapper::new(&engine, &ctx.runner, &ctx.registry, &ctx.layout, keys)
        .with_program(&ctx.settings.tools.credential_store)
        .with_timeout(ctx.settings.tools.timeout())
        .login(&url, &store.username, &store.secret_key)?;

    println!("{} {} as {}", "Logged in to".green().bold(), url, store.username.cyan());
    Ok(0)
}
