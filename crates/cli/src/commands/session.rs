//! Sign in and out of the storefront.
//!
//! The session cookie is saved in storage, so later commands reuse it.

use secrecy::SecretString;
use soft_shop_storefront::error::{Result, StorefrontError};

use super::{Context, print_line, prompt, stdin_lines};

/// Sign in with `username` (or `SHOP_USERNAME`) and `SHOP_PASSWORD`, asking
/// for whatever is missing.
pub async fn login(ctx: &Context, username: Option<String>) -> Result<()> {
    let mut lines = stdin_lines();
    let configured = ctx.config.credentials.as_ref();

    let username = match username.or_else(|| configured.map(|c| c.username.clone())) {
        Some(username) => username,
        None => prompt(&mut lines, "Username:")
            .await?
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StorefrontError::BadInput("username is required".to_string()))?,
    };

    let password = match configured {
        Some(credentials) => credentials.password.clone(),
        None => prompt(&mut lines, "Password:")
            .await?
            .map(SecretString::from)
            .ok_or_else(|| StorefrontError::BadInput("password is required".to_string()))?,
    };

    ctx.client.login(&username, &password).await?;
    tracing::info!(username = %username, "Signed in");
    print_line(&format!("Signed in as {username}"));
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.client.logout().await?;
    print_line("Signed out");
    Ok(())
}
