//! Handlers for the `auth` subcommands.

use std::io::Write;
use std::sync::Arc;

use crate::auth::{guard, AuthProvider, AuthUser, GoTrueAuthProvider, Route};
use crate::config::ChatConfig;
use crate::storage::FileKeyValueStore;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

fn provider(config: &ChatConfig) -> Result<GoTrueAuthProvider, Box<dyn std::error::Error>> {
    let storage = Arc::new(FileKeyValueStore::new(config.data_dir.clone()));
    Ok(GoTrueAuthProvider::from_config(config, storage)?)
}

/// Password from `CHATDECK_PASSWORD`, else one line of stdin.
fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    if let Ok(password) = std::env::var("CHATDECK_PASSWORD") {
        return Ok(password);
    }
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("No password provided".into());
    }
    Ok(password)
}

/// Returns `true` when a signed-in user asked for an auth view and was
/// redirected to the chat instead.
async fn already_signed_in(auth: &GoTrueAuthProvider, requested: Route) -> Result<bool, Box<dyn std::error::Error>> {
    let user = auth.current_user().await?;
    if guard(requested, &user) == Route::Chat {
        if let Some(name) = user.greeting_name() {
            println!("Already signed in as {name}. Run `chatdeck auth logout` to switch accounts.");
        }
        return Ok(true);
    }
    Ok(false)
}

/// Handle `chatdeck auth signup <email> --name <display>`.
pub async fn handle_signup(config: &ChatConfig, email: &str, display_name: &str) -> HandlerResult {
    let auth = provider(config)?;
    if already_signed_in(&auth, Route::Signup).await? {
        return Ok(());
    }
    let password = read_password()?;
    let profile = auth.sign_up(email, &password, display_name).await?;
    if auth.get_session().await?.is_some() {
        println!("Account created. Signed in as {}.", profile.email);
    } else {
        println!(
            "Account created for {}. Confirm your email, then run `chatdeck auth login {}`.",
            profile.email, profile.email
        );
    }
    Ok(())
}

/// Handle `chatdeck auth login <email>`.
pub async fn handle_login(config: &ChatConfig, email: &str) -> HandlerResult {
    let auth = provider(config)?;
    if already_signed_in(&auth, Route::Login).await? {
        return Ok(());
    }
    let password = read_password()?;
    let session = auth.sign_in_with_password(email, &password).await?;
    let name = session.user().greeting_name().unwrap_or(email).to_string();
    println!("Signed in as {name}.");
    Ok(())
}

/// Handle `chatdeck auth status`.
pub async fn handle_status(config: &ChatConfig) -> HandlerResult {
    let auth = provider(config)?;
    match auth.get_session().await? {
        Some(session) => {
            let expiry = session
                .expires_at
                .map(|at| format!(" (session expires {})", at.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            match session.user() {
                AuthUser::Authenticated { email, display_name } => {
                    let name = display_name.map(|n| format!("{n} <{email}>")).unwrap_or(email);
                    println!("Signed in as {name}{expiry}");
                }
                AuthUser::Unauthenticated => println!("Not signed in"),
            }
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Handle `chatdeck auth logout`.
pub async fn handle_logout(config: &ChatConfig) -> HandlerResult {
    let auth = provider(config)?;
    auth.sign_out().await?;
    println!("Signed out.");
    Ok(())
}
