//! Session command implementation.

use serde_json::json;

use super::Context;
use crate::cli::args::{OutputFormat, SessionCommands};
use crate::error::StewardError;
use crate::output::{format_session_pretty, to_json};
use crate::remote::ApiClient;
use crate::session::{Session, UserDataStore};

/// Execute session subcommands.
pub fn session(ctx: &Context, cmd: SessionCommands) -> Result<String, StewardError> {
    let store = UserDataStore::new(&ctx.db);

    match cmd {
        SessionCommands::Login { username, password } => {
            let client = ApiClient::new(&ctx.config.remote, &Session::default())?;
            let session = client.login(&username, &password)?;

            store.clear()?;
            session.save(&store)?;

            match ctx.format {
                OutputFormat::Json => to_json(&json!({"user": session.user})),
                OutputFormat::Pretty => Ok(format_session_pretty(&session)),
            }
        },
        SessionCommands::Logout => {
            let mut session = Session::load(&store)?;
            if session.is_authenticated() {
                let client = ApiClient::new(&ctx.config.remote, &session)?;
                if let Err(e) = client.logout() {
                    tracing::warn!("remote logout failed: {e}");
                }
            }
            session.logout(&store)?;

            match ctx.format {
                OutputFormat::Json => to_json(&json!({"logged_out": true})),
                OutputFormat::Pretty => Ok("Logged out".to_string()),
            }
        },
        SessionCommands::Show => {
            let session = Session::load(&store)?;
            match ctx.format {
                OutputFormat::Json => to_json(&json!({
                    "authenticated": session.is_authenticated(),
                    "user": session.user,
                })),
                OutputFormat::Pretty => Ok(format_session_pretty(&session)),
            }
        },
    }
}
