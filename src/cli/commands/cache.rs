//! Reference cache command implementation.

use colored::Colorize;
use serde_json::{json, Value};

use super::{read_json_arg, Context};
use crate::cache::ReferenceCache;
use crate::cli::args::{CacheCommands, OutputFormat};
use crate::error::StewardError;
use crate::output::{format_items, to_json};
use crate::remote::ApiClient;
use crate::session::{Session, UserDataStore};

/// Execute cache subcommands.
pub fn cache(ctx: &Context, cmd: CacheCommands) -> Result<String, StewardError> {
    match cmd {
        CacheCommands::Set { list, items } => {
            let items = match read_json_arg(&items)? {
                Value::Array(items) => items,
                _ => {
                    return Err(StewardError::InvalidItem(
                        "expected a JSON array of items".to_string(),
                    ))
                },
            };
            let stored = ReferenceCache::new(&ctx.db, list.as_str()).replace_all(&items)?;
            replaced(ctx.format, &list, stored)
        },
        CacheCommands::Show { list } => {
            let items = ReferenceCache::new(&ctx.db, list.as_str()).get_all()?;
            format_items(&items, &list, ctx.format)
        },
        CacheCommands::Refresh => refresh_flavors(ctx),
    }
}

/// Fetch the flavor catalog, falling back to the cached copy when the API
/// is unreachable.
fn refresh_flavors(ctx: &Context) -> Result<String, StewardError> {
    let store = UserDataStore::new(&ctx.db);
    let mut session = Session::load(&store)?;
    let client = ApiClient::new(&ctx.config.remote, &session)?;
    let cache = ReferenceCache::flavors(&ctx.db);

    match client.fetch_flavors() {
        Ok(items) => {
            let stored = cache.replace_all(&items)?;
            replaced(ctx.format, cache.list(), stored)
        },
        Err(e) if e.is_unauthorized() => {
            session.logout(&store)?;
            Err(e)
        },
        Err(e) => {
            let cached = cache.get_all()?;
            if cached.is_empty() {
                return Err(e);
            }
            tracing::warn!("flavor refresh failed, using cache: {e}");
            let listing = format_items(&cached, cache.list(), ctx.format)?;
            match ctx.format {
                OutputFormat::Json => Ok(listing),
                OutputFormat::Pretty => Ok(format!(
                    "{} {e}\n{}\n\n{listing}",
                    "Refresh failed:".yellow().bold(),
                    "Showing cached catalog.".dimmed()
                )),
            }
        },
    }
}

fn replaced(format: OutputFormat, list: &str, stored: usize) -> Result<String, StewardError> {
    match format {
        OutputFormat::Json => to_json(&json!({"list": list, "stored": stored})),
        OutputFormat::Pretty => Ok(format!("Cached {stored} items in '{list}'")),
    }
}
