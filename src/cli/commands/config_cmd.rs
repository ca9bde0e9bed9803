//! config command - Get, set, or list configuration values

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::ui::output;

/// Print the effective value of a key.
pub fn get(_ctx: &Context, key: &str) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let value = config.get(key)?;
    if !value.is_empty() {
        println!("{}", value);
    }
    Ok(())
}

/// Set a key and write the config file.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load().context("Failed to load config")?;
    config.set(key, value)?;
    let path = config.write().context("Failed to write config")?;
    tracing::debug!(path = %path.display(), key, "config written");
    output::success(format!("Set {} = {}", key, value), ctx.verbosity());
    Ok(())
}

/// Print every key with its effective value.
pub fn list(_ctx: &Context) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    for key in Config::KEYS {
        println!("{} = {}", key, config.get(key)?);
    }
    Ok(())
}
