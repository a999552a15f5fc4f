use super::Context;
use crate::config::Config;
use crate::error::Result;
use crate::sync::TransactionCache;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration, token and cache paths
    Paths,
    /// Show how many transactions are cached per account
    Cache,
}

impl ShowResource {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(ctx),
            ShowResource::Cache => show_cache(ctx),
        }
    }
}

fn show_paths(ctx: &Context) -> Result<()> {
    let config_path = Config::config_file()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?ctx.home.path(), "Home directory");
    info!(path = ?ctx.token_store().path(), "Token path");
    info!(path = ?ctx.home.transactions_file(), "Transaction cache path");

    Ok(())
}

fn show_cache(ctx: &Context) -> Result<()> {
    let cache = TransactionCache::load_existing(ctx.home.transactions_file())?;
    info!(path = ?cache.path(), "Transaction cache");

    for (account_id, count) in cache.accounts() {
        info!(account_id, count, "Cached transactions");
    }

    Ok(())
}
