use super::{Context, print_json, print_wrapped};
use crate::error::{AppError, Result};
use crate::models::{Pagination, TransactionList};
use crate::monzo::{MonzoClient, MonzoOperations};
use crate::sync::{FetchOptions, TransactionEngine};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use std::collections::HashMap;

#[derive(Subcommand, Debug)]
pub enum TransactionsCommand {
    /// Get all transactions or a specific transaction by ID
    Get(GetArgs),
    /// Store key=value annotations against a transaction
    Annotate(AnnotateArgs),
}

impl TransactionsCommand {
    pub(super) async fn execute(&self, ctx: &Context, client: &MonzoClient) -> Result<()> {
        let mut engine = TransactionEngine::new(client, ctx.transaction_cache());

        match self {
            TransactionsCommand::Get(args) => args.execute(&mut engine).await,
            TransactionsCommand::Annotate(args) => args.execute(&mut engine).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Transaction ID
    pub transaction_id: Option<String>,

    /// Account ID to list transactions for
    #[arg(short, long, required_unless_present = "transaction_id")]
    pub account_id: Option<String>,

    #[command(flatten)]
    pub pagination: PaginationArgs,

    /// Bypass transactions cache and force call to API
    #[arg(long)]
    pub no_cache: bool,

    /// Fetch expanded Merchants data
    #[arg(long)]
    pub expand_merchants: bool,
}

#[derive(Args, Debug, Default)]
pub struct PaginationArgs {
    /// Return at most this many results
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Return results created after this time (RFC 3339)
    #[arg(short, long)]
    pub since: Option<DateTime<Utc>>,

    /// Return results created before this time (RFC 3339)
    #[arg(short, long)]
    pub before: Option<DateTime<Utc>>,
}

impl PaginationArgs {
    fn build(&self) -> Option<Pagination> {
        Pagination::new(self.limit, self.since, self.before)
    }
}

impl GetArgs {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            no_cache: self.no_cache,
            expand_merchants: self.expand_merchants,
        }
    }

    async fn execute<C>(&self, engine: &mut TransactionEngine<'_, C>) -> Result<()>
    where
        C: MonzoOperations + Sync,
    {
        let options = self.fetch_options();

        if let Some(transaction_id) = &self.transaction_id {
            let transaction = engine
                .get(transaction_id, self.account_id.as_deref(), options)
                .await?
                .ok_or_else(|| {
                    AppError::Cache(format!(
                        "transaction {} not found in cache, try --no-cache",
                        transaction_id
                    ))
                })?;

            return print_wrapped("transaction", &transaction);
        }

        let account_id = self.account_id.as_deref().ok_or_else(|| {
            AppError::Config("--account-id flag is required to list transactions".to_string())
        })?;
        let pagination = self.pagination.build();
        let transactions = engine.list(account_id, pagination.as_ref(), options).await?;

        print_json(&TransactionList { transactions })
    }
}

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Transaction ID
    pub transaction_id: String,

    /// Metadata to store, as key=value
    #[arg(required = true, value_parser = parse_metadata)]
    pub metadata: Vec<(String, String)>,
}

impl AnnotateArgs {
    async fn execute<C>(&self, engine: &mut TransactionEngine<'_, C>) -> Result<()>
    where
        C: MonzoOperations + Sync,
    {
        let metadata: HashMap<String, String> = self.metadata.iter().cloned().collect();
        let transaction = engine.annotate(&self.transaction_id, metadata).await?;

        print_wrapped("transaction", &transaction)
    }
}

fn parse_metadata(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid metadata {s:?}, expected key=value"))?;

    if key.trim().is_empty() {
        return Err(format!("invalid metadata {s:?}, key must not be empty"));
    }

    Ok((key.to_string(), value.to_string()))
}
