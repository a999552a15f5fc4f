mod accounts;
mod auth;
mod feed;
mod pots;
mod show;
mod transactions;
mod webhooks;

use crate::config::{Config, HomeDir};
use crate::error::Result;
use crate::models::AccountType;
use crate::monzo::{MonzoClient, TokenStore};
use crate::sync::TransactionCache;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::error;

use auth::{LoginArgs, LogoutArgs};
use feed::FeedCommand;
use pots::PotsCommand;
use show::ShowResource;
use transactions::TransactionsCommand;
use webhooks::WebhooksCommand;

#[derive(Parser, Debug)]
#[command(name = "monzo")]
#[command(about = "CLI for interacting with Monzo APIs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory holding the token and transaction cache
    #[arg(long, global = true, env = "MONZO_HOME_DIR")]
    pub home_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let ctx = Context::new(self.home_dir.clone())?;

        match &self.command {
            Commands::Login(args) => args.execute(&ctx).await,
            Commands::Logout(args) => args.execute(&ctx).await,
            Commands::Show { resource } => resource.execute(&ctx),
            Commands::Api(command) => ctx.with_client(command).await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate to the Monzo API
    Login(LoginArgs),
    /// Delete all cached data
    Logout(LogoutArgs),
    /// Show configuration and cache details
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
    #[command(flatten)]
    Api(ApiCommand),
}

/// Commands that call the API with the saved token
#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// Force refresh of token if using OAuth2
    RefreshToken,
    /// Check auth status
    Whoami,
    /// List accounts
    Accounts {
        /// Only list accounts of this type (uk_retail, uk_retail_joint)
        account_type: Option<AccountType>,
    },
    /// Show balance
    Balance {
        #[arg(short, long)]
        account_id: String,
    },
    /// Get and annotate transactions
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommand,
    },
    /// List pots and move money in and out of them
    Pots {
        #[command(subcommand)]
        command: PotsCommand,
    },
    /// Post items to an account's feed
    Feed {
        #[command(subcommand)]
        command: FeedCommand,
    },
    /// Manage webhooks
    Webhooks {
        #[command(subcommand)]
        command: WebhooksCommand,
    },
}

impl ApiCommand {
    async fn execute(&self, ctx: &Context, client: &MonzoClient) -> Result<()> {
        match self {
            ApiCommand::RefreshToken => auth::refresh_token(client).await,
            ApiCommand::Whoami => accounts::whoami(client).await,
            ApiCommand::Accounts { account_type } => {
                accounts::list_accounts(client, *account_type).await
            }
            ApiCommand::Balance { account_id } => accounts::balance(client, account_id).await,
            ApiCommand::Transactions { command } => command.execute(ctx, client).await,
            ApiCommand::Pots { command } => command.execute(client).await,
            ApiCommand::Feed { command } => command.execute(client).await,
            ApiCommand::Webhooks { command } => command.execute(client).await,
        }
    }
}

/// Locations and settings shared by every command
pub struct Context {
    pub config: Config,
    pub home: HomeDir,
}

impl Context {
    fn new(home_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            home: HomeDir::resolve(home_dir)?,
        })
    }

    fn token_store(&self) -> TokenStore {
        TokenStore::new(self.home.token_file())
    }

    fn transaction_cache(&self) -> TransactionCache {
        TransactionCache::load(self.home.transactions_file())
    }

    fn client(&self, store: &TokenStore) -> Result<MonzoClient> {
        MonzoClient::new(&self.config.api, store.load_required()?)
    }

    /// Run `command` with an authenticated client, then save the (possibly refreshed) token.
    async fn with_client(&self, command: &ApiCommand) -> Result<()> {
        let store = self.token_store();
        let client = self.client(&store)?;

        let result = command.execute(self, &client).await;
        let saved = store.save(&client.token().await);

        settle(result, saved)
    }
}

/// Combine a command's result with saving its token afterwards.
///
/// A failed save fails an otherwise successful command. When both fail the
/// command error is returned and the save error is logged.
fn settle(result: Result<()>, saved: Result<()>) -> Result<()> {
    if let (Err(_), Err(e)) = (&result, &saved) {
        error!("Failed to save token: {}", e);
    }

    result.and(saved)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` inside a single-key object, the way the API returns it
pub(crate) fn print_wrapped<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<()> {
    print_json(&wrap(key, value))
}

fn wrap<'a, T: ?Sized>(key: &'a str, value: &'a T) -> BTreeMap<&'a str, &'a T> {
    BTreeMap::from([(key, value)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::monzo::Token;
    use crate::monzo::fake::{FakeMonzo, TOKEN_RESPONSE};
    use chrono::{TimeDelta, Utc};

    fn context(server: &FakeMonzo, dir: &tempfile::TempDir) -> Context {
        Context {
            config: Config {
                api: server.api_config(),
            },
            home: HomeDir::resolve(Some(dir.path().to_path_buf())).unwrap(),
        }
    }

    fn expired_token() -> Token {
        Token {
            access_token: "old_access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expiry: Some(Utc::now() - TimeDelta::hours(1)),
            client_id: Some("oauth2client_123".to_string()),
            client_secret: Some("secret".to_string()),
        }
    }

    fn command_error() -> AppError {
        AppError::Config("command failed".to_string())
    }

    #[tokio::test]
    async fn test_refreshed_token_saved_after_failed_command() {
        let server = FakeMonzo::start(vec![
            ("POST", "/oauth2/token", 200, TOKEN_RESPONSE.to_string()),
            (
                "GET",
                "/balance",
                500,
                r#"{"code":"internal_service","message":"boom"}"#.to_string(),
            ),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server, &dir);
        ctx.token_store().save(&expired_token()).unwrap();

        let result = ctx
            .with_client(&ApiCommand::Balance {
                account_id: "acc_123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Api(ref e)) if e.status == 500));
        let saved = ctx.token_store().load_required().unwrap();
        assert_eq!(saved.access_token, "new_access");
        assert_eq!(saved.refresh_token.as_deref(), Some("refresh_2"));
    }

    #[tokio::test]
    async fn test_with_client_requires_login() {
        let server = FakeMonzo::start(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&server, &dir);

        let result = ctx.with_client(&ApiCommand::Whoami).await;

        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_settle_save_error_fails_successful_command() {
        let result = settle(Ok(()), Err(AppError::Auth("write failed".to_string())));

        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_settle_command_error_takes_precedence() {
        let result = settle(Err(command_error()), Err(AppError::Auth("write failed".to_string())));

        assert!(matches!(result, Err(AppError::Config(_))));
        assert!(settle(Err(command_error()), Ok(())).is_err());
        assert!(settle(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn test_wrap() {
        let value = serde_json::to_value(wrap("pots", &vec!["pot_1"])).unwrap();

        assert_eq!(value, serde_json::json!({"pots": ["pot_1"]}));
    }

    #[test]
    fn test_cli_parses_pot_deposit() {
        let cli = Cli::try_parse_from([
            "monzo", "pots", "deposit", "pot_123", "-a", "acc_123", "--amount", "500",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Api(ApiCommand::Pots {
                command: PotsCommand::Deposit(_)
            })
        ));
        assert!(
            Cli::try_parse_from([
                "monzo", "pots", "deposit", "pot_123", "-a", "acc_123", "--amount", "0",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_cli_transactions_list_requires_account() {
        assert!(Cli::try_parse_from(["monzo", "transactions", "get"]).is_err());
        assert!(Cli::try_parse_from(["monzo", "transactions", "get", "tx_123"]).is_ok());
        assert!(Cli::try_parse_from(["monzo", "transactions", "get", "-a", "acc_123"]).is_ok());
    }
}
