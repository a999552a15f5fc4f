use super::Context;
use crate::error::{AppError, Result};
use crate::monzo::{MonzoClient, MonzoOperations, Token};
use clap::{ArgGroup, Args};
use dialoguer::Confirm;
use tracing::{info, instrument};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("credentials").required(true).args(["token", "client_id"])))]
pub struct LoginArgs {
    /// Authenticate with static access token
    #[arg(short, long, env = "MONZO_TOKEN", conflicts_with_all = ["client_id", "client_secret"])]
    pub token: Option<String>,

    /// Authenticate with OAuth2 client ID
    #[arg(short = 'c', long, env = "MONZO_CLIENT_ID", requires = "client_secret")]
    pub client_id: Option<String>,

    /// Authenticate with OAuth2 client secret
    #[arg(short = 's', long, env = "MONZO_CLIENT_SECRET", requires = "client_id")]
    pub client_secret: Option<String>,
}

impl LoginArgs {
    #[instrument(name = "Logging in", skip_all)]
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let token = match (&self.token, &self.client_id, &self.client_secret) {
            (Some(token), None, None) => Token::from_static(token.clone()),
            (None, Some(client_id), Some(client_secret)) => {
                MonzoClient::authenticate(&ctx.config.api, client_id, client_secret).await?
            }
            _ => {
                return Err(AppError::Config(
                    "--token or --client-id and --client-secret must be supplied".to_string(),
                ));
            }
        };

        let client = MonzoClient::new(&ctx.config.api, token)?;
        let who = client.whoami().await?;

        ctx.token_store().save(&client.token().await)?;
        info!(user_id = %who.user_id, "Authenticated to Monzo");

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Also revoke the token with Monzo
    #[arg(long)]
    pub revoke: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl LogoutArgs {
    #[instrument(name = "Logging out", skip_all)]
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt("Delete the cached token and transactions?")
                .default(false)
                .interact()
                .map_err(anyhow::Error::from)?;

            if !confirmed {
                return Ok(());
            }
        }

        let store = ctx.token_store();

        if self.revoke {
            ctx.client(&store)?.logout().await?;
            info!("Revoked token");
        }

        store.clear()?;
        ctx.transaction_cache().clear()?;
        info!(path = ?ctx.home.path(), "Deleted cached data");

        Ok(())
    }
}

pub(super) async fn refresh_token(client: &MonzoClient) -> Result<()> {
    if !client.token().await.can_refresh() {
        return Err(AppError::Config(
            "cannot refresh - missing client id, client secret, or refresh token".to_string(),
        ));
    }

    client.force_refresh().await?;
    println!("{}", refreshed_message(&client.token().await));

    Ok(())
}

fn refreshed_message(token: &Token) -> String {
    match token.expiry {
        Some(expiry) => format!("Token refreshed, new expiry: {}", expiry),
        None => "Token refreshed".to_string(),
    }
}
