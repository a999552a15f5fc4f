use super::print_wrapped;
use crate::error::Result;
use crate::monzo::MonzoOperations;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum WebhooksCommand {
    /// List the webhooks registered on an account
    List {
        #[arg(short, long)]
        account_id: String,
    },
    /// Ask Monzo to POST account events to a URL
    Register {
        #[arg(short, long)]
        account_id: String,
        url: String,
    },
    /// Stop sending events to a webhook
    Delete { webhook_id: String },
}

impl WebhooksCommand {
    pub(super) async fn execute<C: MonzoOperations + Sync>(&self, client: &C) -> Result<()> {
        match self {
            WebhooksCommand::List { account_id } => {
                print_wrapped("webhooks", &client.list_webhooks(account_id).await?)
            }
            WebhooksCommand::Register { account_id, url } => {
                print_wrapped("webhook", &client.register_webhook(account_id, url).await?)
            }
            WebhooksCommand::Delete { webhook_id } => {
                client.delete_webhook(webhook_id).await?;
                info!(webhook_id, "Deleted webhook");

                Ok(())
            }
        }
    }
}
