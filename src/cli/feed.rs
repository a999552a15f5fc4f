use crate::error::Result;
use crate::models::{FeedItem, FeedItemParams};
use crate::monzo::MonzoOperations;
use clap::{Args, Subcommand};
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum FeedCommand {
    /// Post a basic item to the account's feed
    Create(CreateFeedItemArgs),
}

#[derive(Args, Debug)]
pub struct CreateFeedItemArgs {
    #[arg(short, long)]
    pub account_id: String,

    #[arg(long)]
    pub title: String,

    /// Icon shown next to the item
    #[arg(long)]
    pub image_url: String,

    #[arg(long)]
    pub body: Option<String>,

    /// Opened when the item is tapped
    #[arg(long)]
    pub url: Option<String>,

    /// Hex colour, e.g. #FCF1EE
    #[arg(long)]
    pub background_color: Option<String>,

    #[arg(long)]
    pub title_color: Option<String>,

    #[arg(long)]
    pub body_color: Option<String>,
}

impl CreateFeedItemArgs {
    fn feed_item(&self) -> FeedItem {
        let params = FeedItemParams {
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            body: self.body.clone(),
            background_color: self.background_color.clone(),
            title_color: self.title_color.clone(),
            body_color: self.body_color.clone(),
        };

        FeedItem {
            url: self.url.clone(),
            ..FeedItem::basic(self.account_id.clone(), params)
        }
    }
}

impl FeedCommand {
    pub(super) async fn execute<C: MonzoOperations + Sync>(&self, client: &C) -> Result<()> {
        match self {
            FeedCommand::Create(args) => {
                client.create_feed_item(&args.feed_item()).await?;
                info!(account_id = %args.account_id, "Created feed item");

                Ok(())
            }
        }
    }
}
