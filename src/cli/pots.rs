use super::{print_json, print_wrapped};
use crate::error::Result;
use crate::models::PotTransfer;
use crate::monzo::MonzoOperations;
use clap::{Args, Subcommand};
use tracing::info;
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub enum PotsCommand {
    /// List the pots of an account
    List {
        #[arg(short, long)]
        account_id: String,
    },
    /// Show a pot
    Get { pot_id: String },
    /// Move money from an account into a pot
    Deposit(TransferArgs),
    /// Move money from a pot into an account
    Withdraw(TransferArgs),
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Pot ID
    pub pot_id: String,

    /// Account the money comes from (deposit) or goes to (withdraw)
    #[arg(short, long)]
    pub account_id: String,

    /// Amount in minor units, e.g. pence
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub amount: i64,

    /// Idempotency key, repeat it to retry a transfer safely. Generated when omitted
    #[arg(long)]
    pub dedupe_id: Option<String>,
}

impl TransferArgs {
    fn transfer(&self) -> PotTransfer {
        PotTransfer {
            account_id: self.account_id.clone(),
            amount: self.amount,
            dedupe_id: self
                .dedupe_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

impl PotsCommand {
    pub(super) async fn execute<C: MonzoOperations + Sync>(&self, client: &C) -> Result<()> {
        match self {
            PotsCommand::List { account_id } => {
                print_wrapped("pots", &client.list_pots(account_id).await?)
            }
            PotsCommand::Get { pot_id } => print_json(&client.get_pot(pot_id).await?),
            PotsCommand::Deposit(args) => {
                let transfer = args.transfer();
                info!(dedupe_id = %transfer.dedupe_id, "Depositing into pot");
                print_json(&client.deposit_into_pot(&args.pot_id, &transfer).await?)
            }
            PotsCommand::Withdraw(args) => {
                let transfer = args.transfer();
                info!(dedupe_id = %transfer.dedupe_id, "Withdrawing from pot");
                print_json(&client.withdraw_from_pot(&args.pot_id, &transfer).await?)
            }
        }
    }
}
