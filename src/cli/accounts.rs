use super::{print_json, print_wrapped};
use crate::error::Result;
use crate::models::AccountType;
use crate::monzo::MonzoOperations;

pub(super) async fn whoami<C: MonzoOperations + Sync>(client: &C) -> Result<()> {
    print_json(&client.whoami().await?)
}

pub(super) async fn list_accounts<C: MonzoOperations + Sync>(
    client: &C,
    account_type: Option<AccountType>,
) -> Result<()> {
    print_wrapped("accounts", &client.list_accounts(account_type).await?)
}

pub(super) async fn balance<C: MonzoOperations + Sync>(client: &C, account_id: &str) -> Result<()> {
    print_json(&client.get_balance(account_id).await?)
}
