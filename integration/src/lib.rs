//! Shared setup for end-to-end runs against a Miden node

use clap::Parser;
use helpers::{storage_key, MidenClient, TOKEN_COUNT_KEY};
use miden_client::account::AccountId;
use miden_core::{Felt, Word};
use nft_runner::DeployConfig;

/// Default settings, still overridable through the usual environment variables
pub fn test_config() -> DeployConfig {
    DeployConfig::parse_from(["deploy_nft", "--contracts-dir", "../contracts"])
}

/// Storage value of the token counter after `count` mints
pub fn token_count_word(count: u64) -> Word {
    Word::from([Felt::new(0), Felt::new(0), Felt::new(0), Felt::new(count)])
}

/// Reads the minted token counter from the contract's storage map
pub async fn read_token_count(client: &mut MidenClient, account_id: AccountId) -> anyhow::Result<Word> {
    client.sync_state().await?;

    let record = client
        .get_account(account_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("NFT account not found after deployment"))?;

    Ok(record.account().storage().get_map_item(0, storage_key(TOKEN_COUNT_KEY))?)
}
