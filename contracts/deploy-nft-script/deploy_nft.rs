// Do not link against libstd (i.e. anything defined in `std::`)
#![no_std]

use miden::*;

use crate::bindings::Account;

/// Deployment transaction for the NFT collection account.
///
/// Executed once against a freshly built account; once it is committed the
/// account is visible on chain and accepts mints.
#[tx_script]
fn run(_arg: Word, account: &mut Account) {
    account.initialize();
}
