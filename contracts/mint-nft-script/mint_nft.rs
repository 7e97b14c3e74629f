// Do not link against libstd (i.e. anything defined in `std::`)
#![no_std]

use miden::*;

use crate::bindings::Account;

#[tx_script]
fn run(_arg: Word, account: &mut Account) {
    let before = account.get_token_count();
    let token_id = account.make_an_nft();
    assert_eq(token_id, before + Felt::from_u32(1));
}
