// Do not link against libstd (i.e. anything defined in `std::`)
#![no_std]

use miden::{component, felt, Felt, StorageMap, StorageMapAccess, Word};

/// NFT collection account. Slot 0 keeps the minted token count and the
/// initialized flag.
#[component]
struct MyNft {
    #[storage(slot(0), description = "token counter and initialized flag")]
    token_map: StorageMap,
}

fn token_count_key() -> Word {
    Word::from([felt!(0), felt!(0), felt!(0), felt!(1)])
}

fn initialized_key() -> Word {
    Word::from([felt!(0), felt!(0), felt!(0), felt!(2)])
}

#[component]
impl MyNft {
    /// Marks the collection as deployed. Runs as the deployment transaction.
    pub fn initialize(&self) {
        self.token_map.set(initialized_key(), felt!(1));
    }

    /// Mints the next token and returns its id, starting at 1.
    pub fn make_an_nft(&self) -> Felt {
        let initialized: Felt = self.token_map.get(&initialized_key());
        assert_eq(initialized, felt!(1));

        let current: Felt = self.token_map.get(&token_count_key());
        let token_id = current + felt!(1);
        self.token_map.set(token_count_key(), token_id);
        token_id
    }

    pub fn get_token_count(&self) -> Felt {
        self.token_map.get(&token_count_key())
    }
}
