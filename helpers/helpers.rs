//! Miden client helpers for the NFT deployment script and its tests

use std::{collections::BTreeSet, path::Path, sync::Arc};

use cargo_miden::{run, OutputType};
use miden_client::{
    account::{
        component::NoAuth, Account, AccountStorageMode, AccountType, StorageMap, StorageSlot,
    },
    builder::ClientBuilder,
    keystore::FilesystemKeyStore,
    rpc::{Endpoint, TonicRpcClient},
    transaction::TransactionScript,
    utils::Deserializable,
    Client,
};
use miden_core::{Felt, Word};
use miden_mast_package::Package;
use miden_objects::account::{
    AccountBuilder, AccountComponent, AccountComponentMetadata, AccountComponentTemplate,
};
use nft_runner::{DeployConfig, DeployError};
use rand::{rngs::StdRng, RngCore};
use tracing::{debug, info};

mod toolchain;

pub use toolchain::{MidenContract, MidenToolchain, NftFactory, PendingCall, PendingDeployment};

pub type MidenClient = Client<FilesystemKeyStore<StdRng>>;

/// Storage map key holding the number of minted tokens
pub const TOKEN_COUNT_KEY: [u64; 4] = [0, 0, 0, 1];
/// Storage map key holding the initialized flag
pub const INITIALIZED_KEY: [u64; 4] = [0, 0, 0, 2];

pub fn storage_key(key: [u64; 4]) -> Word {
    Word::from(key.map(Felt::new))
}

/// Resolves the configured endpoint name or URL
pub fn endpoint_from(config: &DeployConfig) -> Result<Endpoint, DeployError> {
    match config.rpc_endpoint.as_str() {
        "testnet" => Ok(Endpoint::testnet()),
        "devnet" => Ok(Endpoint::devnet()),
        "localhost" => Ok(Endpoint::localhost()),
        url => Endpoint::try_from(url)
            .map_err(|e| DeployError::Config(format!("invalid rpc endpoint `{url}`: {e:?}"))),
    }
}

/// Initialize the client with its RPC connection, sqlite store and keystore
pub async fn setup_client(config: &DeployConfig) -> Result<MidenClient, DeployError> {
    let endpoint = endpoint_from(config)?;
    info!(endpoint = %config.rpc_endpoint, "connecting to miden node");
    let rpc_api = Arc::new(TonicRpcClient::new(&endpoint, config.rpc_timeout_ms));

    let keystore = Arc::new(
        FilesystemKeyStore::<StdRng>::new(config.keystore_path.clone())
            .map_err(|e| DeployError::Config(format!("failed to open keystore: {e}")))?,
    );

    let store_path = config.store_path.to_str().ok_or_else(|| {
        DeployError::Config(format!("store path {} is not valid UTF-8", config.store_path.display()))
    })?;
    let client = ClientBuilder::new()
        .rpc(rpc_api)
        .sqlite_store(store_path)
        .authenticator(keystore)
        .in_debug_mode(config.debug_mode.into())
        .build()
        .await
        .map_err(DeployError::network)?;

    Ok(client)
}

/// Compile a contract project with `cargo miden build` and load the package
pub fn build_project_in_dir(dir: &Path, release: bool) -> Result<Package, DeployError> {
    let profile: &str = if release { "--release" } else { "--debug" };
    let manifest_path = dir.join("Cargo.toml");
    if !manifest_path.exists() {
        return Err(DeployError::Toolchain(format!(
            "no contract project at {}",
            manifest_path.display()
        )));
    }

    let args = vec![
        "cargo".to_string(),
        "miden".to_string(),
        "build".to_string(),
        profile.to_string(),
        "--manifest-path".to_string(),
        manifest_path.to_string_lossy().to_string(),
    ];
    debug!(project = %dir.display(), profile, "building contract project");

    let output = run(args.into_iter(), OutputType::Masm)
        .map_err(|e| DeployError::Toolchain(format!("failed to build {}: {e}", dir.display())))?
        .ok_or_else(|| DeployError::toolchain("`cargo miden build` produced no output"))?;
    let masm_path = match output {
        cargo_miden::CommandOutput::BuildCommandOutput { output } => match output {
            cargo_miden::BuildOutput::Masm { artifact_path } => artifact_path,
            other => {
                return Err(DeployError::Toolchain(format!("expected masm output, got {other:?}")))
            }
        },
        other => {
            return Err(DeployError::Toolchain(format!("expected build output, got {other:?}")))
        }
    };

    let package_bytes = std::fs::read(&masm_path).map_err(|e| {
        DeployError::Toolchain(format!("failed to read {}: {e}", masm_path.display()))
    })?;
    Package::read_from_bytes(&package_bytes).map_err(DeployError::toolchain)
}

/// Configuration for creating an account with a custom component
#[derive(Clone)]
pub struct AccountCreationConfig {
    pub account_type: AccountType,
    pub storage_mode: AccountStorageMode,
    pub storage_slots: Vec<StorageSlot>,
}

impl Default for AccountCreationConfig {
    fn default() -> Self {
        Self {
            account_type: AccountType::RegularAccountImmutableCode,
            storage_mode: AccountStorageMode::Public,
            storage_slots: vec![],
        }
    }
}

/// Initial storage of the NFT contract: no tokens, not yet initialized
pub fn nft_storage_slots() -> Result<Vec<StorageSlot>, DeployError> {
    let zero = Word::from([Felt::new(0); 4]);
    let map = StorageMap::with_entries([
        (storage_key(TOKEN_COUNT_KEY), zero),
        (storage_key(INITIALIZED_KEY), zero),
    ])
    .map_err(DeployError::toolchain)?;
    Ok(vec![StorageSlot::Map(map)])
}

pub fn account_component_from_package(
    package: &Package,
    config: &AccountCreationConfig,
) -> Result<AccountComponent, DeployError> {
    let bytes = package
        .account_component_metadata_bytes
        .as_deref()
        .ok_or_else(|| DeployError::toolchain("no account component metadata present"))?;
    if !package.is_library() {
        return Err(DeployError::toolchain("account component package is not a library"));
    }

    let metadata = AccountComponentMetadata::read_from_bytes(bytes).map_err(DeployError::toolchain)?;
    let template =
        AccountComponentTemplate::new(metadata, package.unwrap_library().as_ref().clone());
    let component = AccountComponent::new(template.library().clone(), config.storage_slots.clone())
        .map_err(DeployError::toolchain)?;

    let supported_types = BTreeSet::from_iter([config.account_type]);
    Ok(component.with_supported_types(supported_types))
}

/// Build a fresh account from a component package and register it with the client.
///
/// The account only exists locally until its first transaction is committed.
pub async fn create_account_from_package(
    client: &mut MidenClient,
    package: &Package,
    config: AccountCreationConfig,
) -> Result<Account, DeployError> {
    let account_component = account_component_from_package(package, &config)?;

    let mut init_seed = [0_u8; 32];
    client.rng().fill_bytes(&mut init_seed);

    // latest block info is needed to anchor the new account
    client.sync_state().await.map_err(DeployError::network)?;

    let (account, seed) = AccountBuilder::new(init_seed)
        .account_type(config.account_type)
        .storage_mode(config.storage_mode)
        .with_component(account_component)
        .with_auth_component(NoAuth)
        .build()
        .map_err(DeployError::toolchain)?;
    debug!(account_id = %account.id().to_hex(), "built account");

    client
        .add_account(&account, Some(seed), false)
        .await
        .map_err(DeployError::network)?;

    Ok(account)
}

/// Helper to turn a compiled transaction script package into a script
pub fn transaction_script_from_package(package: &Package) -> Result<TransactionScript, DeployError> {
    if !package.is_program() {
        return Err(DeployError::toolchain("transaction script package is not a program"));
    }
    let program = package.unwrap_program();
    Ok(TransactionScript::from_parts(program.mast_forest().clone(), program.entrypoint()))
}
