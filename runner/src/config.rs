use std::{collections::BTreeMap, ffi::OsString, path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    error::DeployError,
    workflow::{CONTRACT_NAME, MINT_FUNCTION},
};

/// Settings for the deployment script. Every field has an environment
/// variable and a default, so the script runs without arguments.
#[derive(Clone, Debug, Parser)]
#[command(name = "deploy_nft")]
#[command(about = "Deploy the MyNFT contract and mint two tokens")]
pub struct DeployConfig {
    /// `testnet`, `devnet`, `localhost` or a full RPC URL
    #[arg(long, env = "MIDEN_RPC_ENDPOINT", default_value = "testnet")]
    pub rpc_endpoint: String,

    #[arg(long, env = "MIDEN_RPC_TIMEOUT_MS", default_value_t = 10_000)]
    pub rpc_timeout_ms: u64,

    #[arg(long, env = "MIDEN_STORE_PATH", default_value = "./store.sqlite3")]
    pub store_path: PathBuf,

    #[arg(long, env = "MIDEN_KEYSTORE_PATH", default_value = "./keystore")]
    pub keystore_path: PathBuf,

    /// Directory holding the contract projects
    #[arg(long, env = "NFT_CONTRACTS_DIR", default_value = "../contracts")]
    pub contracts_dir: PathBuf,

    #[arg(long, env = "NFT_RELEASE_BUILD", default_value_t = true, action = clap::ArgAction::Set)]
    pub release: bool,

    /// How many times to poll for a transaction before giving up
    #[arg(long, env = "NFT_CONFIRMATION_ATTEMPTS", default_value_t = 30)]
    pub confirmation_attempts: u32,

    #[arg(long, env = "NFT_POLL_INTERVAL_MS", default_value_t = 2_000)]
    pub poll_interval_ms: u64,

    #[arg(long, env = "NFT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "MIDEN_DEBUG_MODE", default_value_t = true, action = clap::ArgAction::Set)]
    pub debug_mode: bool,
}

impl DeployConfig {
    /// Reads the process arguments and environment.
    pub fn load() -> Result<Self, DeployError> {
        Self::load_from(std::env::args_os())
    }

    /// Parses `args` plus the environment. A malformed value becomes
    /// [`DeployError::Config`]; `--help` and `--version` print and exit.
    pub fn load_from<I, T>(args: I) -> Result<Self, DeployError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|err| {
            if !err.use_stderr() {
                err.exit();
            }
            let rendered = err.to_string();
            let message = rendered.lines().next().unwrap_or_default();
            DeployError::Config(message.trim_start_matches("error: ").to_string())
        })
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.rpc_endpoint.trim().is_empty() {
            return Err(DeployError::Config("rpc endpoint must not be empty".to_string()));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(DeployError::Config("rpc timeout must be greater than zero".to_string()));
        }
        if self.confirmation_attempts == 0 {
            return Err(DeployError::Config(
                "confirmation attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn registry(&self) -> ContractRegistry {
        ContractRegistry::default_registry(&self.contracts_dir)
    }
}

/// Project locations for one deployable contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSource {
    /// Account component project
    pub project_dir: PathBuf,
    /// Transaction script executed as the deployment transaction
    pub deploy_script_dir: PathBuf,
    /// Transaction script per callable function
    pub functions: BTreeMap<String, PathBuf>,
}

/// Known contracts, by name.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, ContractSource>,
}

impl ContractRegistry {
    pub fn default_registry(contracts_dir: &std::path::Path) -> Self {
        let mut registry = Self::default();
        registry.register(
            CONTRACT_NAME,
            ContractSource {
                project_dir: contracts_dir.join("my-nft-account"),
                deploy_script_dir: contracts_dir.join("deploy-nft-script"),
                functions: BTreeMap::from([(
                    MINT_FUNCTION.to_string(),
                    contracts_dir.join("mint-nft-script"),
                )]),
            },
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, source: ContractSource) {
        self.contracts.insert(name.into(), source);
    }

    pub fn get(&self, name: &str) -> Result<&ContractSource, DeployError> {
        self.contracts
            .get(name)
            .ok_or_else(|| DeployError::Toolchain(format!("unknown contract `{name}`")))
    }
}
