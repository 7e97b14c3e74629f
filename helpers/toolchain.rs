use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use miden_client::{
    account::{Account, AccountId},
    store::TransactionFilter,
    transaction::{
        TransactionId, TransactionRequestBuilder, TransactionScript, TransactionStatus,
    },
};
use miden_mast_package::Package;
use nft_runner::{
    Confirmation, ContractRegistry, ContractToolchain, DeployConfig, DeployError,
    DeployedContract,
};
use tracing::{debug, info, warn};

use crate::{
    build_project_in_dir, create_account_from_package, nft_storage_slots, setup_client,
    transaction_script_from_package, AccountCreationConfig, MidenClient,
};

/// Compiled contract ready to be deployed.
pub struct NftFactory {
    name: String,
    package: Package,
    deploy_script: TransactionScript,
    functions: Arc<BTreeMap<String, TransactionScript>>,
}

pub struct PendingDeployment {
    account: Account,
    tx_id: TransactionId,
    functions: Arc<BTreeMap<String, TransactionScript>>,
}

/// Deployed contract account and the scripts that call into it.
pub struct MidenContract {
    account_id: AccountId,
    functions: Arc<BTreeMap<String, TransactionScript>>,
}

impl DeployedContract for MidenContract {
    fn address(&self) -> String {
        self.account_id.to_hex()
    }
}

pub struct PendingCall {
    tx_id: TransactionId,
}

/// What one poll learned about a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CommitState {
    Committed,
    Discarded,
    Pending,
    Untracked,
}

impl From<Option<&TransactionStatus>> for CommitState {
    fn from(status: Option<&TransactionStatus>) -> Self {
        match status {
            Some(TransactionStatus::Committed { .. }) => Self::Committed,
            Some(TransactionStatus::Discarded { .. }) => Self::Discarded,
            Some(_) => Self::Pending,
            None => Self::Untracked,
        }
    }
}

/// `None` while the transaction is still in flight.
fn commit_outcome(tx_hex: &str, state: CommitState) -> Option<Result<(), DeployError>> {
    match state {
        CommitState::Committed => Some(Ok(())),
        CommitState::Discarded => {
            Some(Err(DeployError::Confirmation(format!("transaction {tx_hex} was discarded"))))
        }
        CommitState::Pending | CommitState::Untracked => None,
    }
}

fn not_committed(tx_hex: &str, attempts: u32) -> DeployError {
    DeployError::Confirmation(format!("transaction {tx_hex} not committed after {attempts} attempts"))
}

/// A deployment the node never accepted is reported as a network failure,
/// whether the account build, the script execution or the submission failed.
fn deployment_error(err: DeployError) -> DeployError {
    match err {
        DeployError::Call(msg) | DeployError::Toolchain(msg) => {
            DeployError::Network(format!("deployment rejected: {msg}"))
        }
        other => other,
    }
}

/// [`ContractToolchain`] backed by a Miden node.
///
/// Contracts are account components built with `cargo miden`. Deploying one
/// creates a fresh account and submits its deployment script; calling a
/// function executes that function's transaction script against the account.
pub struct MidenToolchain {
    client: MidenClient,
    registry: ContractRegistry,
    release: bool,
    confirmation_attempts: u32,
    poll_interval: Duration,
}

impl MidenToolchain {
    pub fn new(client: MidenClient, config: &DeployConfig) -> Self {
        Self {
            client,
            registry: config.registry(),
            release: config.release,
            confirmation_attempts: config.confirmation_attempts,
            poll_interval: config.poll_interval(),
        }
    }

    pub async fn connect(config: &DeployConfig) -> Result<Self, DeployError> {
        let client = setup_client(config).await?;
        Ok(Self::new(client, config))
    }

    pub fn client_mut(&mut self) -> &mut MidenClient {
        &mut self.client
    }

    fn build_script(&self, dir: &std::path::Path) -> Result<TransactionScript, DeployError> {
        let package = build_project_in_dir(dir, self.release)?;
        transaction_script_from_package(&package)
    }

    /// Executes `script` against `account_id` and submits the proven
    /// transaction. Execution failures surface as [`DeployError::Call`].
    async fn submit_script(
        &mut self,
        account_id: AccountId,
        script: TransactionScript,
    ) -> Result<TransactionId, DeployError> {
        let request = TransactionRequestBuilder::new()
            .custom_script(script)
            .build()
            .map_err(DeployError::toolchain)?;

        let tx_result = self
            .client
            .new_transaction(account_id, request)
            .await
            .map_err(DeployError::call)?;
        let tx_id = tx_result.executed_transaction().id();

        self.client.submit_transaction(tx_result).await.map_err(DeployError::network)?;
        debug!(tx_id = %tx_id.to_hex(), "transaction submitted");
        Ok(tx_id)
    }

    /// Polls the node until the transaction is committed.
    async fn await_commit(&mut self, tx_id: TransactionId) -> Result<(), DeployError> {
        let tx_hex = tx_id.to_hex();
        for attempt in 1..=self.confirmation_attempts {
            self.client.sync_state().await.map_err(DeployError::network)?;

            let records = self
                .client
                .get_transactions(TransactionFilter::Ids(vec![tx_id]))
                .await
                .map_err(DeployError::network)?;

            let state = CommitState::from(records.first().map(|record| &record.status));
            match state {
                CommitState::Committed => {
                    debug!(tx_id = %tx_hex, attempt, "transaction committed")
                }
                CommitState::Pending => debug!(tx_id = %tx_hex, attempt, "transaction pending"),
                CommitState::Untracked => {
                    warn!(tx_id = %tx_hex, attempt, "transaction not tracked yet")
                }
                CommitState::Discarded => {}
            }
            if let Some(outcome) = commit_outcome(&tx_hex, state) {
                return outcome;
            }
            if attempt < self.confirmation_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(not_committed(&tx_hex, self.confirmation_attempts))
    }
}

#[async_trait(?Send)]
impl ContractToolchain for MidenToolchain {
    type Factory = NftFactory;
    type Deployment = PendingDeployment;
    type Contract = MidenContract;
    type Transaction = PendingCall;

    async fn get_factory(&mut self, contract_name: &str) -> Result<NftFactory, DeployError> {
        let source = self.registry.get(contract_name)?.clone();

        let package = build_project_in_dir(&source.project_dir, self.release)?;
        let deploy_script = self.build_script(&source.deploy_script_dir)?;
        let mut functions = BTreeMap::new();
        for (function, dir) in &source.functions {
            functions.insert(function.clone(), self.build_script(dir)?);
        }
        info!(contract = contract_name, functions = functions.len(), "contract compiled");

        Ok(NftFactory {
            name: contract_name.to_string(),
            package,
            deploy_script,
            functions: Arc::new(functions),
        })
    }

    async fn deploy(&mut self, factory: &NftFactory) -> Result<PendingDeployment, DeployError> {
        let config = AccountCreationConfig {
            storage_slots: nft_storage_slots().map_err(deployment_error)?,
            ..Default::default()
        };
        let account = create_account_from_package(&mut self.client, &factory.package, config)
            .await
            .map_err(deployment_error)?;
        info!(contract = %factory.name, account_id = %account.id().to_hex(), "contract account created");

        let tx_id = self
            .submit_script(account.id(), factory.deploy_script.clone())
            .await
            .map_err(deployment_error)?;

        Ok(PendingDeployment { account, tx_id, functions: factory.functions.clone() })
    }

    async fn wait_for_deployment(
        &mut self,
        deployment: PendingDeployment,
    ) -> Result<MidenContract, DeployError> {
        self.await_commit(deployment.tx_id).await?;
        Ok(MidenContract {
            account_id: deployment.account.id(),
            functions: deployment.functions,
        })
    }

    async fn call(
        &mut self,
        contract: &MidenContract,
        function: &str,
    ) -> Result<PendingCall, DeployError> {
        let script = contract.functions.get(function).cloned().ok_or_else(|| {
            DeployError::Call(format!("contract has no function `{function}`"))
        })?;

        let tx_id = self.submit_script(contract.account_id, script).await?;
        Ok(PendingCall { tx_id })
    }

    async fn wait(&mut self, transaction: PendingCall) -> Result<Confirmation, DeployError> {
        self.await_commit(transaction.tx_id).await?;
        Ok(Confirmation { tx_id: transaction.tx_id.to_hex() })
    }
}
