//! The contract toolchain the deployment workflow drives.
//!
//! A toolchain compiles a named contract, publishes it and executes its
//! functions. Each step that submits a transaction hands back a pending
//! handle which must be passed, by value, to the matching wait operation.

use async_trait::async_trait;

use crate::error::DeployError;

/// A contract instance whose deployment has been confirmed.
pub trait DeployedContract {
    /// On-chain address of the instance, as a hex string.
    fn address(&self) -> String;
}

/// Proof that a submitted transaction was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_id: String,
}

#[async_trait(?Send)]
pub trait ContractToolchain {
    /// Deployable representation of a compiled contract.
    type Factory;
    /// A deployment transaction that has been submitted but not confirmed.
    type Deployment;
    type Contract: DeployedContract;
    /// A function call transaction that has been submitted but not confirmed.
    type Transaction;

    async fn get_factory(&mut self, contract_name: &str) -> Result<Self::Factory, DeployError>;

    async fn deploy(&mut self, factory: &Self::Factory) -> Result<Self::Deployment, DeployError>;

    async fn wait_for_deployment(
        &mut self,
        deployment: Self::Deployment,
    ) -> Result<Self::Contract, DeployError>;

    /// Invokes a state-mutating function that takes no arguments.
    async fn call(
        &mut self,
        contract: &Self::Contract,
        function: &str,
    ) -> Result<Self::Transaction, DeployError>;

    async fn wait(&mut self, transaction: Self::Transaction) -> Result<Confirmation, DeployError>;
}
