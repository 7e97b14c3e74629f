//! Deploy-then-mint workflow.

use std::{fmt, io::Write};

use tracing::{debug, error, info};

use crate::{
    error::DeployError,
    toolchain::{Confirmation, ContractToolchain, DeployedContract},
};

/// Contract deployed by the workflow.
pub const CONTRACT_NAME: &str = "MyNFT";

/// Function invoked on the deployed contract.
pub const MINT_FUNCTION: &str = "make_an_nft";

/// Number of times [`MINT_FUNCTION`] is invoked after deployment.
pub const MINT_CALL_COUNT: u32 = 2;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Deploying,
    Deployed,
    /// Call `index` (1-based) was submitted and is awaiting confirmation.
    CallPending { index: u32 },
    /// Call `index` was confirmed and further calls remain.
    CallDone { index: u32 },
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => f.write_str("NotStarted"),
            RunState::Deploying => f.write_str("Deploying"),
            RunState::Deployed => f.write_str("Deployed"),
            RunState::CallPending { index: 1 } => f.write_str("FirstCallPending"),
            RunState::CallPending { index: 2 } => f.write_str("SecondCallPending"),
            RunState::CallPending { index } => write!(f, "Call{index}Pending"),
            RunState::CallDone { index: 1 } => f.write_str("FirstCallDone"),
            RunState::CallDone { index: 2 } => f.write_str("SecondCallDone"),
            RunState::CallDone { index } => write!(f, "Call{index}Done"),
            RunState::Done => f.write_str("Done"),
            RunState::Failed => f.write_str("Failed"),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub contract_name: String,
    pub address: String,
    /// One confirmation per call, in invocation order.
    pub calls: Vec<Confirmation>,
}

/// Drives a [`ContractToolchain`] through deployment and the mint calls,
/// writing the progress lines to `out`.
pub struct DeploymentRunner<T, W> {
    toolchain: T,
    out: W,
    contract_name: String,
    function: String,
    call_count: u32,
    state: RunState,
    history: Vec<RunState>,
}

impl<T, W> DeploymentRunner<T, W>
where
    T: ContractToolchain,
    W: Write,
{
    pub fn new(toolchain: T, out: W) -> Self {
        Self {
            toolchain,
            out,
            contract_name: CONTRACT_NAME.to_string(),
            function: MINT_FUNCTION.to_string(),
            call_count: MINT_CALL_COUNT,
            state: RunState::NotStarted,
            history: vec![RunState::NotStarted],
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state the last run passed through, starting at `NotStarted`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn toolchain_mut(&mut self) -> &mut T {
        &mut self.toolchain
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs the whole workflow once. The first failure aborts the remaining
    /// steps and leaves the runner in [`RunState::Failed`].
    pub async fn run(&mut self) -> Result<RunReport, DeployError> {
        self.state = RunState::NotStarted;
        self.history = vec![RunState::NotStarted];

        match self.execute().await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.transition(RunState::Failed);
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<RunReport, DeployError> {
        self.transition(RunState::Deploying);
        info!(contract = %self.contract_name, "compiling contract");
        let factory = self.toolchain.get_factory(&self.contract_name).await?;

        info!(contract = %self.contract_name, "submitting deployment");
        let deployment = self.toolchain.deploy(&factory).await?;
        let contract = self.toolchain.wait_for_deployment(deployment).await?;

        let address = contract.address();
        if address.is_empty() {
            return Err(DeployError::confirmation("deployment confirmed without an address"));
        }
        self.transition(RunState::Deployed);
        info!(contract = %self.contract_name, %address, "contract deployed");
        writeln!(self.out, "Contract deployed to: {address}")?;

        let mut calls = Vec::with_capacity(self.call_count as usize);
        for index in 1..=self.call_count {
            self.transition(RunState::CallPending { index });
            debug!(call = index, function = %self.function, "invoking contract function");
            let transaction = self.toolchain.call(&contract, &self.function).await?;
            let confirmation = self.toolchain.wait(transaction).await?;

            info!(call = index, tx_id = %confirmation.tx_id, "call confirmed");
            writeln!(self.out, "minted NFT #{index}")?;
            calls.push(confirmation);

            if index < self.call_count {
                self.transition(RunState::CallDone { index });
            }
        }
        self.out.flush()?;
        self.transition(RunState::Done);

        Ok(RunReport { contract_name: self.contract_name.clone(), address, calls })
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "run state");
        self.state = next;
        self.history.push(next);
    }
}

/// Maps the outcome of a run to a process exit code, logging the failure.
pub fn exit_code(outcome: &Result<RunReport, DeployError>) -> i32 {
    match outcome {
        Ok(_) => EXIT_SUCCESS,
        Err(err) => {
            error!(kind = %err.kind(), error = %err, "deployment workflow failed");
            EXIT_FAILURE
        }
    }
}
