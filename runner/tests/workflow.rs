use async_trait::async_trait;
use nft_runner::{
    exit_code, Confirmation, ContractToolchain, DeployError, DeployedContract, DeploymentRunner,
    ErrorKind, RunState, CONTRACT_NAME, EXIT_FAILURE, EXIT_SUCCESS, MINT_CALL_COUNT,
    MINT_FUNCTION,
};

/// Step at which the mock toolchain fails.
#[derive(Clone, Copy, Debug, PartialEq)]
enum FailAt {
    Factory,
    Deploy,
    DeploymentConfirmation,
    Call(u32),
    CallConfirmation(u32),
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Factory(String),
    Deploy,
    DeploymentConfirmed(String),
    Call(u32),
    CallConfirmed(u32),
}

struct MockContract {
    address: String,
}

impl DeployedContract for MockContract {
    fn address(&self) -> String {
        self.address.clone()
    }
}

struct MockToolchain {
    addresses: Vec<String>,
    deployments: usize,
    calls: u32,
    fail_at: Option<FailAt>,
    events: Vec<Event>,
}

impl MockToolchain {
    fn new() -> Self {
        Self {
            addresses: vec!["0xABC...123".to_string()],
            deployments: 0,
            calls: 0,
            fail_at: None,
            events: vec![],
        }
    }

    fn failing_at(fail_at: FailAt) -> Self {
        Self { fail_at: Some(fail_at), ..Self::new() }
    }

    fn with_addresses(addresses: &[&str]) -> Self {
        Self { addresses: addresses.iter().map(|a| a.to_string()).collect(), ..Self::new() }
    }

    fn fails_at(&self, step: FailAt) -> bool {
        self.fail_at == Some(step)
    }
}

#[async_trait(?Send)]
impl ContractToolchain for MockToolchain {
    type Factory = String;
    type Deployment = String;
    type Contract = MockContract;
    type Transaction = u32;

    async fn get_factory(&mut self, contract_name: &str) -> Result<String, DeployError> {
        self.events.push(Event::Factory(contract_name.to_string()));
        if self.fails_at(FailAt::Factory) {
            return Err(DeployError::toolchain(format!("unknown contract `{contract_name}`")));
        }
        Ok(contract_name.to_string())
    }

    async fn deploy(&mut self, _factory: &String) -> Result<String, DeployError> {
        self.events.push(Event::Deploy);
        if self.fails_at(FailAt::Deploy) {
            return Err(DeployError::network("insufficient funds"));
        }
        let address = self
            .addresses
            .get(self.deployments)
            .cloned()
            .unwrap_or_else(|| format!("0x{:040x}", self.deployments + 1));
        self.deployments += 1;
        Ok(address)
    }

    async fn wait_for_deployment(&mut self, deployment: String) -> Result<MockContract, DeployError> {
        if self.fails_at(FailAt::DeploymentConfirmation) {
            return Err(DeployError::confirmation("deployment transaction discarded"));
        }
        self.events.push(Event::DeploymentConfirmed(deployment.clone()));
        Ok(MockContract { address: deployment })
    }

    async fn call(&mut self, _contract: &MockContract, function: &str) -> Result<u32, DeployError> {
        assert_eq!(function, MINT_FUNCTION);
        self.calls += 1;
        let index = self.calls;
        self.events.push(Event::Call(index));
        if self.fails_at(FailAt::Call(index)) {
            return Err(DeployError::call("transaction reverted"));
        }
        Ok(index)
    }

    async fn wait(&mut self, transaction: u32) -> Result<Confirmation, DeployError> {
        if self.fails_at(FailAt::CallConfirmation(transaction)) {
            return Err(DeployError::confirmation("timed out waiting for commitment"));
        }
        self.events.push(Event::CallConfirmed(transaction));
        Ok(Confirmation { tx_id: format!("0xtx{transaction}") })
    }
}

fn printed(runner: &DeploymentRunner<MockToolchain, Vec<u8>>) -> Vec<String> {
    String::from_utf8(runner.output().clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn successful_run_prints_address_and_two_mints() -> anyhow::Result<()> {
    let mut runner = DeploymentRunner::new(MockToolchain::new(), Vec::new());

    let outcome = runner.run().await;
    assert_eq!(exit_code(&outcome), EXIT_SUCCESS);

    let report = outcome?;
    assert_eq!(report.contract_name, CONTRACT_NAME);
    assert_eq!(report.address, "0xABC...123");
    assert_eq!(report.calls.len(), MINT_CALL_COUNT as usize);
    assert_eq!(
        printed(&runner),
        vec!["Contract deployed to: 0xABC...123", "minted NFT #1", "minted NFT #2"]
    );
    Ok(())
}

#[tokio::test]
async fn confirmations_happen_in_order() -> anyhow::Result<()> {
    let mut runner = DeploymentRunner::new(MockToolchain::new(), Vec::new());
    runner.run().await?;

    assert_eq!(
        runner.toolchain().events,
        vec![
            Event::Factory(CONTRACT_NAME.to_string()),
            Event::Deploy,
            Event::DeploymentConfirmed("0xABC...123".to_string()),
            Event::Call(1),
            Event::CallConfirmed(1),
            Event::Call(2),
            Event::CallConfirmed(2),
        ]
    );
    assert_eq!(
        runner.history(),
        &[
            RunState::NotStarted,
            RunState::Deploying,
            RunState::Deployed,
            RunState::CallPending { index: 1 },
            RunState::CallDone { index: 1 },
            RunState::CallPending { index: 2 },
            RunState::Done,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn reported_address_matches_deployment_confirmation() -> anyhow::Result<()> {
    let mut runner =
        DeploymentRunner::new(MockToolchain::with_addresses(&["0x5fbdb2315678"]), Vec::new());
    let report = runner.run().await?;

    assert!(!report.address.is_empty());
    assert!(runner
        .toolchain()
        .events
        .contains(&Event::DeploymentConfirmed(report.address.clone())));
    assert_eq!(printed(&runner)[0], format!("Contract deployed to: {}", report.address));
    Ok(())
}

#[tokio::test]
async fn deployment_confirmation_failure_skips_calls() {
    let mut runner =
        DeploymentRunner::new(MockToolchain::failing_at(FailAt::DeploymentConfirmation), Vec::new());

    let outcome = runner.run().await;
    assert_eq!(exit_code(&outcome), EXIT_FAILURE);
    assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Confirmation);

    assert_eq!(runner.toolchain().calls, 0);
    assert!(printed(&runner).iter().all(|line| !line.contains("minted")));
    assert_eq!(runner.state(), RunState::Failed);
}

#[tokio::test]
async fn unknown_contract_fails_before_deployment() {
    let mut runner = DeploymentRunner::new(MockToolchain::failing_at(FailAt::Factory), Vec::new());

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Toolchain);
    assert_eq!(runner.toolchain().events, vec![Event::Factory(CONTRACT_NAME.to_string())]);
    assert!(printed(&runner).is_empty());
}

#[tokio::test]
async fn rejected_deployment_is_a_network_error() {
    let mut runner = DeploymentRunner::new(MockToolchain::failing_at(FailAt::Deploy), Vec::new());

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(runner.toolchain().calls, 0);
    assert_eq!(runner.history().last(), Some(&RunState::Failed));
}

#[tokio::test]
async fn first_call_failure_skips_second_call() {
    let mut runner = DeploymentRunner::new(MockToolchain::failing_at(FailAt::Call(1)), Vec::new());

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Call);
    assert_eq!(runner.toolchain().calls, 1);
    assert_eq!(printed(&runner), vec!["Contract deployed to: 0xABC...123"]);
    assert_eq!(
        runner.history(),
        &[
            RunState::NotStarted,
            RunState::Deploying,
            RunState::Deployed,
            RunState::CallPending { index: 1 },
            RunState::Failed,
        ]
    );
}

#[tokio::test]
async fn second_confirmation_failure_keeps_first_mint() {
    let mut runner =
        DeploymentRunner::new(MockToolchain::failing_at(FailAt::CallConfirmation(2)), Vec::new());

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Confirmation);
    assert_eq!(
        printed(&runner),
        vec!["Contract deployed to: 0xABC...123", "minted NFT #1"]
    );
    assert_eq!(runner.state(), RunState::Failed);
}

#[tokio::test]
async fn empty_address_is_rejected() {
    let mut runner = DeploymentRunner::new(MockToolchain::with_addresses(&[""]), Vec::new());

    let err = runner.run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Confirmation);
    assert_eq!(runner.toolchain().calls, 0);
    assert!(printed(&runner).is_empty());
}

#[tokio::test]
async fn two_runs_deploy_two_contracts() -> anyhow::Result<()> {
    let mut runner = DeploymentRunner::new(MockToolchain::new(), Vec::new());

    let first = runner.run().await?;
    let second = runner.run().await?;

    assert_ne!(first.address, second.address);
    assert_eq!(runner.toolchain().deployments, 2);
    assert_eq!(runner.toolchain().calls, 2 * MINT_CALL_COUNT);
    Ok(())
}
