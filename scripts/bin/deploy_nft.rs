//! Deploys the MyNFT contract and mints two tokens from it.

use std::process::ExitCode;

use helpers::MidenToolchain;
use nft_runner::{
    exit_code, logging::init_logging, DeployConfig, DeployError, DeploymentRunner, RunReport,
};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let outcome = match DeployConfig::load() {
        Ok(config) => {
            if let Err(e) = init_logging(&config.log_level) {
                eprintln!("{e}");
            }
            deploy(&config).await
        }
        Err(e) => {
            if let Err(log_err) = init_logging(DEFAULT_LOG_LEVEL) {
                eprintln!("{log_err}");
            }
            Err(e)
        }
    };
    ExitCode::from(exit_code(&outcome) as u8)
}

async fn deploy(config: &DeployConfig) -> Result<RunReport, DeployError> {
    config.validate()?;

    let toolchain = MidenToolchain::connect(config).await?;
    let mut runner = DeploymentRunner::new(toolchain, std::io::stdout());
    runner.run().await
}
