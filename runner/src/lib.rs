//! Deploys a contract through a pluggable toolchain and mints from it.

pub mod config;
pub mod error;
pub mod logging;
pub mod toolchain;
pub mod workflow;

pub use config::{ContractRegistry, ContractSource, DeployConfig};
pub use error::{DeployError, ErrorKind};
pub use toolchain::{Confirmation, ContractToolchain, DeployedContract};
pub use workflow::{
    exit_code, DeploymentRunner, RunReport, RunState, CONTRACT_NAME, EXIT_FAILURE, EXIT_SUCCESS,
    MINT_CALL_COUNT, MINT_FUNCTION,
};
