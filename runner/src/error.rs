use std::fmt;

use thiserror::Error;

/// Errors raised while deploying a contract or invoking it.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The contract is unknown or could not be compiled.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// A transaction was rejected on submission or the node was unreachable.
    #[error("network error: {0}")]
    Network(String),

    /// A transaction was discarded or never reached a committed block.
    #[error("confirmation error: {0}")]
    Confirmation(String),

    /// A contract function could not be executed.
    #[error("call error: {0}")]
    Call(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Coarse classification of a [`DeployError`], used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Toolchain,
    Network,
    Confirmation,
    Call,
    Config,
    Output,
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Toolchain(_) => ErrorKind::Toolchain,
            DeployError::Network(_) => ErrorKind::Network,
            DeployError::Confirmation(_) => ErrorKind::Confirmation,
            DeployError::Call(_) => ErrorKind::Call,
            DeployError::Config(_) => ErrorKind::Config,
            DeployError::Output(_) => ErrorKind::Output,
        }
    }

    pub fn toolchain(err: impl fmt::Display) -> Self {
        DeployError::Toolchain(err.to_string())
    }

    pub fn network(err: impl fmt::Display) -> Self {
        DeployError::Network(err.to_string())
    }

    pub fn confirmation(err: impl fmt::Display) -> Self {
        DeployError::Confirmation(err.to_string())
    }

    pub fn call(err: impl fmt::Display) -> Self {
        DeployError::Call(err.to_string())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Toolchain => "ToolchainError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Confirmation => "ConfirmationError",
            ErrorKind::Call => "CallError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Output => "OutputError",
        };
        f.write_str(name)
    }
}
