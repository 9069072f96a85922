use std::fmt::Display;
use thiserror::Error;

/// Failures of the election synchronization and voting protocol.
///
/// Whether an error ends the session is decided by the path it occurred on,
/// not by the variant: see [`crate::election::client::Notice`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("No Ethereum provider available. Configure provider.url or set WEB3_PROVIDER_URI")]
    NoProviderAvailable,

    #[error("The provider did not expose any account. Unlock your wallet and select an account")]
    NoAccountSelected,

    #[error("The election contract is not deployed on network {network_id}")]
    DeploymentNotFound { network_id: u64 },

    #[error("Failed to read election state: {cause}")]
    ReadFailure { cause: String },

    #[error("Vote rejected: {cause}")]
    VoteRejected { cause: String },
}

impl ElectionError {
    pub fn read(cause: impl Display) -> Self {
        Self::ReadFailure {
            cause: cause.to_string(),
        }
    }

    pub fn rejected(cause: impl Display) -> Self {
        Self::VoteRejected {
            cause: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ElectionError>;
