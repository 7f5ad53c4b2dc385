use std::fmt;

use thiserror::Error;

use custodia_core::errors::{ApplicationError, DomainError};
use custodia_core::gateway::GatewayError;
use custodia_db::RepositoryError;

/// How one half of a concurrent save + create pair ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HalfOutcome {
    Succeeded,
    Failed(String),
}

impl HalfOutcome {
    pub(crate) fn of<T, E: fmt::Display>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(error) => Self::Failed(error.to_string()),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for HalfOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("record store failure: {0}")]
    Store(#[from] RepositoryError),
    #[error("remote account service failure: {0}")]
    Remote(#[from] GatewayError),
    /// The save and the remote create did not both succeed. A half that
    /// succeeded stays applied.
    #[error("store save and remote create did not both succeed (store {store}; gateway {gateway})")]
    Join { store: HalfOutcome, gateway: HalfOutcome },
}

impl ProvisioningError {
    /// True when exactly one side of the join was applied, leaving the
    /// record store and the remote service out of step.
    pub fn is_partial(&self) -> bool {
        match self {
            Self::Join { store, gateway } => store.succeeded() != gateway.succeeded(),
            _ => false,
        }
    }
}

impl From<ProvisioningError> for ApplicationError {
    fn from(value: ProvisioningError) -> Self {
        let partial = value.is_partial();
        match value {
            ProvisioningError::NotFound { entity, id } => Self::NotFound { entity, id },
            ProvisioningError::Domain(error) => Self::Domain(error),
            ProvisioningError::Store(RepositoryError::Conflict(message)) => {
                Self::Domain(DomainError::InvariantViolation(message))
            }
            ProvisioningError::Store(error) => Self::Persistence(error.to_string()),
            ProvisioningError::Remote(error) => Self::Integration(error.to_string()),
            error @ ProvisioningError::Join { .. } if partial => {
                Self::PartialProvisioning(error.to_string())
            }
            error @ ProvisioningError::Join { .. } => Self::Integration(error.to_string()),
        }
    }
}
