use async_trait::async_trait;
use thiserror::Error;

use crate::domain::account::{
    AccountKind, CreditAccount, CurrentAccount, FixedTermAccount, SavingAccount, ServiceSide,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{service} account service unreachable at `{endpoint}`: {message}")]
    Transport { service: ServiceSide, endpoint: String, message: String },
    #[error("{service} account service returned {status} for `{endpoint}`")]
    Status { service: ServiceSide, endpoint: String, status: u16 },
    #[error("could not decode {service} account service response from `{endpoint}`: {message}")]
    Decode { service: ServiceSide, endpoint: String, message: String },
}

impl GatewayError {
    pub fn service(&self) -> ServiceSide {
        match self {
            Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. } => *service,
        }
    }
}

/// Typed client surface over the passive and active account services.
///
/// Existence is modelled as two distinct queries: `account_exists` asks the
/// single-kind probe, which answers with a boolean, while `has_any_accounts`
/// lists the collection and reports whether it is non-empty. An empty
/// collection is `Ok(false)`, never an error.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn account_exists(&self, kind: AccountKind, identifier: &str)
        -> Result<bool, GatewayError>;

    async fn has_any_accounts(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> Result<bool, GatewayError>;

    async fn create_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError>;

    async fn create_current_accounts(
        &self,
        accounts: &[CurrentAccount],
    ) -> Result<Vec<CurrentAccount>, GatewayError>;

    async fn create_saving_account(
        &self,
        account: &SavingAccount,
    ) -> Result<SavingAccount, GatewayError>;

    async fn create_fixed_term_account(
        &self,
        account: &FixedTermAccount,
    ) -> Result<FixedTermAccount, GatewayError>;

    async fn create_credit_account(
        &self,
        account: &CreditAccount,
    ) -> Result<CreditAccount, GatewayError>;

    async fn create_credit_accounts(
        &self,
        accounts: &[CreditAccount],
    ) -> Result<Vec<CreditAccount>, GatewayError>;

    async fn update_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError>;
}
