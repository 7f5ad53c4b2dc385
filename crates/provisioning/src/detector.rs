use std::sync::Arc;

use tracing::debug;

use custodia_core::domain::account::AccountKind;
use custodia_core::gateway::{AccountGateway, GatewayError};

/// Account kinds treated as mutually exclusive when checking for duplicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountFamily {
    /// Saving, current and fixed-term: an individual holds at most one.
    SavingLike,
    /// Current accounts of an enterprise.
    CurrentLike,
    Credit,
}

#[derive(Clone)]
pub struct DuplicateDetector {
    gateway: Arc<dyn AccountGateway>,
}

impl DuplicateDetector {
    pub fn new(gateway: Arc<dyn AccountGateway>) -> Self {
        Self { gateway }
    }

    /// Whether `identifier` already holds an account of `family`.
    ///
    /// The saving-like probes run concurrently and are reduced with OR once
    /// all three have answered; any failing probe fails the detection.
    pub async fn has_any(
        &self,
        identifier: &str,
        family: AccountFamily,
    ) -> Result<bool, GatewayError> {
        let found = match family {
            AccountFamily::SavingLike => {
                let (saving, current, fixed_term) = tokio::try_join!(
                    self.gateway.account_exists(AccountKind::Saving, identifier),
                    self.gateway.account_exists(AccountKind::Current, identifier),
                    self.gateway.account_exists(AccountKind::FixedTerm, identifier),
                )?;
                saving || current || fixed_term
            }
            AccountFamily::CurrentLike => {
                self.gateway.has_any_accounts(AccountKind::Current, identifier).await?
            }
            AccountFamily::Credit => {
                self.gateway.has_any_accounts(AccountKind::Credit, identifier).await?
            }
        };

        debug!(identifier, family = ?family, found, "duplicate detection finished");
        Ok(found)
    }
}
