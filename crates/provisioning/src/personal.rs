use std::sync::Arc;

use tracing::info;

use custodia_core::domain::account::{
    AccountKind, AccountRequest, CreditAccount, CurrentAccount, CurrentAccountType,
    FixedTermAccount, SavingAccount, SavingAccountType,
};
use custodia_core::domain::customer::{Personal, PersonalId, PersonalUpdate};
use custodia_core::errors::DomainError;
use custodia_core::gateway::{AccountGateway, GatewayError};
use custodia_db::PersonalRepository;

use crate::detector::{AccountFamily, DuplicateDetector};
use crate::error::ProvisioningError;
use crate::join::save_and_create;
use crate::outcome::{ProvisioningOutcome, SkipReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonalVariant {
    NormalSaving,
    VipSaving,
    FixedTerm,
    Current,
    Credit,
}

impl PersonalVariant {
    pub fn name(self) -> &'static str {
        match self {
            Self::NormalSaving => "personal.normal_saving",
            Self::VipSaving => "personal.vip_saving",
            Self::FixedTerm => "personal.fixed_term",
            Self::Current => "personal.current",
            Self::Credit => "personal.credit",
        }
    }

    pub fn kind(self) -> AccountKind {
        match self {
            Self::NormalSaving | Self::VipSaving => AccountKind::Saving,
            Self::FixedTerm => AccountKind::FixedTerm,
            Self::Current => AccountKind::Current,
            Self::Credit => AccountKind::Credit,
        }
    }

    pub fn family(self) -> AccountFamily {
        match self {
            Self::Credit => AccountFamily::Credit,
            _ => AccountFamily::SavingLike,
        }
    }

    /// Whether the customer must already hold a credit account.
    pub fn requires_credit(self) -> bool {
        matches!(self, Self::VipSaving)
    }

    /// Stamps the requested account with the customer's `dni` and the
    /// variant's sub-type, returning a copy of the stamped request.
    fn stamp(self, personal: &mut Personal) -> Result<StampedRequest, DomainError> {
        let missing = DomainError::MissingAccountRequest { kind: self.kind() };
        let dni = personal.dni.clone();
        let request = match self {
            Self::NormalSaving | Self::VipSaving => {
                let account = personal.saving_account.as_mut().ok_or(missing)?;
                let tag = if self == Self::VipSaving {
                    SavingAccountType::Vip
                } else {
                    SavingAccountType::Normal
                };
                account.stamp(&dni, tag);
                StampedRequest::Saving(account.clone())
            }
            Self::FixedTerm => {
                let account = personal.fixed_term_account.as_mut().ok_or(missing)?;
                account.stamp_identifier(&dni);
                StampedRequest::FixedTerm(account.clone())
            }
            Self::Current => {
                let account = personal.current_account.as_mut().ok_or(missing)?;
                account.stamp(&dni, CurrentAccountType::Normal);
                StampedRequest::Current(account.clone())
            }
            Self::Credit => {
                let account = personal.credit_account.as_mut().ok_or(missing)?;
                account.stamp_identifier(&dni);
                StampedRequest::Credit(account.clone())
            }
        };
        Ok(request)
    }
}

enum StampedRequest {
    Current(CurrentAccount),
    Saving(SavingAccount),
    FixedTerm(FixedTermAccount),
    Credit(CreditAccount),
}

/// Provisions single accounts for individual customers.
#[derive(Clone)]
pub struct PersonalProvisioner {
    store: Arc<dyn PersonalRepository>,
    gateway: Arc<dyn AccountGateway>,
    detector: DuplicateDetector,
}

impl PersonalProvisioner {
    pub fn new(store: Arc<dyn PersonalRepository>, gateway: Arc<dyn AccountGateway>) -> Self {
        let detector = DuplicateDetector::new(gateway.clone());
        Self { store, gateway, detector }
    }

    pub async fn find_all(&self) -> Result<Vec<Personal>, ProvisioningError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn find_by_id(&self, id: &PersonalId) -> Result<Personal, ProvisioningError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProvisioningError::NotFound { entity: "personal", id: id.0.clone() })
    }

    pub async fn save_normal_saving_account(
        &self,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        self.provision(PersonalVariant::NormalSaving, personal).await
    }

    pub async fn save_vip_saving_account(
        &self,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        self.provision(PersonalVariant::VipSaving, personal).await
    }

    pub async fn save_fixed_term_account(
        &self,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        self.provision(PersonalVariant::FixedTerm, personal).await
    }

    pub async fn save_current_account(
        &self,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        self.provision(PersonalVariant::Current, personal).await
    }

    pub async fn save_credit_account(
        &self,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        self.provision(PersonalVariant::Credit, personal).await
    }

    /// Replaces the profile fields of a stored customer. When the customer
    /// already owns a current account and the update carries one, the remote
    /// account is updated before the record is saved.
    pub async fn update(
        &self,
        id: &PersonalId,
        update: PersonalUpdate,
    ) -> Result<Personal, ProvisioningError> {
        let mut stored = self.find_by_id(id).await?;
        stored.apply_update(&update);

        let owns_current = stored.current_account.is_some();
        if let (true, Some(mut account)) = (owns_current, update.current_account) {
            account.stamp_identifier(&stored.dni);
            if account.account_number.is_none() {
                return Err(DomainError::InvariantViolation(
                    "current account update requires an account number".to_string(),
                )
                .into());
            }
            self.gateway.update_current_account(&account).await?;
            stored.current_account = Some(account);
        }

        let saved = self.store.save(stored).await?;
        info!(event_name = "customer.updated", customer_id = %saved.id.0, "personal customer updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: &PersonalId) -> Result<(), ProvisioningError> {
        self.store.delete_by_id(id).await?;
        info!(event_name = "customer.deleted", customer_id = %id.0, "personal customer deleted");
        Ok(())
    }

    async fn provision(
        &self,
        variant: PersonalVariant,
        personal: Personal,
    ) -> Result<ProvisioningOutcome<Personal>, ProvisioningError> {
        let mut stamped = personal.clone();
        let request = variant.stamp(&mut stamped)?;
        stamped.verify_account_ownership()?;
        let dni = stamped.dni.clone();

        let skip = if variant.requires_credit()
            && !self.detector.has_any(&dni, AccountFamily::Credit).await?
        {
            Some(SkipReason::MissingPrerequisite)
        } else if self.detector.has_any(&dni, variant.family()).await? {
            Some(SkipReason::Duplicate)
        } else {
            None
        };

        if let Some(reason) = skip {
            info!(
                event_name = "provisioning.skipped",
                variant = variant.name(),
                identifier = %dni,
                reason = ?reason,
                "account not provisioned"
            );
            return Ok(ProvisioningOutcome::Skipped { reason, customer: personal });
        }

        let saved = save_and_create(
            variant.name(),
            &dni,
            self.store.save(stamped),
            self.create_remote(&request),
        )
        .await?;

        info!(
            event_name = "provisioning.created",
            variant = variant.name(),
            identifier = %dni,
            customer_id = %saved.id.0,
            "account provisioned"
        );
        Ok(ProvisioningOutcome::Created { customer: saved })
    }

    async fn create_remote(&self, request: &StampedRequest) -> Result<(), GatewayError> {
        match request {
            StampedRequest::Current(account) => {
                self.gateway.create_current_account(account).await?;
            }
            StampedRequest::Saving(account) => {
                self.gateway.create_saving_account(account).await?;
            }
            StampedRequest::FixedTerm(account) => {
                self.gateway.create_fixed_term_account(account).await?;
            }
            StampedRequest::Credit(account) => {
                self.gateway.create_credit_account(account).await?;
            }
        }
        Ok(())
    }
}
