use std::sync::Arc;

use tracing::info;

use custodia_core::domain::account::{
    AccountKind, AccountRequest, CreditAccount, CurrentAccount, CurrentAccountType,
};
use custodia_core::domain::customer::{Enterprise, EnterpriseId, EnterpriseUpdate};
use custodia_core::errors::DomainError;
use custodia_core::gateway::{AccountGateway, GatewayError};
use custodia_db::EnterpriseRepository;

use crate::detector::{AccountFamily, DuplicateDetector};
use crate::error::ProvisioningError;
use crate::join::save_and_create;
use crate::outcome::{ProvisioningOutcome, SkipReason};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnterpriseVariant {
    NormalCurrent,
    PymeCurrent,
    Credit,
}

impl EnterpriseVariant {
    pub fn name(self) -> &'static str {
        match self {
            Self::NormalCurrent => "enterprise.normal_current",
            Self::PymeCurrent => "enterprise.pyme_current",
            Self::Credit => "enterprise.credit",
        }
    }

    pub fn kind(self) -> AccountKind {
        match self {
            Self::NormalCurrent | Self::PymeCurrent => AccountKind::Current,
            Self::Credit => AccountKind::Credit,
        }
    }

    pub fn family(self) -> AccountFamily {
        match self {
            Self::NormalCurrent | Self::PymeCurrent => AccountFamily::CurrentLike,
            Self::Credit => AccountFamily::Credit,
        }
    }

    pub fn requires_credit(self) -> bool {
        matches!(self, Self::PymeCurrent)
    }

    /// Stamps every request of the variant's collection with `ruc`.
    fn stamp(self, enterprise: &mut Enterprise) -> Result<BulkRequest, DomainError> {
        let ruc = enterprise.ruc.clone();
        let request = match self {
            Self::NormalCurrent | Self::PymeCurrent => {
                let tag = if self == Self::PymeCurrent {
                    CurrentAccountType::Pyme
                } else {
                    CurrentAccountType::Normal
                };
                enterprise.cards.iter_mut().for_each(|card| card.stamp(&ruc, tag));
                BulkRequest::Current(enterprise.cards.clone())
            }
            Self::Credit => {
                enterprise
                    .credit_accounts
                    .iter_mut()
                    .for_each(|account| account.stamp_identifier(&ruc));
                BulkRequest::Credit(enterprise.credit_accounts.clone())
            }
        };

        if request.is_empty() {
            return Err(DomainError::MissingAccountRequest { kind: self.kind() });
        }
        Ok(request)
    }
}

enum BulkRequest {
    Current(Vec<CurrentAccount>),
    Credit(Vec<CreditAccount>),
}

impl BulkRequest {
    fn is_empty(&self) -> bool {
        match self {
            Self::Current(cards) => cards.is_empty(),
            Self::Credit(accounts) => accounts.is_empty(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Current(cards) => cards.len(),
            Self::Credit(accounts) => accounts.len(),
        }
    }
}

/// Provisions account collections for enterprise customers in one bulk
/// remote call per workflow.
#[derive(Clone)]
pub struct EnterpriseProvisioner {
    store: Arc<dyn EnterpriseRepository>,
    gateway: Arc<dyn AccountGateway>,
    detector: DuplicateDetector,
}

impl EnterpriseProvisioner {
    pub fn new(store: Arc<dyn EnterpriseRepository>, gateway: Arc<dyn AccountGateway>) -> Self {
        let detector = DuplicateDetector::new(gateway.clone());
        Self { store, gateway, detector }
    }

    pub async fn find_all(&self) -> Result<Vec<Enterprise>, ProvisioningError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn find_by_id(&self, id: &EnterpriseId) -> Result<Enterprise, ProvisioningError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProvisioningError::NotFound { entity: "enterprise", id: id.0.clone() })
    }

    pub async fn save_normal_current_account(
        &self,
        enterprise: Enterprise,
    ) -> Result<ProvisioningOutcome<Enterprise>, ProvisioningError> {
        self.provision(EnterpriseVariant::NormalCurrent, enterprise).await
    }

    pub async fn save_pyme_current_account(
        &self,
        enterprise: Enterprise,
    ) -> Result<ProvisioningOutcome<Enterprise>, ProvisioningError> {
        self.provision(EnterpriseVariant::PymeCurrent, enterprise).await
    }

    pub async fn save_credit_account(
        &self,
        enterprise: Enterprise,
    ) -> Result<ProvisioningOutcome<Enterprise>, ProvisioningError> {
        self.provision(EnterpriseVariant::Credit, enterprise).await
    }

    /// Replaces the profile fields of a stored enterprise. The `ruc` cannot
    /// change while the enterprise holds accounts stamped with the old one.
    pub async fn update(
        &self,
        id: &EnterpriseId,
        update: EnterpriseUpdate,
    ) -> Result<Enterprise, ProvisioningError> {
        let mut stored = self.find_by_id(id).await?;

        let holds_accounts = !stored.cards.is_empty() || !stored.credit_accounts.is_empty();
        if holds_accounts && stored.ruc != update.ruc {
            return Err(DomainError::InvariantViolation(format!(
                "ruc of enterprise `{}` cannot change while it holds accounts",
                id.0
            ))
            .into());
        }

        stored.apply_update(&update);
        let saved = self.store.save(stored).await?;
        info!(event_name = "customer.updated", customer_id = %saved.id.0, "enterprise customer updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: &EnterpriseId) -> Result<(), ProvisioningError> {
        self.store.delete_by_id(id).await?;
        info!(event_name = "customer.deleted", customer_id = %id.0, "enterprise customer deleted");
        Ok(())
    }

    async fn provision(
        &self,
        variant: EnterpriseVariant,
        enterprise: Enterprise,
    ) -> Result<ProvisioningOutcome<Enterprise>, ProvisioningError> {
        let mut stamped = enterprise.clone();
        let request = variant.stamp(&mut stamped)?;
        stamped.verify_account_ownership()?;
        let ruc = stamped.ruc.clone();

        let skip = if variant.requires_credit()
            && !self.detector.has_any(&ruc, AccountFamily::Credit).await?
        {
            Some(SkipReason::MissingPrerequisite)
        } else if self.detector.has_any(&ruc, variant.family()).await? {
            Some(SkipReason::Duplicate)
        } else {
            None
        };

        if let Some(reason) = skip {
            info!(
                event_name = "provisioning.skipped",
                variant = variant.name(),
                identifier = %ruc,
                reason = ?reason,
                "accounts not provisioned"
            );
            return Ok(ProvisioningOutcome::Skipped { reason, customer: enterprise });
        }

        let saved = save_and_create(
            variant.name(),
            &ruc,
            self.store.save(stamped),
            self.create_remote(&request),
        )
        .await?;

        info!(
            event_name = "provisioning.created",
            variant = variant.name(),
            identifier = %ruc,
            customer_id = %saved.id.0,
            accounts = request.len(),
            "accounts provisioned"
        );
        Ok(ProvisioningOutcome::Created { customer: saved })
    }

    async fn create_remote(&self, request: &BulkRequest) -> Result<(), GatewayError> {
        match request {
            BulkRequest::Current(cards) => {
                self.gateway.create_current_accounts(cards).await?;
            }
            BulkRequest::Credit(accounts) => {
                self.gateway.create_credit_accounts(accounts).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use custodia_core::domain::account::{
        AccountKind, CreditAccount, Currency, CurrentAccount, CurrentAccountType,
    };
    use custodia_core::domain::customer::{Enterprise, EnterpriseId, EnterpriseUpdate};
    use custodia_core::errors::DomainError;

    use super::EnterpriseProvisioner;
    use crate::error::{HalfOutcome, ProvisioningError};
    use crate::fakes::{FakeGateway, GatewayCall, RecordingEnterpriseStore};
    use crate::outcome::{ProvisioningOutcome, SkipReason};

    const RUC: &str = "20123456789";

    fn enterprise(cards: usize, credits: usize) -> Enterprise {
        let now = Utc::now();
        Enterprise {
            id: EnterpriseId("E-1".to_string()),
            name: "Andes SAC".to_string(),
            number: "014567890".to_string(),
            ruc: RUC.to_string(),
            email: None,
            cards: (0..cards)
                .map(|n| CurrentAccount {
                    balance: Decimal::new(1_000 * (n as i64 + 1), 0),
                    currency: Currency::Pen,
                    account_number: None,
                    account_type: None,
                    cvc: None,
                    identifier: None,
                })
                .collect(),
            credit_accounts: (0..credits)
                .map(|_| CreditAccount {
                    balance: Decimal::new(50_000, 0),
                    currency: Currency::Usd,
                    account_number: None,
                    cvc: None,
                    identifier: None,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn setup(
        gateway: FakeGateway,
    ) -> (EnterpriseProvisioner, Arc<RecordingEnterpriseStore>, Arc<FakeGateway>) {
        setup_with_store(gateway, RecordingEnterpriseStore::default())
    }

    fn setup_with_store(
        gateway: FakeGateway,
        store: RecordingEnterpriseStore,
    ) -> (EnterpriseProvisioner, Arc<RecordingEnterpriseStore>, Arc<FakeGateway>) {
        let store = Arc::new(store);
        let gateway = Arc::new(gateway);
        (EnterpriseProvisioner::new(store.clone(), gateway.clone()), store, gateway)
    }

    #[tokio::test]
    async fn all_cards_are_stamped_and_sent_in_one_bulk_call() {
        let (provisioner, store, gateway) = setup(FakeGateway::default());

        let outcome =
            provisioner.save_normal_current_account(enterprise(3, 0)).await.expect("provision");

        let writes = gateway.writes();
        let [GatewayCall::CreateCurrentBulk(cards)] = writes.as_slice() else {
            panic!("expected one bulk create, got {writes:?}");
        };
        assert_eq!(cards.len(), 3);
        assert!(cards.iter().all(|card| {
            card.identifier.as_deref() == Some(RUC)
                && card.account_type == Some(CurrentAccountType::Normal)
        }));
        assert_eq!(store.saves(), 1);
        assert_eq!(&outcome.customer().cards, cards);
    }

    #[tokio::test]
    async fn existing_current_account_submits_nothing() {
        let (provisioner, store, gateway) =
            setup(FakeGateway::with_existing(&[AccountKind::Current]));
        let request = enterprise(2, 0);

        let outcome =
            provisioner.save_normal_current_account(request.clone()).await.expect("provision");

        assert_eq!(
            outcome,
            ProvisioningOutcome::Skipped { reason: SkipReason::Duplicate, customer: request }
        );
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::HasAny(AccountKind::Current, RUC.to_string())]
        );
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn pyme_requires_an_existing_credit_account() {
        let (provisioner, store, gateway) = setup(FakeGateway::default());

        let outcome =
            provisioner.save_pyme_current_account(enterprise(1, 0)).await.expect("provision");

        assert_eq!(outcome.skip_reason(), Some(SkipReason::MissingPrerequisite));
        assert!(gateway.writes().is_empty());
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn pyme_with_credit_is_tagged_pyme() {
        let (provisioner, _store, gateway) =
            setup(FakeGateway::with_existing(&[AccountKind::Credit]));

        let outcome =
            provisioner.save_pyme_current_account(enterprise(2, 0)).await.expect("provision");

        assert!(outcome.is_created());
        assert_eq!(
            gateway.calls()[..2],
            [
                GatewayCall::HasAny(AccountKind::Credit, RUC.to_string()),
                GatewayCall::HasAny(AccountKind::Current, RUC.to_string()),
            ]
        );
        assert!(outcome
            .customer()
            .cards
            .iter()
            .all(|card| card.account_type == Some(CurrentAccountType::Pyme)));
    }

    #[tokio::test]
    async fn credit_accounts_are_bulk_created_with_ruc() {
        let (provisioner, store, gateway) = setup(FakeGateway::default());

        let outcome = provisioner.save_credit_account(enterprise(0, 2)).await.expect("provision");

        assert!(outcome.is_created());
        let writes = gateway.writes();
        let [GatewayCall::CreateCreditBulk(accounts)] = writes.as_slice() else {
            panic!("expected one bulk credit create, got {writes:?}");
        };
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|account| account.identifier.as_deref() == Some(RUC)));
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test]
    async fn empty_collection_is_rejected() {
        let (provisioner, _store, gateway) = setup(FakeGateway::default());

        let error = provisioner.save_credit_account(enterprise(2, 0)).await.expect_err("empty");

        assert!(matches!(
            error,
            ProvisioningError::Domain(DomainError::MissingAccountRequest { kind: AccountKind::Credit })
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_bulk_create_keeps_the_saved_enterprise() {
        let (provisioner, store, gateway) = setup(FakeGateway::default().failing_writes());
        let request = enterprise(2, 0);

        let error =
            provisioner.save_normal_current_account(request.clone()).await.expect_err("join");

        assert!(error.is_partial());
        assert!(matches!(
            error,
            ProvisioningError::Join { store: HalfOutcome::Succeeded, gateway: HalfOutcome::Failed(_) }
        ));
        let kept = provisioner.find_by_id(&request.id).await.expect("no rollback of the save");
        assert_eq!(kept.cards.len(), 2);
        assert_eq!(store.saves(), 1);
        assert!(matches!(gateway.writes().as_slice(), [GatewayCall::CreateCurrentBulk(_)]));
    }

    #[tokio::test]
    async fn failed_save_still_lets_the_bulk_create_finish() {
        let (provisioner, store, gateway) =
            setup_with_store(FakeGateway::default(), RecordingEnterpriseStore::failing());

        let error = provisioner.save_credit_account(enterprise(0, 3)).await.expect_err("join");

        assert!(error.is_partial());
        assert!(matches!(
            error,
            ProvisioningError::Join { store: HalfOutcome::Failed(_), gateway: HalfOutcome::Succeeded }
        ));
        let writes = gateway.writes();
        let [GatewayCall::CreateCreditBulk(accounts)] = writes.as_slice() else {
            panic!("expected one bulk credit create, got {writes:?}");
        };
        assert_eq!(accounts.len(), 3, "remote accounts are not withdrawn");
        assert_eq!(store.saves(), 1);
        assert!(provisioner.find_all().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn ruc_cannot_change_while_accounts_are_held() {
        let (provisioner, store, _gateway) = setup(FakeGateway::default());
        store.seed(enterprise(1, 0)).await;

        let error = provisioner
            .update(
                &EnterpriseId("E-1".to_string()),
                EnterpriseUpdate {
                    name: "Andes SAC".to_string(),
                    email: None,
                    number: "014567890".to_string(),
                    ruc: "20999999999".to_string(),
                },
            )
            .await
            .expect_err("ruc change");

        assert!(matches!(error, ProvisioningError::Domain(DomainError::InvariantViolation(_))));
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn update_replaces_profile_fields() {
        let (provisioner, store, gateway) = setup(FakeGateway::default());
        store.seed(enterprise(0, 0)).await;

        let updated = provisioner
            .update(
                &EnterpriseId("E-1".to_string()),
                EnterpriseUpdate {
                    name: "Andes Holding SAC".to_string(),
                    email: Some("finanzas@andes.pe".to_string()),
                    number: "014000000".to_string(),
                    ruc: "20999999999".to_string(),
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.ruc, "20999999999");
        assert_eq!(updated.email.as_deref(), Some("finanzas@andes.pe"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn find_by_id_of_unknown_enterprise_is_not_found() {
        let (provisioner, _store, _gateway) = setup(FakeGateway::default());

        let error =
            provisioner.find_by_id(&EnterpriseId("E-404".to_string())).await.expect_err("missing");

        assert!(matches!(error, ProvisioningError::NotFound { entity: "enterprise", .. }));
    }
}
