use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use custodia_core::domain::account::{
    AccountKind, CreditAccount, CurrentAccount, FixedTermAccount, SavingAccount,
};
use custodia_core::domain::customer::{Enterprise, EnterpriseId, Personal, PersonalId};
use custodia_core::gateway::{AccountGateway, GatewayError};
use custodia_db::{
    EnterpriseRepository, InMemoryEnterpriseRepository, InMemoryPersonalRepository,
    PersonalRepository, RepositoryError,
};

#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    Exists(AccountKind, String),
    HasAny(AccountKind, String),
    CreateCurrent(CurrentAccount),
    CreateCurrentBulk(Vec<CurrentAccount>),
    CreateSaving(SavingAccount),
    CreateFixedTerm(FixedTermAccount),
    CreateCredit(CreditAccount),
    CreateCreditBulk(Vec<CreditAccount>),
    UpdateCurrent(CurrentAccount),
}

impl GatewayCall {
    fn is_probe(&self) -> bool {
        matches!(self, Self::Exists(..) | Self::HasAny(..))
    }
}

/// Answers probes from the set of existing kinds and records every call.
/// A successful write adds its kind to the set.
#[derive(Default)]
pub struct FakeGateway {
    existing: Mutex<HashSet<AccountKind>>,
    failing_probes: HashSet<AccountKind>,
    fail_writes: bool,
    delays: HashMap<AccountKind, Duration>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl FakeGateway {
    pub fn with_existing(kinds: &[AccountKind]) -> Self {
        Self { existing: Mutex::new(kinds.iter().copied().collect()), ..Self::default() }
    }

    pub fn failing_probe(mut self, kind: AccountKind) -> Self {
        self.failing_probes.insert(kind);
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn delay(mut self, kind: AccountKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("call log").clone()
    }

    /// Every recorded call except existence probes.
    pub fn writes(&self) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(|call| !call.is_probe()).collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().expect("call log").push(call);
    }

    async fn probe(&self, kind: AccountKind) -> Result<bool, GatewayError> {
        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_probes.contains(&kind) {
            return Err(unavailable(kind, "probe"));
        }
        Ok(self.existing.lock().expect("existing kinds").contains(&kind))
    }

    fn write<T>(&self, kind: AccountKind, call: GatewayCall, echo: T) -> Result<T, GatewayError> {
        self.record(call);
        if self.fail_writes {
            return Err(unavailable(kind, "write"));
        }
        self.existing.lock().expect("existing kinds").insert(kind);
        Ok(echo)
    }
}

fn unavailable(kind: AccountKind, operation: &str) -> GatewayError {
    GatewayError::Status {
        service: kind.service(),
        endpoint: format!("fake://{}/{operation}", kind.resource()),
        status: 503,
    }
}

#[async_trait]
impl AccountGateway for FakeGateway {
    async fn account_exists(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> Result<bool, GatewayError> {
        self.record(GatewayCall::Exists(kind, identifier.to_string()));
        self.probe(kind).await
    }

    async fn has_any_accounts(
        &self,
        kind: AccountKind,
        identifier: &str,
    ) -> Result<bool, GatewayError> {
        self.record(GatewayCall::HasAny(kind, identifier.to_string()));
        self.probe(kind).await
    }

    async fn create_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError> {
        self.write(AccountKind::Current, GatewayCall::CreateCurrent(account.clone()), account.clone())
    }

    async fn create_current_accounts(
        &self,
        accounts: &[CurrentAccount],
    ) -> Result<Vec<CurrentAccount>, GatewayError> {
        self.write(
            AccountKind::Current,
            GatewayCall::CreateCurrentBulk(accounts.to_vec()),
            accounts.to_vec(),
        )
    }

    async fn create_saving_account(
        &self,
        account: &SavingAccount,
    ) -> Result<SavingAccount, GatewayError> {
        self.write(AccountKind::Saving, GatewayCall::CreateSaving(account.clone()), account.clone())
    }

    async fn create_fixed_term_account(
        &self,
        account: &FixedTermAccount,
    ) -> Result<FixedTermAccount, GatewayError> {
        self.write(
            AccountKind::FixedTerm,
            GatewayCall::CreateFixedTerm(account.clone()),
            account.clone(),
        )
    }

    async fn create_credit_account(
        &self,
        account: &CreditAccount,
    ) -> Result<CreditAccount, GatewayError> {
        self.write(AccountKind::Credit, GatewayCall::CreateCredit(account.clone()), account.clone())
    }

    async fn create_credit_accounts(
        &self,
        accounts: &[CreditAccount],
    ) -> Result<Vec<CreditAccount>, GatewayError> {
        self.write(
            AccountKind::Credit,
            GatewayCall::CreateCreditBulk(accounts.to_vec()),
            accounts.to_vec(),
        )
    }

    async fn update_current_account(
        &self,
        account: &CurrentAccount,
    ) -> Result<CurrentAccount, GatewayError> {
        self.write(AccountKind::Current, GatewayCall::UpdateCurrent(account.clone()), account.clone())
    }
}

fn store_down() -> RepositoryError {
    RepositoryError::Encode("record store unavailable".to_string())
}

/// In-memory personal store that counts saves and can be told to fail them.
#[derive(Default)]
pub struct RecordingPersonalStore {
    inner: InMemoryPersonalRepository,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl RecordingPersonalStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        store
    }

    /// Seeds a record without counting it as a save.
    pub async fn seed(&self, personal: Personal) {
        self.inner.save(personal).await.expect("seed personal");
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersonalRepository for RecordingPersonalStore {
    async fn find_all(&self) -> Result<Vec<Personal>, RepositoryError> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: &PersonalId) -> Result<Option<Personal>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, personal: Personal) -> Result<Personal, RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(store_down());
        }
        self.inner.save(personal).await
    }

    async fn delete_by_id(&self, id: &PersonalId) -> Result<(), RepositoryError> {
        self.inner.delete_by_id(id).await
    }
}

#[derive(Default)]
pub struct RecordingEnterpriseStore {
    inner: InMemoryEnterpriseRepository,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl RecordingEnterpriseStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_saves.store(true, Ordering::SeqCst);
        store
    }

    pub async fn seed(&self, enterprise: Enterprise) {
        self.inner.save(enterprise).await.expect("seed enterprise");
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnterpriseRepository for RecordingEnterpriseStore {
    async fn find_all(&self) -> Result<Vec<Enterprise>, RepositoryError> {
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: &EnterpriseId) -> Result<Option<Enterprise>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, enterprise: Enterprise) -> Result<Enterprise, RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(store_down());
        }
        self.inner.save(enterprise).await
    }

    async fn delete_by_id(&self, id: &EnterpriseId) -> Result<(), RepositoryError> {
        self.inner.delete_by_id(id).await
    }
}
