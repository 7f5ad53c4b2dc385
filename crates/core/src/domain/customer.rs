use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::{
    AccountRequest, CreditAccount, CurrentAccount, FixedTermAccount, SavingAccount,
};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalId(pub String);

impl PersonalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnterpriseId(pub String);

impl EnterpriseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Individual customer keyed externally by `dni`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personal {
    #[serde(default = "PersonalId::generate")]
    pub id: PersonalId,
    pub name: String,
    pub last_name: String,
    pub dni: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_account: Option<CurrentAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saving_account: Option<SavingAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_term_account: Option<FixedTermAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_account: Option<CreditAccount>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Personal {
    /// Fails when any embedded account carries an identifier other than `dni`.
    pub fn verify_account_ownership(&self) -> Result<(), DomainError> {
        let owner = self.dni.as_str();
        if let Some(account) = &self.current_account {
            account.ensure_owned_by(owner)?;
        }
        if let Some(account) = &self.saving_account {
            account.ensure_owned_by(owner)?;
        }
        if let Some(account) = &self.fixed_term_account {
            account.ensure_owned_by(owner)?;
        }
        if let Some(account) = &self.credit_account {
            account.ensure_owned_by(owner)?;
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: &PersonalUpdate) {
        self.name = update.name.clone();
        self.last_name = update.last_name.clone();
        self.email = update.email.clone();
        self.number = update.number.clone();
        self.updated_at = Utc::now();
    }
}

/// Mutable profile fields of a [`Personal`] plus an optional replacement
/// for an existing current account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalUpdate {
    pub name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub number: String,
    #[serde(default)]
    pub current_account: Option<CurrentAccount>,
}

/// Enterprise customer keyed externally by `ruc`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enterprise {
    #[serde(default = "EnterpriseId::generate")]
    pub id: EnterpriseId,
    pub name: String,
    pub number: String,
    pub ruc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub cards: Vec<CurrentAccount>,
    #[serde(default)]
    pub credit_accounts: Vec<CreditAccount>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Enterprise {
    pub fn verify_account_ownership(&self) -> Result<(), DomainError> {
        let owner = self.ruc.as_str();
        for card in &self.cards {
            card.ensure_owned_by(owner)?;
        }
        for account in &self.credit_accounts {
            account.ensure_owned_by(owner)?;
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: &EnterpriseUpdate) {
        self.name = update.name.clone();
        self.email = update.email.clone();
        self.number = update.number.clone();
        self.ruc = update.ruc.clone();
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseUpdate {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub number: String,
    pub ruc: String,
}
