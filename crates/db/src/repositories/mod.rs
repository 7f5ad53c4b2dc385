use async_trait::async_trait;
use thiserror::Error;

use custodia_core::domain::customer::{Enterprise, EnterpriseId, Personal, PersonalId};

pub mod enterprise;
pub mod memory;
pub mod personal;

pub use enterprise::SqlEnterpriseRepository;
pub use memory::{InMemoryEnterpriseRepository, InMemoryPersonalRepository};
pub use personal::SqlPersonalRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("identifier conflict: {0}")]
    Conflict(String),
}

/// Records are keyed by id, and `dni`/`ruc` is unique across records.
///
/// `save` of a record whose id is not stored yet but whose identifier is
/// folds into the stored holder of that identifier: the stored id and
/// `created_at` are kept, and embedded accounts the incoming record leaves
/// empty keep their stored value. Saving a stored id with an identifier that
/// another record holds is a [`RepositoryError::Conflict`].
#[async_trait]
pub trait PersonalRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Personal>, RepositoryError>;
    async fn find_by_id(&self, id: &PersonalId) -> Result<Option<Personal>, RepositoryError>;
    async fn save(&self, personal: Personal) -> Result<Personal, RepositoryError>;
    async fn delete_by_id(&self, id: &PersonalId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait EnterpriseRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Enterprise>, RepositoryError>;
    async fn find_by_id(&self, id: &EnterpriseId) -> Result<Option<Enterprise>, RepositoryError>;
    async fn save(&self, enterprise: Enterprise) -> Result<Enterprise, RepositoryError>;
    async fn delete_by_id(&self, id: &EnterpriseId) -> Result<(), RepositoryError>;
}

pub(crate) fn resolve_personal(
    incoming: Personal,
    id_known: bool,
    holder: Option<Personal>,
) -> Result<Personal, RepositoryError> {
    match holder {
        None => Ok(incoming),
        Some(holder) if holder.id == incoming.id => Ok(incoming),
        Some(holder) if !id_known => Ok(Personal {
            id: holder.id,
            created_at: holder.created_at,
            current_account: incoming.current_account.or(holder.current_account),
            saving_account: incoming.saving_account.or(holder.saving_account),
            fixed_term_account: incoming.fixed_term_account.or(holder.fixed_term_account),
            credit_account: incoming.credit_account.or(holder.credit_account),
            ..incoming
        }),
        Some(holder) => Err(RepositoryError::Conflict(format!(
            "dni `{}` already belongs to personal `{}`",
            incoming.dni, holder.id.0
        ))),
    }
}

pub(crate) fn resolve_enterprise(
    incoming: Enterprise,
    id_known: bool,
    holder: Option<Enterprise>,
) -> Result<Enterprise, RepositoryError> {
    match holder {
        None => Ok(incoming),
        Some(holder) if holder.id == incoming.id => Ok(incoming),
        Some(holder) if !id_known => Ok(Enterprise {
            id: holder.id,
            created_at: holder.created_at,
            cards: if incoming.cards.is_empty() { holder.cards } else { incoming.cards },
            credit_accounts: if incoming.credit_accounts.is_empty() {
                holder.credit_accounts
            } else {
                incoming.credit_accounts
            },
            ..incoming
        }),
        Some(holder) => Err(RepositoryError::Conflict(format!(
            "ruc `{}` already belongs to enterprise `{}`",
            incoming.ruc, holder.id.0
        ))),
    }
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Encode(e.to_string()))
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

pub(crate) fn decode_timestamp(
    column: &str,
    raw: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}
