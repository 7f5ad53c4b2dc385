use sqlx::Row;

use custodia_core::domain::customer::{Enterprise, EnterpriseId};

use super::{
    decode_json, decode_timestamp, encode_json, resolve_enterprise, EnterpriseRepository,
    RepositoryError,
};
use crate::DbPool;

const SELECT_ENTERPRISE: &str =
    "SELECT id, name, number, ruc, email, cards, credit_accounts, created_at, updated_at
 FROM enterprise";

pub struct SqlEnterpriseRepository {
    pool: DbPool,
}

impl SqlEnterpriseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_enterprise(row: &sqlx::sqlite::SqliteRow) -> Result<Enterprise, RepositoryError> {
    let get = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let email: Option<String> =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Enterprise {
        id: EnterpriseId(get("id")?),
        name: get("name")?,
        number: get("number")?,
        ruc: get("ruc")?,
        email,
        cards: decode_json("cards", &get("cards")?)?,
        credit_accounts: decode_json("credit_accounts", &get("credit_accounts")?)?,
        created_at: decode_timestamp("created_at", &get("created_at")?)?,
        updated_at: decode_timestamp("updated_at", &get("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl EnterpriseRepository for SqlEnterpriseRepository {
    async fn find_all(&self) -> Result<Vec<Enterprise>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_ENTERPRISE} ORDER BY created_at ASC, id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_enterprise).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &EnterpriseId) -> Result<Option<Enterprise>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_ENTERPRISE} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_enterprise).transpose()
    }

    async fn save(&self, enterprise: Enterprise) -> Result<Enterprise, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id_known = sqlx::query("SELECT 1 FROM enterprise WHERE id = ?")
            .bind(&enterprise.id.0)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        let holder = sqlx::query(&format!("{SELECT_ENTERPRISE} WHERE ruc = ?"))
            .bind(&enterprise.ruc)
            .fetch_optional(&mut *tx)
            .await?
            .as_ref()
            .map(row_to_enterprise)
            .transpose()?;
        let enterprise = resolve_enterprise(enterprise, id_known, holder)?;

        let cards = encode_json(&enterprise.cards)?;
        let credit_accounts = encode_json(&enterprise.credit_accounts)?;

        sqlx::query(
            "INSERT INTO enterprise (id, name, number, ruc, email, cards, credit_accounts,
                                     created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 number = excluded.number,
                 ruc = excluded.ruc,
                 email = excluded.email,
                 cards = excluded.cards,
                 credit_accounts = excluded.credit_accounts,
                 updated_at = excluded.updated_at",
        )
        .bind(&enterprise.id.0)
        .bind(&enterprise.name)
        .bind(&enterprise.number)
        .bind(&enterprise.ruc)
        .bind(&enterprise.email)
        .bind(&cards)
        .bind(&credit_accounts)
        .bind(enterprise.created_at.to_rfc3339())
        .bind(enterprise.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(enterprise)
    }

    async fn delete_by_id(&self, id: &EnterpriseId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM enterprise WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(())
    }
}
