use sqlx::Row;

use custodia_core::domain::customer::{Personal, PersonalId};

use super::{
    decode_json, decode_timestamp, encode_json, resolve_personal, PersonalRepository,
    RepositoryError,
};
use crate::DbPool;

const SELECT_PERSONAL: &str = "SELECT id, name, last_name, dni, email, number, current_account,
        saving_account, fixed_term_account, credit_account, created_at, updated_at
 FROM personal";

pub struct SqlPersonalRepository {
    pool: DbPool,
}

impl SqlPersonalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn optional_json<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<T>, RepositoryError> {
    let raw: Option<String> =
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    raw.map(|raw| decode_json(column, &raw)).transpose()
}

fn row_to_personal(row: &sqlx::sqlite::SqliteRow) -> Result<Personal, RepositoryError> {
    let get = |column: &str| -> Result<String, RepositoryError> {
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
    };
    let email: Option<String> =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Personal {
        id: PersonalId(get("id")?),
        name: get("name")?,
        last_name: get("last_name")?,
        dni: get("dni")?,
        email,
        number: get("number")?,
        current_account: optional_json(row, "current_account")?,
        saving_account: optional_json(row, "saving_account")?,
        fixed_term_account: optional_json(row, "fixed_term_account")?,
        credit_account: optional_json(row, "credit_account")?,
        created_at: decode_timestamp("created_at", &get("created_at")?)?,
        updated_at: decode_timestamp("updated_at", &get("updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl PersonalRepository for SqlPersonalRepository {
    async fn find_all(&self) -> Result<Vec<Personal>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_PERSONAL} ORDER BY created_at ASC, id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_personal).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &PersonalId) -> Result<Option<Personal>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_PERSONAL} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_personal).transpose()
    }

    async fn save(&self, personal: Personal) -> Result<Personal, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id_known = sqlx::query("SELECT 1 FROM personal WHERE id = ?")
            .bind(&personal.id.0)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        let holder = sqlx::query(&format!("{SELECT_PERSONAL} WHERE dni = ?"))
            .bind(&personal.dni)
            .fetch_optional(&mut *tx)
            .await?
            .as_ref()
            .map(row_to_personal)
            .transpose()?;
        let personal = resolve_personal(personal, id_known, holder)?;

        let current_account = personal.current_account.as_ref().map(encode_json).transpose()?;
        let saving_account = personal.saving_account.as_ref().map(encode_json).transpose()?;
        let fixed_term_account =
            personal.fixed_term_account.as_ref().map(encode_json).transpose()?;
        let credit_account = personal.credit_account.as_ref().map(encode_json).transpose()?;

        sqlx::query(
            "INSERT INTO personal (id, name, last_name, dni, email, number, current_account,
                                   saving_account, fixed_term_account, credit_account,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 last_name = excluded.last_name,
                 dni = excluded.dni,
                 email = excluded.email,
                 number = excluded.number,
                 current_account = excluded.current_account,
                 saving_account = excluded.saving_account,
                 fixed_term_account = excluded.fixed_term_account,
                 credit_account = excluded.credit_account,
                 updated_at = excluded.updated_at",
        )
        .bind(&personal.id.0)
        .bind(&personal.name)
        .bind(&personal.last_name)
        .bind(&personal.dni)
        .bind(&personal.email)
        .bind(&personal.number)
        .bind(&current_account)
        .bind(&saving_account)
        .bind(&fixed_term_account)
        .bind(&credit_account)
        .bind(personal.created_at.to_rfc3339())
        .bind(personal.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(personal)
    }

    async fn delete_by_id(&self, id: &PersonalId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM personal WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use custodia_core::domain::account::{
        CreditAccount, Currency, SavingAccount, SavingAccountType,
    };
    use custodia_core::domain::customer::{Personal, PersonalId};

    use super::SqlPersonalRepository;
    use crate::repositories::{PersonalRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn personal(id: &str, dni: &str) -> Personal {
        let now = Utc::now();
        Personal {
            id: PersonalId(id.to_string()),
            name: "Rosa".to_string(),
            last_name: "Quispe".to_string(),
            dni: dni.to_string(),
            email: Some("rosa@example.pe".to_string()),
            number: "987654321".to_string(),
            current_account: None,
            saving_account: Some(SavingAccount {
                balance: Decimal::new(25_050, 2),
                currency: Currency::Pen,
                account_type: Some(SavingAccountType::Normal),
                account_number: Some("200-001".to_string()),
                cvc: Some(321),
                identifier: Some(dni.to_string()),
            }),
            fixed_term_account: None,
            credit_account: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_then_find_round_trips_embedded_accounts() {
        let pool = setup().await;
        let repo = SqlPersonalRepository::new(pool.clone());
        let record = personal("P-1", "12345678901");

        repo.save(record.clone()).await.expect("save");
        let found = repo.find_by_id(&record.id).await.expect("find").expect("present");

        assert_eq!(found.dni, record.dni);
        assert_eq!(found.saving_account, record.saving_account);
        assert_eq!(found.current_account, None);
        assert_eq!(found.created_at.timestamp(), record.created_at.timestamp());

        pool.close().await;
    }

    #[tokio::test]
    async fn save_upserts_on_same_id() {
        let pool = setup().await;
        let repo = SqlPersonalRepository::new(pool.clone());
        let mut record = personal("P-2", "12345678902");
        repo.save(record.clone()).await.expect("insert");

        record.name = "Rosa Maria".to_string();
        record.saving_account = None;
        repo.save(record.clone()).await.expect("update");

        let all = repo.find_all().await.expect("find all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Rosa Maria");
        assert_eq!(all[0].saving_account, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn fresh_id_for_stored_dni_keeps_the_stored_record() {
        let pool = setup().await;
        let repo = SqlPersonalRepository::new(pool.clone());
        let first = personal("P-3", "12345678903");
        repo.save(first.clone()).await.expect("first save");

        let second = Personal {
            saving_account: None,
            credit_account: Some(CreditAccount {
                balance: Decimal::new(300_000, 2),
                currency: Currency::Pen,
                account_number: None,
                cvc: None,
                identifier: Some("12345678903".to_string()),
            }),
            ..personal("P-4", "12345678903")
        };
        let saved = repo.save(second.clone()).await.expect("second save");

        assert_eq!(saved.id, first.id);
        assert_eq!(saved.saving_account, first.saving_account, "stored account is kept");
        assert_eq!(saved.credit_account, second.credit_account);
        let all = repo.find_all().await.expect("find all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].credit_account, second.credit_account);
        assert_eq!(repo.find_by_id(&second.id).await.expect("find"), None);

        pool.close().await;
    }

    #[tokio::test]
    async fn stored_id_cannot_take_another_records_dni() {
        let pool = setup().await;
        let repo = SqlPersonalRepository::new(pool.clone());
        repo.save(personal("P-6", "12345678906")).await.expect("save first");
        repo.save(personal("P-7", "12345678907")).await.expect("save second");

        let error =
            repo.save(personal("P-7", "12345678906")).await.expect_err("dni held by P-6");
        assert!(matches!(error, RepositoryError::Conflict(_)));

        let kept = repo.find_by_id(&PersonalId("P-7".to_string())).await.expect("find");
        assert_eq!(kept.map(|p| p.dni).as_deref(), Some("12345678907"));

        pool.close().await;
    }

    #[tokio::test]
    async fn delete_removes_record_and_missing_id_is_none() {
        let pool = setup().await;
        let repo = SqlPersonalRepository::new(pool.clone());
        let record = personal("P-5", "12345678905");
        repo.save(record.clone()).await.expect("save");

        repo.delete_by_id(&record.id).await.expect("delete");
        assert_eq!(repo.find_by_id(&record.id).await.expect("find"), None);
        repo.delete_by_id(&record.id).await.expect("deleting twice is a no-op");

        pool.close().await;
    }
}
