use std::collections::HashMap;

use tokio::sync::RwLock;

use custodia_core::domain::customer::{Enterprise, EnterpriseId, Personal, PersonalId};

use super::{
    resolve_enterprise, resolve_personal, EnterpriseRepository, PersonalRepository,
    RepositoryError,
};

#[derive(Default)]
pub struct InMemoryPersonalRepository {
    records: RwLock<HashMap<String, Personal>>,
}

#[async_trait::async_trait]
impl PersonalRepository for InMemoryPersonalRepository {
    async fn find_all(&self) -> Result<Vec<Personal>, RepositoryError> {
        let records = self.records.read().await;
        let mut all: Vec<Personal> = records.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(all)
    }

    async fn find_by_id(&self, id: &PersonalId) -> Result<Option<Personal>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, personal: Personal) -> Result<Personal, RepositoryError> {
        let mut records = self.records.write().await;
        let id_known = records.contains_key(&personal.id.0);
        let holder = records.values().find(|stored| stored.dni == personal.dni).cloned();
        let personal = resolve_personal(personal, id_known, holder)?;
        records.insert(personal.id.0.clone(), personal.clone());
        Ok(personal)
    }

    async fn delete_by_id(&self, id: &PersonalId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.remove(&id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEnterpriseRepository {
    records: RwLock<HashMap<String, Enterprise>>,
}

#[async_trait::async_trait]
impl EnterpriseRepository for InMemoryEnterpriseRepository {
    async fn find_all(&self) -> Result<Vec<Enterprise>, RepositoryError> {
        let records = self.records.read().await;
        let mut all: Vec<Enterprise> = records.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(all)
    }

    async fn find_by_id(&self, id: &EnterpriseId) -> Result<Option<Enterprise>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn save(&self, enterprise: Enterprise) -> Result<Enterprise, RepositoryError> {
        let mut records = self.records.write().await;
        let id_known = records.contains_key(&enterprise.id.0);
        let holder = records.values().find(|stored| stored.ruc == enterprise.ruc).cloned();
        let enterprise = resolve_enterprise(enterprise, id_known, holder)?;
        records.insert(enterprise.id.0.clone(), enterprise.clone());
        Ok(enterprise)
    }

    async fn delete_by_id(&self, id: &EnterpriseId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.remove(&id.0);
        Ok(())
    }
}
