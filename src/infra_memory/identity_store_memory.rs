use crate::application_port::SessionError;
use crate::domain_model::SubjectId;
use crate::domain_port::{Identity, IdentityStore};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: DashMap<SubjectId, Identity>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, identity: Identity) {
        self.identities.insert(identity.id, identity);
    }
}

#[async_trait::async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, SessionError> {
        Ok(self
            .identities
            .iter()
            .find(|i| i.email == email)
            .map(|i| i.value().clone()))
    }

    async fn find_by_id(&self, id: SubjectId) -> Result<Option<Identity>, SessionError> {
        Ok(self.identities.get(&id).map(|i| i.value().clone()))
    }

    async fn mark_phone_verified(&self, id: SubjectId) -> Result<(), SessionError> {
        let mut identity = self
            .identities
            .get_mut(&id)
            .ok_or(SessionError::SubjectNotFound)?;
        identity.phone_verified = true;
        Ok(())
    }

    async fn mark_email_verified(&self, id: SubjectId) -> Result<(), SessionError> {
        let mut identity = self
            .identities
            .get_mut(&id)
            .ok_or(SessionError::SubjectNotFound)?;
        identity.email_verified = true;
        Ok(())
    }
}
