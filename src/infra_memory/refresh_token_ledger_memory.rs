use crate::application_port::SessionError;
use crate::domain_model::SubjectId;
use crate::domain_port::{RefreshTokenLedger, RefreshTokenRecord};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Default)]
pub struct MemoryRefreshTokenLedger {
    records: DashMap<String, RefreshTokenRecord>,
}

impl MemoryRefreshTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RefreshTokenLedger for MemoryRefreshTokenLedger {
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), SessionError> {
        match self.records.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(SessionError::DuplicateToken),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, SessionError> {
        Ok(self.records.get(token).map(|r| r.value().clone()))
    }

    async fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        // The shard lock held by get_mut makes the check-and-set atomic.
        match self.records.get_mut(token) {
            Some(mut record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_subject(&self, subject_id: SubjectId) -> Result<u64, SessionError> {
        let mut revoked = 0;
        for mut record in self.records.iter_mut() {
            if record.subject_id == subject_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.records.remove(token);
        Ok(())
    }
}
