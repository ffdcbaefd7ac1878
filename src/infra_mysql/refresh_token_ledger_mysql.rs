use super::util::is_dup_key;
use crate::application_port::SessionError;
use crate::domain_model::SubjectId;
use crate::domain_port::{RefreshTokenLedger, RefreshTokenRecord};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Durable ledger over the `refresh_token` table (see `schema.sql`).
pub struct MySqlRefreshTokenLedger {
    pool: MySqlPool,
}

impl MySqlRefreshTokenLedger {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenLedger { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, SessionError> {
        let token: String = row
            .try_get("token")
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        let subject_id: SubjectId = row
            .try_get("subject_id")
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        let revoked: bool = row
            .try_get("revoked")
            .map_err(|e| SessionError::Backend(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(RefreshTokenRecord {
            token,
            subject_id,
            expires_at,
            revoked,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenLedger for MySqlRefreshTokenLedger {
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), SessionError> {
        sqlx::query(
            r#"
INSERT INTO refresh_token (token, subject_id, expires_at, revoked, created_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(&record.token)
        .bind(record.subject_id)
        .bind(record.expires_at)
        .bind(record.revoked)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                SessionError::DuplicateToken
            } else {
                SessionError::Backend(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<Option<RefreshTokenRecord>, SessionError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT token, subject_id, expires_at, revoked, created_at
FROM refresh_token
WHERE token = ?
"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Backend(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn revoke(&self, token: &str) -> Result<bool, SessionError> {
        // Conditional update: only one of several concurrent callers sees an
        // affected row.
        let result = sqlx::query(
            r#"
UPDATE refresh_token
SET revoked = TRUE
WHERE token = ? AND revoked = FALSE
"#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all_for_subject(&self, subject_id: SubjectId) -> Result<u64, SessionError> {
        let result = sqlx::query(
            r#"
UPDATE refresh_token
SET revoked = TRUE
WHERE subject_id = ? AND revoked = FALSE
"#,
        )
        .bind(subject_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query(
            r#"
DELETE FROM refresh_token
WHERE token = ?
"#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(())
    }
}
