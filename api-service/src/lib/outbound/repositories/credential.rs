use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Credential;
use crate::account::models::CredentialId;
use crate::account::models::EmailAddress;
use crate::account::ports::CredentialStore;

const EMAIL_UNIQUE_CONSTRAINT: &str = "credentials_email_key";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(e: sqlx::Error) -> AccountError {
    AccountError::Store(e.to_string())
}

fn credential_from_row(row: PgRow) -> Result<Credential, AccountError> {
    let id: Uuid = row.try_get("id").map_err(store_error)?;
    let email: String = row.try_get("email").map_err(store_error)?;
    let password_hash: Option<String> = row.try_get("password_hash").map_err(store_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_error)?;

    let email = EmailAddress::new(&email)
        .map_err(|e| AccountError::Store(format!("Stored email for {} is invalid: {}", id, e)))?;

    Ok(Credential {
        id: CredentialId(id),
        email,
        password_hash,
        created_at,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Credential>, AccountError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at
            FROM credentials
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(credential_from_row).transpose()
    }

    async fn find_by_id(&self, id: &CredentialId) -> Result<Option<Credential>, AccountError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at
            FROM credentials
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(credential_from_row).transpose()
    }

    async fn create(&self, credential: Credential) -> Result<Credential, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(credential.id.0)
        .bind(credential.email.as_str())
        .bind(credential.password_hash.as_deref())
        .bind(credential.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT)
                {
                    return AccountError::DuplicateEmail(credential.email.as_str().to_string());
                }
            }
            store_error(e)
        })?;

        Ok(credential)
    }
}
