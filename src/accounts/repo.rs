use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::repo_types::{Account, AccountRow, NewAccount, Role, Status};
use crate::error::AppError;

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, role, status, created_at";

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. A taken email yields `AppError::Conflict`.
    async fn insert(&self, new: NewAccount) -> Result<Account, AppError>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    /// All accounts, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<Account>>;
    /// Overwrite the status field. `None` when no such account exists.
    async fn update_status(&self, id: Uuid, status: Status) -> anyhow::Result<Option<Account>>;
    /// Set role and status and replace the secret of the account owning `email`.
    async fn grant_admin(&self, email: &str, password_hash: &str)
        -> anyhow::Result<Option<Account>>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_account(row: Option<AccountRow>) -> anyhow::Result<Option<Account>> {
    row.map(Account::try_from).transpose()
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, new: NewAccount) -> Result<Account, AppError> {
        let res = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.status.as_str())
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(row) => Ok(Account::try_from(row)?),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        into_account(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        into_account(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn update_status(&self, id: Uuid, status: Status) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE users SET status = $2
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await
        .context("update user status")?;
        into_account(row)
    }

    async fn grant_admin(
        &self,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE users SET password_hash = $2, role = $3, status = $4
            WHERE email = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(Role::Admin.as_str())
        .bind(Status::Approved.as_str())
        .fetch_optional(&self.db)
        .await
        .context("grant admin")?;
        into_account(row)
    }
}
