use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::accounts::repo::AccountStore;
use crate::accounts::repo_types::{Account, Identity, NewAccount, Role, Status};
use crate::auth::password::CredentialHasher;
use crate::config::AdminSeed;
use crate::error::AppError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const DUMMY_PASSWORD: &str = "not-a-real-password";

/// Owns account records and the approval state machine.
#[derive(Clone)]
pub struct AccountDirectory {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn CredentialHasher>,
    /// Verified against on unknown emails so both failures cost one hash check.
    dummy_hash: Option<Arc<str>>,
}

impl AccountDirectory {
    pub fn new(store: Arc<dyn AccountStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        let dummy_hash = match hasher.hash(DUMMY_PASSWORD) {
            Ok(hash) => Some(Arc::from(hash)),
            Err(e) => {
                error!(error = ?e, "failed to prepare dummy credential hash");
                None
            }
        };
        Self {
            store,
            hasher,
            dummy_hash,
        }
    }

    /// Register a new `user` account awaiting approval.
    pub async fn create(
        &self,
        name: Option<&str>,
        email: &str,
        raw_password: &str,
    ) -> Result<(), AppError> {
        if self.find_by_email(email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict);
        }

        let password_hash = self.hasher.hash(raw_password)?;
        let account = self
            .store
            .insert(NewAccount {
                name: name.map(str::to_owned),
                email: email.to_owned(),
                password_hash,
                role: Role::User,
                status: Status::Pending,
            })
            .await?;

        info!(user_id = %account.id, email = %account.email, "user registered");
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.store.find_by_email(email).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Returns the identity on a match and `None` otherwise, without saying why.
    pub async fn verify_credential(
        &self,
        email: &str,
        raw_password: &str,
    ) -> Result<Option<Identity>, AppError> {
        let Some(account) = self.find_by_email(email).await? else {
            if let Some(dummy) = &self.dummy_hash {
                let _ = self.hasher.verify(raw_password, dummy);
            }
            debug!("credential check: no match");
            return Ok(None);
        };

        match self.hasher.verify(raw_password, &account.password_hash) {
            Ok(true) => Ok(Some(Identity::from(&account))),
            Ok(false) => {
                debug!("credential check: no match");
                Ok(None)
            }
            Err(e) => {
                error!(user_id = %account.id, error = ?e, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.store.list().await?)
    }

    /// Move `target` to `status`. Any status is reachable from any other.
    pub async fn set_status(
        &self,
        actor_role: Role,
        target: Uuid,
        status: Status,
    ) -> Result<Account, AppError> {
        if actor_role != Role::Admin {
            warn!(%target, %status, "status change refused for non-admin");
            return Err(AppError::Unauthorized);
        }

        let account = self
            .store
            .update_status(target, status)
            .await?
            .ok_or(AppError::NotFound)?;

        info!(user_id = %account.id, %status, "user status changed");
        Ok(account)
    }

    /// Create or reset the seeded admin account as admin + approved.
    pub async fn provision_admin(&self, seed: &AdminSeed) -> Result<Account, AppError> {
        let password_hash = self.hasher.hash(&seed.password)?;

        if let Some(account) = self.store.grant_admin(&seed.email, &password_hash).await? {
            info!(user_id = %account.id, email = %account.email, "existing account promoted to admin");
            return Ok(account);
        }

        let account = self
            .store
            .insert(NewAccount {
                name: Some(seed.name.clone()),
                email: seed.email.clone(),
                password_hash,
                role: Role::Admin,
                status: Status::Approved,
            })
            .await?;
        info!(user_id = %account.id, email = %account.email, "admin account created");
        Ok(account)
    }
}
