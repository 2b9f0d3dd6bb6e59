use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::repo_types::{Identity, Role, Status};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// JWT payload; role and status are a snapshot taken at sign-in or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,            // account ID
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub status: Status,
    pub iat: usize,           // issued at (unix timestamp)
    pub exp: usize,           // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
        }
    }
}
