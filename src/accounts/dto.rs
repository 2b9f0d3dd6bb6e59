use serde::{Deserialize, Serialize};

use crate::accounts::repo_types::{Account, Identity, Role, Status};

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusNotice {
    pub level: &'static str,
    pub title: &'static str,
    pub message: &'static str,
}

/// What the dashboard shows for the signed-in account.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: Identity,
    pub notice: Option<StatusNotice>,
    pub notes_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Account>>,
}

pub fn notice_for(status: Status) -> Option<StatusNotice> {
    match status {
        Status::Pending => Some(StatusNotice {
            level: "warning",
            title: "Account Pending Approval",
            message: "Your account is currently under review by an administrator. \
                      You will receive full access once approved.",
        }),
        Status::Rejected => Some(StatusNotice {
            level: "error",
            title: "Account Rejected",
            message: "Your account has been rejected. Please contact support.",
        }),
        Status::Approved => None,
    }
}

impl DashboardView {
    /// `users` is only kept for admins.
    pub fn for_account(account: &Account, users: Option<Vec<Account>>) -> Self {
        Self {
            user: Identity::from(account),
            notice: notice_for(account.status),
            notes_enabled: account.status == Status::Approved,
            users: users.filter(|_| account.role == Role::Admin),
        }
    }
}
