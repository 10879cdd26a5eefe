use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    skills::dto::not_blank,
    users::{
        dto::ProfileView,
        repo_types::{User, UserFilter},
    },
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUserQuery {
    pub search_email: Option<String>,
    pub is_banned: Option<bool>,
}

impl From<AdminUserQuery> for UserFilter {
    fn from(q: AdminUserQuery) -> Self {
        Self {
            search_email: q.search_email.filter(|s| !s.trim().is_empty()),
            is_banned: q.is_banned,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BanRequest {
    #[validate(
        length(min = 1, max = 500, message = "banned reason must be 1-500 characters"),
        custom(function = "not_blank")
    )]
    pub banned_reason: String,
}

/// Full profile plus moderation flags.
#[derive(Debug, Serialize)]
pub struct AdminUserView {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub is_active: bool,
    pub is_banned: bool,
    pub banned_reason: Option<String>,
    pub is_admin: bool,
}

impl From<&User> for AdminUserView {
    fn from(u: &User) -> Self {
        Self {
            profile: u.into(),
            is_active: u.is_active,
            is_banned: u.is_banned,
            banned_reason: u.banned_reason.clone(),
            is_admin: u.is_admin,
        }
    }
}
