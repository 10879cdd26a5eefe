//! Persistence seam. Each domain module declares a repository trait and
//! implements it for [`PgStore`]; services only see `dyn Store`.

#[cfg(test)]
pub mod memory;

use sqlx::PgPool;

use crate::{
    discovery::repo::DiscoveryRepo, feedback::repo::FeedbackRepo, messages::repo::MessageRepo,
    skills::repo::SkillRepo, swaps::repo::SwapRepo, users::repo::UserRepo,
};

pub trait Store:
    UserRepo + SkillRepo + SwapRepo + FeedbackRepo + MessageRepo + DiscoveryRepo
{
}

impl<T> Store for T where
    T: UserRepo + SkillRepo + SwapRepo + FeedbackRepo + MessageRepo + DiscoveryRepo
{
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters and wraps the needle for a substring match.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
