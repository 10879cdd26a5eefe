use sqlx::FromRow;

use crate::users::repo_types::User;

/// Conjunctive filters over listed users. Empty tag lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicUserFilter {
    /// Substring of an Offered skill name (`search_skill`).
    pub search_skill: Option<String>,
    /// Mandatory on the search endpoint (`q`), same matching rule.
    pub query: Option<String>,
    pub availability: Vec<String>,
    pub timeslot: Vec<String>,
    /// Require at least one verified Offered skill.
    pub verified_only: bool,
}

impl PublicUserFilter {
    pub fn matches_tags(&self, user: &User) -> bool {
        overlaps(&self.availability, &user.availability) && overlaps(&self.timeslot, &user.timeslot)
    }
}

fn overlaps(wanted: &[String], have: &[String]) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| have.contains(w))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
}
