use serde::Serialize;
use validator::Validate;

use super::repo_types::PublicUserFilter;
use crate::{
    error::AppError,
    pagination::{PageRequest, DEFAULT_LIMIT},
    skills::repo_types::SkillPopularity,
};

/// Query string of the public listing and search endpoints.
///
/// Parsed by hand because `availability` and `timeslot` may repeat.
#[derive(Debug, Default, PartialEq)]
pub struct DiscoveryQuery {
    pub page: PageRequest,
    pub filter: PublicUserFilter,
    /// `q`, only meaningful for search.
    pub q: Option<String>,
}

fn parse_int(field: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::field(field, format!("{field} must be an integer")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl DiscoveryQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let mut out = DiscoveryQuery::default();
        let mut page = 1;
        let mut limit = DEFAULT_LIMIT;

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "page" => page = parse_int("page", &value)?,
                "limit" => limit = parse_int("limit", &value)?,
                "search_skill" => out.filter.search_skill = non_empty(value.into_owned()),
                "q" => out.q = Some(value.into_owned()),
                "availability" => out.filter.availability.extend(non_empty(value.into_owned())),
                "timeslot" => out.filter.timeslot.extend(non_empty(value.into_owned())),
                "verified_only" => {
                    out.filter.verified_only = matches!(value.trim().to_lowercase().as_str(), "true" | "1")
                }
                _ => {}
            }
        }

        out.page = PageRequest::new(page, limit);
        out.page.validate()?;
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub credits: i32,
    pub average_rating: f64,
    pub completed_swaps: i64,
    pub pending_requests: i64,
}

#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_swaps: i64,
    pub completed_swaps: i64,
    pub skill_popularity: Vec<SkillPopularity>,
    pub total_feedback: i64,
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_tags_and_flags() {
        let q = DiscoveryQuery::parse(Some(
            "availability=Weekends&availability=Monday&timeslot=Evening&verified_only=TRUE&search_skill=+gui+&page=2",
        ))
        .unwrap();
        assert_eq!(q.filter.availability, vec!["Weekends", "Monday"]);
        assert_eq!(q.filter.timeslot, vec!["Evening"]);
        assert!(q.filter.verified_only);
        assert_eq!(q.filter.search_skill.as_deref(), Some("gui"));
        assert_eq!(q.page, PageRequest::new(2, DEFAULT_LIMIT));
        assert!(q.q.is_none());
    }

    #[test]
    fn defaults_without_query() {
        let q = DiscoveryQuery::parse(None).unwrap();
        assert_eq!(q, DiscoveryQuery::default());
        assert!(!DiscoveryQuery::parse(Some("verified_only=yes")).unwrap().filter.verified_only);
    }

    #[test]
    fn bad_paging_is_a_validation_error() {
        for raw in ["page=0", "limit=101", "page=abc", "limit=0"] {
            let err = DiscoveryQuery::parse(Some(raw)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{raw}");
        }
    }
}
