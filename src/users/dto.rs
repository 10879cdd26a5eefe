use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::repo_types::{ProfilePatch, SocialLinks, User, AVAILABILITY_TAGS, TIMESLOT_TAGS};
use crate::skills::{dto::SkillView, repo_types::ProofFileType};

fn known_tags(tags: &[String], allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    match tags.iter().find(|t| !allowed.contains(&t.as_str())) {
        None => Ok(()),
        Some(bad) => {
            let mut err = ValidationError::new(code);
            err.message = Some(format!("\"{bad}\" is not a valid choice").into());
            Err(err)
        }
    }
}

fn validate_availability(tags: &[String]) -> Result<(), ValidationError> {
    known_tags(tags, &AVAILABILITY_TAGS, "availability")
}

fn validate_timeslot(tags: &[String]) -> Result<(), ValidationError> {
    known_tags(tags, &TIMESLOT_TAGS, "timeslot")
}

/// Editable profile fields. Used by registration and `PUT /users/me`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(max = 255, message = "name is too long"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "location is too long"))]
    pub location: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub profile_photo_url: Option<String>,
    pub is_public: Option<bool>,
    #[validate(custom(function = "validate_availability"))]
    pub availability: Option<Vec<String>>,
    #[validate(custom(function = "validate_timeslot"))]
    pub timeslot: Option<Vec<String>>,
    #[validate(url(message = "enter a valid URL"))]
    pub linkedin: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub instagram: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub youtube: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub facebook: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub x: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub github: Option<String>,
    #[validate(url(message = "enter a valid URL"))]
    pub personal_portfolio: Option<String>,
}

impl ProfileInput {
    pub fn into_patch(self) -> ProfilePatch {
        ProfilePatch {
            name: self.name,
            location: self.location,
            profile_photo_url: self.profile_photo_url,
            is_public: self.is_public,
            availability: self.availability,
            timeslot: self.timeslot,
            socials: SocialLinks {
                linkedin: self.linkedin,
                instagram: self.instagram,
                youtube: self.youtube,
                facebook: self.facebook,
                x: self.x,
                github: self.github,
                personal_portfolio: self.personal_portfolio,
            },
        }
    }
}

/// Full profile, shown to its owner and embedded in swap/feedback views.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_photo_url: Option<String>,
    pub is_public: bool,
    pub availability: Vec<String>,
    pub timeslot: Vec<String>,
    #[serde(flatten)]
    pub socials: SocialLinks,
    pub credits: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub date_joined: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<&User> for ProfileView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            location: u.location.clone(),
            profile_photo_url: u.profile_photo_url.clone(),
            is_public: u.is_public,
            availability: u.availability.clone(),
            timeslot: u.timeslot.clone(),
            socials: u.socials.clone(),
            credits: u.credits,
            date_joined: u.date_joined,
            last_login: u.last_login,
        }
    }
}

/// Listing/search entry: no email, plus verified Offered skills and rating.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfileView {
    pub id: Uuid,
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_photo_url: Option<String>,
    pub availability: Vec<String>,
    pub timeslot: Vec<String>,
    #[serde(flatten)]
    pub socials: SocialLinks,
    pub skills: Vec<SkillView>,
    pub average_rating: f64,
}

impl PublicProfileView {
    pub fn new(u: &User, skills: Vec<SkillView>, average_rating: f64) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            location: u.location.clone(),
            profile_photo_url: u.profile_photo_url.clone(),
            availability: u.availability.clone(),
            timeslot: u.timeslot.clone(),
            socials: u.socials.clone(),
            skills,
            average_rating,
        }
    }
}

/// `GET /users/{id}` answers with either shape.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserProfileResponse {
    Own(ProfileView),
    Public(PublicProfileView),
}

#[derive(Debug, Serialize)]
pub struct SkillProofView {
    pub skill_id: Uuid,
    pub skill_name: String,
    pub proof_file_url: Option<String>,
    pub proof_file_type: Option<ProofFileType>,
    pub proof_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_tags_and_bad_urls() {
        let input = ProfileInput {
            availability: Some(vec!["Weekends".into(), "Someday".into()]),
            github: Some("not a url".into()),
            ..ProfileInput::default()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("availability"));
        assert!(fields.contains_key("github"));
        assert!(!fields.contains_key("timeslot"));
    }

    #[test]
    fn accepts_known_values() {
        let input = ProfileInput {
            availability: Some(vec!["Weekdays".into(), "Sunday".into()]),
            timeslot: Some(vec!["Evening".into()]),
            linkedin: Some("https://linkedin.com/in/someone".into()),
            ..ProfileInput::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn into_patch_groups_socials() {
        let input = ProfileInput {
            x: Some("https://x.com/a".into()),
            ..ProfileInput::default()
        };
        let patch = input.into_patch();
        assert_eq!(patch.socials.x.as_deref(), Some("https://x.com/a"));
        assert!(patch.name.is_none());
    }
}
