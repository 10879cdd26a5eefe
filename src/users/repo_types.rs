use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const AVAILABILITY_TAGS: [&str; 9] = [
    "Weekdays", "Weekends", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
    "Sunday",
];

pub const TIMESLOT_TAGS: [&str; 4] = ["Morning", "Afternoon", "Evening", "Night"];

/// Optional social/portfolio links on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub youtube: Option<String>,
    pub facebook: Option<String>,
    pub x: Option<String>,
    pub github: Option<String>,
    pub personal_portfolio: Option<String>,
}

impl SocialLinks {
    pub fn entries(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("linkedin", self.linkedin.as_deref()),
            ("instagram", self.instagram.as_deref()),
            ("youtube", self.youtube.as_deref()),
            ("facebook", self.facebook.as_deref()),
            ("x", self.x.as_deref()),
            ("github", self.github.as_deref()),
            ("personal_portfolio", self.personal_portfolio.as_deref()),
        ]
    }

    /// Overlays the links present in `patch`.
    pub fn apply(&mut self, patch: SocialLinks) {
        let SocialLinks {
            linkedin,
            instagram,
            youtube,
            facebook,
            x,
            github,
            personal_portfolio,
        } = patch;
        if linkedin.is_some() {
            self.linkedin = linkedin;
        }
        if instagram.is_some() {
            self.instagram = instagram;
        }
        if youtube.is_some() {
            self.youtube = youtube;
        }
        if facebook.is_some() {
            self.facebook = facebook;
        }
        if x.is_some() {
            self.x = x;
        }
        if github.is_some() {
            self.github = github;
        }
        if personal_portfolio.is_some() {
            self.personal_portfolio = personal_portfolio;
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_photo_url: Option<String>,
    pub is_public: bool,
    pub availability: Vec<String>,
    pub timeslot: Vec<String>,
    #[sqlx(flatten)]
    pub socials: SocialLinks,
    pub is_active: bool,
    pub is_banned: bool,
    pub banned_reason: Option<String>,
    pub is_admin: bool,
    pub credits: i32,
    pub date_joined: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    /// Discoverable in listings and search.
    pub fn is_listed(&self) -> bool {
        self.is_public && self.is_active && !self.is_banned
    }
}

/// Profile fields supplied at registration.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_photo_url: Option<String>,
    pub is_public: bool,
    pub availability: Vec<String>,
    pub timeslot: Vec<String>,
    pub socials: SocialLinks,
    pub is_admin: bool,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_photo_url: Option<String>,
    pub is_public: Option<bool>,
    pub availability: Option<Vec<String>>,
    pub timeslot: Option<Vec<String>>,
    pub socials: SocialLinks,
}

/// Admin listing filters.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search_email: Option<String>,
    pub is_banned: Option<bool>,
}

/// Rows removed by a user deletion, plus proof objects to purge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub feedback: u64,
    pub swaps: u64,
    pub skills: u64,
    pub proof_keys: Vec<String>,
}
