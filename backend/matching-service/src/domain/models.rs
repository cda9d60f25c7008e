use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Profile gender, also used in match preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// Public profile fields of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub course: Option<String>,
    pub branch: Option<String>,
    pub college: Option<String>,
    pub interests: Vec<String>,
    pub bio: Option<String>,
    pub photos: Vec<String>,
}

/// Inclusive age bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: i32,
    pub max: i32,
}

impl AgeRange {
    pub fn contains(&self, age: i32) -> bool {
        age >= self.min && age <= self.max
    }
}

/// Who a user wants to be shown. An empty gender list accepts everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPreferences {
    pub genders: Vec<Gender>,
    pub age_range: Option<AgeRange>,
}

/// Read-only projection of a user owned by the user-management service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub profile: UserProfile,
    pub preferences: MatchPreferences,
    pub blocked_user_ids: Vec<Uuid>,
    pub email_verified: bool,
    pub is_active: bool,
    pub is_banned: bool,
}

impl User {
    /// Verified, active and not banned
    pub fn is_discoverable(&self) -> bool {
        self.email_verified && self.is_active && !self.is_banned
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            profile: self.profile.clone(),
        }
    }
}

/// What other users get to see
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub profile: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trip() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("Female".parse::<Gender>().is_err());
    }

    #[test]
    fn test_age_range_is_inclusive() {
        let range = AgeRange { min: 18, max: 22 };
        assert!(range.contains(18));
        assert!(range.contains(22));
        assert!(!range.contains(23));
    }
}
