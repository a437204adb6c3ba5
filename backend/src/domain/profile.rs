//! Role-bearing profile attached to every account.
//!
//! Profiles serialise with the snake_case column names the dashboards read
//! (`roll_number`, `is_verified`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EmailAddress, UserId};

/// Portal role deciding which dashboard and permissions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Faculty,
    Admin,
}

/// Raised when a role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("role must be one of student, faculty, admin; got {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Lower-case wire and storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }

    /// Faculty and admins may read every submission.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Faculty | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// Stored profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    #[schema(value_type = String)]
    pub id: UserId,
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub email: Option<EmailAddress>,
    pub role: Role,
    pub department: Option<String>,
    pub roll_number: Option<String>,
    pub faculty_id: Option<String>,
    pub admin_id: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a profile about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Option<EmailAddress>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub faculty_id: Option<String>,
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

impl NewProfile {
    /// Keep only the identifier that matches the role and blank out empties.
    #[must_use]
    pub fn normalised(self) -> Self {
        let tidy = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };
        let keep_for = |role: Role, value: Option<String>| {
            if self.role == role { tidy(value) } else { None }
        };
        Self {
            name: tidy(self.name.clone()),
            email: self.email.clone(),
            role: self.role,
            department: tidy(self.department.clone()),
            roll_number: keep_for(Role::Student, self.roll_number.clone()),
            faculty_id: keep_for(Role::Faculty, self.faculty_id.clone()),
            admin_id: keep_for(Role::Admin, self.admin_id.clone()),
            is_verified: self.is_verified,
        }
    }

    /// Build the stored row for `id`, with both timestamps set to `now`.
    pub fn into_profile(self, id: UserId, now: DateTime<Utc>) -> Profile {
        Profile {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            department: self.department,
            roll_number: self.roll_number,
            faculty_id: self.faculty_id,
            admin_id: self.admin_id,
            is_verified: self.is_verified,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a profile row. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Option<EmailAddress>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub faculty_id: Option<String>,
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

impl ProfilePatch {
    /// Whether the patch touches fields only an admin may change.
    pub fn escalates_privilege(&self) -> bool {
        self.role.is_some() || self.is_verified.is_some()
    }

    /// Apply the patch to an existing profile.
    pub fn apply_to(&self, profile: &mut Profile, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(email) = &self.email {
            profile.email = Some(email.clone());
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(department) = &self.department {
            profile.department = Some(department.clone());
        }
        if let Some(roll_number) = &self.roll_number {
            profile.roll_number = Some(roll_number.clone());
        }
        if let Some(faculty_id) = &self.faculty_id {
            profile.faculty_id = Some(faculty_id.clone());
        }
        if let Some(admin_id) = &self.admin_id {
            profile.admin_id = Some(admin_id.clone());
        }
        if let Some(is_verified) = self.is_verified {
            profile.is_verified = is_verified;
        }
        profile.updated_at = now;
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("student", Role::Student)]
    #[case(" Faculty ", Role::Faculty)]
    #[case("ADMIN", Role::Admin)]
    fn parses_roles(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_roles() {
        assert!("dean".parse::<Role>().is_err());
    }

    #[rstest]
    #[case(Role::Student, false)]
    #[case(Role::Faculty, true)]
    #[case(Role::Admin, true)]
    fn staff_roles(#[case] role: Role, #[case] expected: bool) {
        assert_eq!(role.is_staff(), expected);
    }

    #[rstest]
    fn normalised_keeps_only_the_role_identifier() {
        let draft = NewProfile {
            name: Some("  Test Student ".to_owned()),
            role: Role::Student,
            department: Some("   ".to_owned()),
            roll_number: Some("b22cs999".to_owned()),
            faculty_id: Some("F-12".to_owned()),
            admin_id: Some("A-1".to_owned()),
            ..NewProfile::default()
        }
        .normalised();

        assert_eq!(draft.name.as_deref(), Some("Test Student"));
        assert_eq!(draft.department, None);
        assert_eq!(draft.roll_number.as_deref(), Some("b22cs999"));
        assert_eq!(draft.faculty_id, None);
        assert_eq!(draft.admin_id, None);
    }

    #[rstest]
    fn patch_detects_privileged_fields() {
        let harmless = ProfilePatch {
            department: Some("CS".to_owned()),
            ..ProfilePatch::default()
        };
        let promotion = ProfilePatch {
            role: Some(Role::Admin),
            ..ProfilePatch::default()
        };
        assert!(!harmless.escalates_privilege());
        assert!(promotion.escalates_privilege());
    }

    #[rstest]
    fn patch_rejects_unknown_columns() {
        let result: Result<ProfilePatch, _> =
            serde_json::from_value(serde_json::json!({"password": "x"}));
        assert!(result.is_err());
    }
}
