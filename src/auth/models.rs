//! Identity models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Coarse permission tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages sites and team members
    Admin,
    /// Records and updates trees
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
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
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Stored identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub site_id: Option<Uuid>,
    pub gender: Gender,
    pub designation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// Identity about to be inserted; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub site_id: Option<Uuid>,
    pub gender: Gender,
    pub designation: Option<String>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            role: self.role,
            site_id: self.site_id,
            gender: self.gender,
            designation: self.designation,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Self-service profile changes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub designation: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.gender.is_none() && self.designation.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(gender) = self.gender {
            user.gender = gender;
        }
        if let Some(designation) = &self.designation {
            user.designation = Some(designation.clone());
        }
        user.updated_at = Utc::now();
    }
}

/// Administrative reassignment of role and site
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub role: Option<Role>,
    pub site_id: Option<Uuid>,
}

impl Assignment {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.site_id.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(site_id) = self.site_id {
            user.site_id = Some(site_id);
        }
        user.updated_at = Utc::now();
    }
}

/// Identity as sent to clients, without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub site_id: Option<Uuid>,
    pub gender: Gender,
    pub designation: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            site_id: user.site_id,
            gender: user.gender,
            designation: user.designation.clone(),
        }
    }
}

/// Emails are compared trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

/// Signin body
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by signup and signin
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub user: UserView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        NewUser {
            name: "Asha".to_string(),
            email: "  Asha@Example.COM ".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            role: Role::User,
            site_id: None,
            gender: Gender::Female,
            designation: Some("Ranger".to_string()),
        }
        .into_user()
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("viewer".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = sample_user();
        assert_eq!(user.email, "asha@example.com");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("$2b$10$secret"));

        let view = serde_json::to_value(user.view()).unwrap();
        assert!(view.get("passwordHash").is_none());
        assert_eq!(view["email"], "asha@example.com");
        assert_eq!(view["siteId"], serde_json::Value::Null);
    }

    #[test]
    fn test_profile_update() {
        let mut user = sample_user();
        assert!(ProfileUpdate::default().is_empty());

        let update = ProfileUpdate {
            designation: Some("Lead".to_string()),
            ..Default::default()
        };
        update.apply(&mut user);
        assert_eq!(user.designation.as_deref(), Some("Lead"));
        assert_eq!(user.name, "Asha");
    }

    #[test]
    fn test_assignment() {
        let mut user = sample_user();
        let site = Uuid::new_v4();
        Assignment {
            role: Some(Role::Admin),
            site_id: Some(site),
        }
        .apply(&mut user);
        assert!(user.is_admin());
        assert_eq!(user.site_id, Some(site));
    }
}
