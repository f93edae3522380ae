//! Request shape checks for the issuance endpoints

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::auth::models::{normalize_email, Gender, SigninRequest, SignupRequest};
use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::error::{Error, Result};

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Generic message for every shape violation
pub const INVALID_DATA: &str = "Invalid data";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// At least [`MIN_PASSWORD_LEN`] characters and no more bytes than bcrypt reads
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN && password.len() <= MAX_PASSWORD_BYTES
}

/// Signup input after validation
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub site_id: Option<Uuid>,
    pub gender: Gender,
    pub designation: Option<String>,
}

fn invalid(field: &str) -> Error {
    tracing::debug!(field, "rejecting request body");
    Error::bad_request(INVALID_DATA)
}

pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup> {
    let name = req.name.trim().to_string();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(invalid("name"));
    }
    if !is_valid_email(&req.email) {
        return Err(invalid("email"));
    }
    if !is_valid_password(&req.password) {
        return Err(invalid("password"));
    }

    let site_id = match req.site_id.as_deref() {
        None => None,
        Some(raw) => Some(Uuid::parse_str(raw.trim()).map_err(|_| invalid("siteId"))?),
    };
    let gender = match req.gender.as_deref() {
        None => Gender::default(),
        Some(raw) => raw.parse().map_err(|_| invalid("gender"))?,
    };
    let designation = match req.designation {
        Some(d) if d.trim().is_empty() => return Err(invalid("designation")),
        other => other.map(|d| d.trim().to_string()),
    };

    Ok(ValidSignup {
        name,
        email: normalize_email(&req.email),
        password: req.password,
        site_id,
        gender,
        designation,
    })
}

/// Returns the normalized email and the password
pub fn validate_signin(req: SigninRequest) -> Result<(String, String)> {
    if !is_valid_email(&req.email) {
        return Err(invalid("email"));
    }
    if req.password.is_empty() {
        return Err(invalid("password"));
    }
    Ok((normalize_email(&req.email), req.password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            site_id: None,
            gender: None,
            designation: None,
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@b.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_valid_signup_defaults() {
        let valid = validate_signup(signup("Asha", "Asha@Example.com", "secret")).unwrap();
        assert_eq!(valid.email, "asha@example.com");
        assert_eq!(valid.gender, Gender::Other);
        assert!(valid.site_id.is_none());
    }

    #[test]
    fn test_password_minimum() {
        let err = validate_signup(signup("Asha", "a@b.com", "abcde")).unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m == INVALID_DATA));
        assert!(validate_signup(signup("Asha", "a@b.com", "abcdef")).is_ok());
    }

    #[test]
    fn test_password_byte_limit() {
        let at_limit = "x".repeat(MAX_PASSWORD_BYTES);
        assert!(validate_signup(signup("Asha", "a@b.com", &at_limit)).is_ok());

        let over = "x".repeat(MAX_PASSWORD_BYTES + 1);
        let err = validate_signup(signup("Asha", "a@b.com", &over)).unwrap_err();
        assert!(matches!(err, Error::BadRequest(ref m) if m == INVALID_DATA));

        // The limit counts bytes, not characters
        assert!(is_valid_password(&"é".repeat(35)));
        assert!(!is_valid_password(&"€".repeat(24)));
    }

    #[test]
    fn test_name_minimum() {
        assert!(validate_signup(signup("Al", "a@b.com", "secret")).is_err());
        assert!(validate_signup(signup("  Al  ", "a@b.com", "secret")).is_err());
    }

    #[test]
    fn test_optional_fields() {
        let mut req = signup("Asha", "a@b.com", "secret");
        req.site_id = Some("not-a-uuid".to_string());
        assert!(validate_signup(req).is_err());

        let mut req = signup("Asha", "a@b.com", "secret");
        req.gender = Some("robot".to_string());
        assert!(validate_signup(req).is_err());

        let mut req = signup("Asha", "a@b.com", "secret");
        req.designation = Some("   ".to_string());
        assert!(validate_signup(req).is_err());

        let site = Uuid::new_v4();
        let mut req = signup("Asha", "a@b.com", "secret");
        req.site_id = Some(site.to_string());
        req.gender = Some("female".to_string());
        req.designation = Some("Ranger".to_string());
        let valid = validate_signup(req).unwrap();
        assert_eq!(valid.site_id, Some(site));
        assert_eq!(valid.gender, Gender::Female);
    }

    #[test]
    fn test_signin_shape() {
        let ok = validate_signin(SigninRequest {
            email: "A@B.com".to_string(),
            password: "x".to_string(),
        })
        .unwrap();
        assert_eq!(ok.0, "a@b.com");

        assert!(validate_signin(SigninRequest {
            email: "a@b.com".to_string(),
            password: String::new(),
        })
        .is_err());
    }
}
