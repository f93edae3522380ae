//! Credential issuance: signup, signin and the current identity

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::{TokenPair, TokenService};
use crate::auth::middleware::AuthUser;
use crate::auth::models::{
    normalize_email, AuthResponse, Gender, NewUser, Role, SigninRequest, SignupRequest, User,
};
use crate::auth::password::PasswordHasher;
use crate::auth::validation::{validate_signin, validate_signup};
use crate::error::{Error, Result};
use crate::store::{SiteStore, UserStore, DUPLICATE_EMAIL, SITE_NOT_FOUND};

/// Same message for unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// A freshly authenticated identity and its tokens
#[derive(Debug, Clone)]
pub struct Issued {
    pub user: User,
    pub tokens: TokenPair,
}

impl Issued {
    /// Body for the client; the refresh token travels only in the cookie
    pub fn response(&self) -> AuthResponse {
        AuthResponse {
            access: self.tokens.access.clone(),
            user: self.user.view(),
        }
    }
}

/// Validated data for a new identity
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub site_id: Option<Uuid>,
    pub gender: Gender,
    pub designation: Option<String>,
}

/// Creates identities and keeps site team membership in step with them
#[derive(Clone)]
pub struct Registrar {
    users: Arc<dyn UserStore>,
    sites: Arc<dyn SiteStore>,
    hasher: PasswordHasher,
}

impl Registrar {
    pub fn new(
        users: Arc<dyn UserStore>,
        sites: Arc<dyn SiteStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            sites,
            hasher,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Hash the password and store a new identity. A named site must exist,
    /// and the new identity joins its team.
    /// The email pre-check gives the common case a clear answer; the store's
    /// unique constraint settles concurrent inserts.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        if let Some(site_id) = registration.site_id {
            if self.sites.find_by_id(site_id).await?.is_none() {
                return Err(Error::not_found(SITE_NOT_FOUND));
            }
        }

        let email = normalize_email(&registration.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = self.hasher.hash_async(registration.password).await?;
        let user = self
            .users
            .insert(NewUser {
                name: registration.name,
                email,
                password_hash,
                role: registration.role,
                site_id: registration.site_id,
                gender: registration.gender,
                designation: registration.designation,
            })
            .await?;

        if let Some(site_id) = user.site_id {
            self.sites.add_team_member(site_id, user.id).await?;
        }

        tracing::info!(user_id = %user.id, role = %user.role, "Created identity");
        Ok(user)
    }
}

/// Issues credentials against a user store
#[derive(Clone)]
pub struct AuthService {
    registrar: Registrar,
    tokens: Arc<TokenService>,
    default_role: Role,
}

impl AuthService {
    pub fn new(registrar: Registrar, tokens: Arc<TokenService>, default_role: Role) -> Self {
        Self {
            registrar,
            tokens,
            default_role,
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        self.registrar.users()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn default_role(&self) -> Role {
        self.default_role
    }

    pub async fn register(&self, registration: Registration) -> Result<User> {
        self.registrar.register(registration).await
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<Issued> {
        let valid = validate_signup(req)?;
        let user = self
            .register(Registration {
                name: valid.name,
                email: valid.email,
                password: valid.password,
                role: self.default_role,
                site_id: valid.site_id,
                gender: valid.gender,
                designation: valid.designation,
            })
            .await?;

        let tokens = self.tokens.issue_pair(&user)?;
        Ok(Issued { user, tokens })
    }

    pub async fn signin(&self, req: SigninRequest) -> Result<Issued> {
        let (email, password) = validate_signin(req)?;

        let Some(user) = self.users().find_by_email(&email).await? else {
            tracing::warn!("Failed signin: unknown email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let valid = self
            .registrar
            .hasher
            .verify_async(password, user.password_hash.clone())
            .await?;
        if !valid {
            tracing::warn!(user_id = %user.id, "Failed signin: wrong password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let tokens = self.tokens.issue_pair(&user)?;
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(Issued { user, tokens })
    }

    /// Load the identity attached by the authentication middleware
    pub async fn current_user(&self, identity: &AuthUser) -> Result<User> {
        self.users()
            .find_by_id(identity.id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenKind, TokenSigner};
    use crate::inventory::{Coordinates, NewSite};
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn service_with(store: Arc<MemoryStore>, default_role: Role) -> AuthService {
        let tokens = TokenService::new(
            TokenSigner::new("access", Duration::minutes(15)),
            TokenSigner::new("refresh", Duration::days(7)),
        );
        let registrar = Registrar::new(store.clone(), store, PasswordHasher::new(4));
        AuthService::new(registrar, Arc::new(tokens), default_role)
    }

    fn service(default_role: Role) -> AuthService {
        service_with(Arc::new(MemoryStore::new()), default_role)
    }

    fn signup_req(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            site_id: None,
            gender: None,
            designation: None,
        }
    }

    #[tokio::test]
    async fn test_signup_issues_tokens_with_default_role() {
        let service = service(Role::User);
        let issued = service.signup(signup_req("a@b.com", "secret")).await.unwrap();

        assert_eq!(issued.user.role, Role::User);
        assert_ne!(issued.user.password_hash, "secret");

        let claims = service
            .tokens()
            .verify(TokenKind::Access, &issued.tokens.access)
            .unwrap();
        assert_eq!(claims.sub, issued.user.id.to_string());
        assert!(service
            .tokens()
            .verify(TokenKind::Refresh, &issued.tokens.refresh)
            .is_ok());
    }

    #[tokio::test]
    async fn test_default_role_is_configurable() {
        let service = service(Role::Admin);
        let issued = service.signup(signup_req("a@b.com", "secret")).await.unwrap();
        assert_eq!(issued.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let service = service(Role::User);
        service.signup(signup_req("a@b.com", "secret")).await.unwrap();

        let err = service
            .signup(signup_req("A@B.com", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(service.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signin_same_message_for_unknown_and_wrong() {
        let service = service(Role::User);
        service.signup(signup_req("a@b.com", "correct")).await.unwrap();

        let wrong = service
            .signin(SigninRequest {
                email: "a@b.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .signin(SigninRequest {
                email: "nobody@b.com".to_string(),
                password: "correct".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);

        let ok = service
            .signin(SigninRequest {
                email: "A@b.com".to_string(),
                password: "correct".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_signup_with_unknown_site_is_not_found() {
        let service = service(Role::User);
        let mut req = signup_req("a@b.com", "secret");
        req.site_id = Some(Uuid::new_v4().to_string());

        let err = service.signup(req).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == SITE_NOT_FOUND));
        assert_eq!(service.users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signup_joins_site_team() {
        let store = Arc::new(MemoryStore::new());
        let site = SiteStore::insert(
            store.as_ref(),
            NewSite {
                name: "Lake Shore".to_string(),
                address: "Lake Road".to_string(),
                image: None,
                coordinates: Coordinates { lat: 12.9, lng: 77.6 },
                status: Default::default(),
                site_type: None,
            },
        )
        .await
        .unwrap();
        let service = service_with(store.clone(), Role::User);

        let mut req = signup_req("a@b.com", "secret");
        req.site_id = Some(site.id.to_string());
        let issued = service.signup(req).await.unwrap();

        assert_eq!(issued.user.site_id, Some(site.id));
        let site = SiteStore::find_by_id(store.as_ref(), site.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(site.team_members, vec![issued.user.id]);
    }

    #[tokio::test]
    async fn test_current_user_missing() {
        let service = service(Role::User);
        let ghost = AuthUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        let err = service.current_user(&ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_response_omits_refresh_token() {
        let user = NewUser {
            name: "Asha".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            site_id: None,
            gender: Gender::Other,
            designation: None,
        }
        .into_user();
        let issued = Issued {
            user,
            tokens: TokenPair {
                access: "access-token".to_string(),
                refresh: "refresh-token".to_string(),
            },
        };
        let body = serde_json::to_string(&issued.response()).unwrap();
        assert!(body.contains("access-token"));
        assert!(!body.contains("refresh-token"));
        assert!(!body.contains("hash"));
    }
}
