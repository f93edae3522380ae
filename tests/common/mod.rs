//! Shared helpers for the router tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use grovekeeper::api::{create_router, AppState};
use grovekeeper::auth::models::{Gender, Role};
use grovekeeper::auth::Registration;
use grovekeeper::config::{Config, SignupPolicy, StoreBackend};
use grovekeeper::store::Stores;

pub const PASSWORD: &str = "correct-horse";

pub fn test_config(signup: SignupPolicy) -> Config {
    let mut config = Config::default();
    config.database.backend = StoreBackend::Memory;
    config.auth.access_secret = "test-access-secret".to_string();
    config.auth.refresh_secret = "test-refresh-secret".to_string();
    config.auth.bcrypt_cost = 4;
    config.auth.signup = signup;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(SignupPolicy::Open))
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(&config, Stores::memory()).expect("valid test config");
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(request(Method::GET, uri, None, token)).await
    }

    pub async fn post(
        &self,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> (StatusCode, HeaderMap, Value) {
        self.send(request(Method::POST, uri, Some(body), token)).await
    }

    /// Sign up through the API and return the access token
    pub async fn signup(&self, name: &str, email: &str) -> String {
        let (status, _, body) = self
            .post(
                "/auth/signup",
                serde_json::json!({ "name": name, "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["access"].as_str().unwrap().to_string()
    }

    /// Insert an admin directly and sign in through the API
    pub async fn admin_token(&self, email: &str) -> String {
        self.state
            .auth
            .register(Registration {
                name: "Site Admin".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                role: Role::Admin,
                site_id: None,
                gender: Gender::Other,
                designation: None,
            })
            .await
            .unwrap();

        let (status, _, body) = self
            .post(
                "/auth/signin",
                serde_json::json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access"].as_str().unwrap().to_string()
    }
}

pub fn request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
