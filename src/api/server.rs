//! HTTP API server

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{
    require_admin, require_auth, AuthService, CookieSettings, PasswordHasher, Registrar,
    TokenService,
};
use crate::config::{Config, SignupPolicy, StoreBackend};
use crate::error::Result;
use crate::store::{PgStore, SiteStore, Stores, TreeStore};

use super::{admin, member, routes};

/// Application state shared across handlers, immutable after startup
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub sites: Arc<dyn SiteStore>,
    pub trees: Arc<dyn TreeStore>,
    pub cookies: CookieSettings,
    pub signup: SignupPolicy,
}

impl AppState {
    /// Build state from validated config. Fails if the auth settings are unusable.
    pub fn new(config: &Config, stores: Stores) -> Result<Self> {
        let tokens = TokenService::from_config(&config.auth)?;
        let registrar = Registrar::new(
            stores.users,
            stores.sites.clone(),
            PasswordHasher::new(config.auth.bcrypt_cost),
        );
        let auth = AuthService::new(registrar, Arc::new(tokens), config.auth.default_role);

        Ok(Self {
            auth,
            sites: stores.sites,
            trees: stores.trees,
            cookies: CookieSettings::new(config.is_production(), config.auth.refresh_ttl_secs),
            signup: config.auth.signup,
        })
    }
}

/// Open the store selected by the config
pub async fn open_stores(config: &Config) -> Result<Stores> {
    match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Ok(Stores::memory())
        }
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database.url).await?;
            store.migrate().await?;
            Ok(Stores::postgres(store))
        }
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    config.auth.validate()?;
    let stores = open_stores(&config).await?;
    let state = AppState::new(&config, stores)?;

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        environment = ?config.server.environment,
        signup = ?config.auth.signup,
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let signup = Router::new().route("/auth/signup", post(routes::signup));
    let signup = match state.signup {
        SignupPolicy::Open => signup,
        // Layers run last-added first: authenticate, then gate
        SignupPolicy::Admin => signup
            .route_layer(middleware::from_fn(require_admin))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
    };

    let authenticated = Router::new()
        .route("/auth/me", get(routes::me))
        .route("/user/dashboard", get(member::dashboard))
        .route(
            "/user/profile",
            get(member::profile).put(member::update_profile),
        )
        .route("/user/site/dashboard", get(member::list_trees))
        .route("/user/site/dashboard/add", post(member::add_tree))
        .route(
            "/user/site/dashboard/{tree_id}",
            get(member::get_tree).put(member::update_tree),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/sites", get(admin::list_sites))
        .route("/admin/sites/add", post(admin::add_site))
        .route("/admin/site/team", get(admin::list_team))
        .route("/admin/site/team/add", post(admin::add_team_member))
        .route("/admin/users/{id}", patch(admin::assign_user))
        .route("/admin/verify/{tree_id}", patch(admin::verify_tree))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(routes::health))
        .route("/auth/signin", post(routes::signin))
        .merge(signup)
        .merge(authenticated)
        .merge(admin)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
