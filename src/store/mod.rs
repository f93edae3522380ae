//! Persistence seams
//!
//! Handlers and the auth core only talk to these traits. Two backends exist:
//! [`MemoryStore`] for tests and throwaway servers, and [`PgStore`] on
//! tokio-postgres. Email uniqueness is the store's job in both: a duplicate
//! insert fails with [`Error::Conflict`](crate::error::Error::Conflict).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::models::{Assignment, NewUser, ProfileUpdate, User};
use crate::error::Result;
use crate::inventory::{NewSite, NewTree, Site, Tree, TreeUpdate};

/// Message used for every duplicate-email rejection
pub const DUPLICATE_EMAIL: &str = "Email already registered";

pub const SITE_NOT_FOUND: &str = "Site not found";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive lookup on the unique key
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert a new identity; a taken email is a `Conflict`
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>>;

    async fn update_assignment(&self, id: Uuid, assignment: &Assignment) -> Result<Option<User>>;

    /// All identities, or those assigned to `site`
    async fn list(&self, site: Option<Uuid>) -> Result<Vec<User>>;

    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Site>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>>;

    async fn insert(&self, site: NewSite) -> Result<Site>;

    /// Add `user` to the site's team; no-op if already a member
    async fn add_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>>;

    /// Drop `user` from the site's team; no-op if not a member
    async fn remove_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>>;

    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert(&self, tree: NewTree, planted_by: Uuid) -> Result<Tree>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tree>>;

    async fn list_by_planter(&self, user: Uuid) -> Result<Vec<Tree>>;

    async fn count_by_planter(&self, user: Uuid) -> Result<u64>;

    async fn update(&self, id: Uuid, update: &TreeUpdate) -> Result<Option<Tree>>;

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Option<Tree>>;
}

/// One handle per record kind, possibly backed by the same store
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sites: Arc<dyn SiteStore>,
    pub trees: Arc<dyn TreeStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn postgres(store: PgStore) -> Self {
        Self::from_backend(Arc::new(store))
    }

    fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: UserStore + SiteStore + TreeStore + 'static,
    {
        Self {
            users: store.clone(),
            sites: store.clone(),
            trees: store,
        }
    }
}
