//! In-memory store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SiteStore, TreeStore, UserStore, DUPLICATE_EMAIL};
use crate::auth::models::{normalize_email, Assignment, NewUser, ProfileUpdate, User};
use crate::error::{Error, Result};
use crate::inventory::{NewSite, NewTree, Site, Tree, TreeUpdate};

/// Process-local storage for all record kinds
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    sites: RwLock<HashMap<Uuid, Site>>,
    trees: RwLock<HashMap<Uuid, Tree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        // Check and insert under one write lock
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    async fn update_assignment(&self, id: Uuid, assignment: &Assignment) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            assignment.apply(user);
            user.clone()
        }))
    }

    async fn list(&self, site: Option<Uuid>) -> Result<Vec<User>> {
        let users = self
            .users
            .read()
            .await
            .values()
            .filter(|u| site.is_none() || u.site_id == site)
            .cloned()
            .collect();
        Ok(sorted_by_creation(users, |u: &User| u.created_at))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Site>> {
        let sites = self.sites.read().await.values().cloned().collect();
        Ok(sorted_by_creation(sites, |s: &Site| s.created_at))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>> {
        Ok(self.sites.read().await.get(&id).cloned())
    }

    async fn insert(&self, site: NewSite) -> Result<Site> {
        let site = site.into_site();
        self.sites.write().await.insert(site.id, site.clone());
        Ok(site)
    }

    async fn add_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>> {
        let mut sites = self.sites.write().await;
        Ok(sites.get_mut(&site).map(|site| {
            if !site.team_members.contains(&user) {
                site.team_members.push(user);
                site.updated_at = Utc::now();
            }
            site.clone()
        }))
    }

    async fn remove_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>> {
        let mut sites = self.sites.write().await;
        Ok(sites.get_mut(&site).map(|site| {
            if site.team_members.contains(&user) {
                site.team_members.retain(|member| *member != user);
                site.updated_at = Utc::now();
            }
            site.clone()
        }))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.sites.read().await.len() as u64)
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn insert(&self, tree: NewTree, planted_by: Uuid) -> Result<Tree> {
        let tree = tree.into_tree(planted_by);
        self.trees.write().await.insert(tree.id, tree.clone());
        Ok(tree)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tree>> {
        Ok(self.trees.read().await.get(&id).cloned())
    }

    async fn list_by_planter(&self, user: Uuid) -> Result<Vec<Tree>> {
        let trees = self
            .trees
            .read()
            .await
            .values()
            .filter(|t| t.planted_by == user)
            .cloned()
            .collect();
        Ok(sorted_by_creation(trees, |t: &Tree| t.created_at))
    }

    async fn count_by_planter(&self, user: Uuid) -> Result<u64> {
        Ok(self
            .trees
            .read()
            .await
            .values()
            .filter(|t| t.planted_by == user)
            .count() as u64)
    }

    async fn update(&self, id: Uuid, update: &TreeUpdate) -> Result<Option<Tree>> {
        let mut trees = self.trees.write().await;
        Ok(trees.get_mut(&id).map(|tree| {
            update.apply(tree);
            tree.clone()
        }))
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Option<Tree>> {
        let mut trees = self.trees.write().await;
        Ok(trees.get_mut(&id).map(|tree| {
            tree.verified = verified;
            tree.updated_at = Utc::now();
            tree.clone()
        }))
    }
}
