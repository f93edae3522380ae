//! PostgreSQL store

use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

use super::{SiteStore, TreeStore, UserStore, DUPLICATE_EMAIL};
use crate::auth::models::{normalize_email, Assignment, NewUser, ProfileUpdate, User};
use crate::error::{Error, Result};
use crate::inventory::{Coordinates, NewSite, NewTree, Site, Tree, TreeImage, TreeUpdate};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'user')),
    site_id UUID,
    gender TEXT NOT NULL DEFAULT 'other',
    designation TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_key ON users (lower(email));

CREATE TABLE IF NOT EXISTS sites (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    image TEXT,
    lat DOUBLE PRECISION NOT NULL,
    lng DOUBLE PRECISION NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    site_type TEXT,
    team_members UUID[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS trees (
    id UUID PRIMARY KEY,
    site_id UUID NOT NULL REFERENCES sites(id),
    planted_by UUID NOT NULL REFERENCES users(id),
    tree_name TEXT NOT NULL,
    lat DOUBLE PRECISION NOT NULL,
    lng DOUBLE PRECISION NOT NULL,
    date_planted TIMESTAMPTZ NOT NULL,
    status TEXT NOT NULL,
    remarks TEXT,
    verified BOOLEAN NOT NULL DEFAULT FALSE,
    images JSONB NOT NULL DEFAULT '[]',
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS trees_planted_by_idx ON trees (planted_by);
"#;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, site_id, gender, designation, created_at, updated_at";

const SITE_COLUMNS: &str =
    "id, name, address, image, lat, lng, status, site_type, team_members, created_at, updated_at";

const TREE_COLUMNS: &str = "id, site_id, planted_by, tree_name, lat, lng, date_planted, status, \
     remarks, verified, images, created_at, updated_at";

/// Store backed by one shared tokio-postgres client
#[derive(Clone)]
pub struct PgStore {
    client: Arc<Client>,
}

impl PgStore {
    /// Connect and spawn the connection driver
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create tables and indexes, including the unique email index
    pub async fn migrate(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}

fn parse_column<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse().map_err(Error::Internal)
}

fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_column(row.try_get::<_, &str>("role")?)?,
        site_id: row.try_get("site_id")?,
        gender: parse_column(row.try_get::<_, &str>("gender")?)?,
        designation: row.try_get("designation")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_site(row: &Row) -> Result<Site> {
    Ok(Site {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        image: row.try_get("image")?,
        coordinates: Coordinates {
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
        },
        status: parse_column(row.try_get::<_, &str>("status")?)?,
        site_type: row.try_get("site_type")?,
        team_members: row.try_get("team_members")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_tree(row: &Row) -> Result<Tree> {
    let images: Json<Vec<TreeImage>> = row.try_get("images")?;
    Ok(Tree {
        id: row.try_get("id")?,
        site_id: row.try_get("site_id")?,
        planted_by: row.try_get("planted_by")?,
        tree_name: row.try_get("tree_name")?,
        coordinates: Coordinates {
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
        },
        date_planted: row.try_get("date_planted")?,
        status: row.try_get("status")?,
        remarks: row.try_get("remarks")?,
        verified: row.try_get("verified")?,
        images: images.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn first<T>(rows: Vec<Row>, map: fn(&Row) -> Result<T>) -> Result<Option<T>> {
    rows.first().map(map).transpose()
}

fn all<T>(rows: Vec<Row>, map: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    rows.iter().map(map).collect()
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE lower(email) = $1", USER_COLUMNS);
        let rows = self
            .client
            .query(&query, &[&normalize_email(email)])
            .await?;
        first(rows, row_to_user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let rows = self.client.query(&query, &[&id]).await?;
        first(rows, row_to_user)
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        let result = self
            .client
            .execute(
                "INSERT INTO users (id, name, email, password_hash, role, site_id, gender, \
                 designation, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.password_hash,
                    &user.role.as_str(),
                    &user.site_id,
                    &user.gender.as_str(),
                    &user.designation,
                    &user.created_at,
                    &user.updated_at,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(Error::Conflict(DUPLICATE_EMAIL.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET name = COALESCE($2, name), gender = COALESCE($3, gender),
             designation = COALESCE($4, designation), updated_at = now()
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let rows = self
            .client
            .query(
                &query,
                &[
                    &id,
                    &update.name,
                    &update.gender.map(|g| g.as_str()),
                    &update.designation,
                ],
            )
            .await?;
        first(rows, row_to_user)
    }

    async fn update_assignment(&self, id: Uuid, assignment: &Assignment) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET role = COALESCE($2, role), site_id = COALESCE($3, site_id),
             updated_at = now()
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let rows = self
            .client
            .query(
                &query,
                &[&id, &assignment.role.map(|r| r.as_str()), &assignment.site_id],
            )
            .await?;
        first(rows, row_to_user)
    }

    async fn list(&self, site: Option<Uuid>) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE $1::UUID IS NULL OR site_id = $1 ORDER BY created_at",
            USER_COLUMNS
        );
        let rows = self.client.query(&query, &[&site]).await?;
        all(rows, row_to_user)
    }

    async fn count(&self) -> Result<u64> {
        let row = self.client.query_one("SELECT COUNT(*) FROM users", &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }
}

#[async_trait]
impl SiteStore for PgStore {
    async fn list(&self) -> Result<Vec<Site>> {
        let query = format!("SELECT {} FROM sites ORDER BY created_at", SITE_COLUMNS);
        let rows = self.client.query(&query, &[]).await?;
        all(rows, row_to_site)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>> {
        let query = format!("SELECT {} FROM sites WHERE id = $1", SITE_COLUMNS);
        let rows = self.client.query(&query, &[&id]).await?;
        first(rows, row_to_site)
    }

    async fn insert(&self, site: NewSite) -> Result<Site> {
        let site = site.into_site();
        self.client
            .execute(
                "INSERT INTO sites (id, name, address, image, lat, lng, status, site_type, \
                 team_members, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                &[
                    &site.id,
                    &site.name,
                    &site.address,
                    &site.image,
                    &site.coordinates.lat,
                    &site.coordinates.lng,
                    &site.status.to_string(),
                    &site.site_type,
                    &site.team_members,
                    &site.created_at,
                    &site.updated_at,
                ],
            )
            .await?;
        Ok(site)
    }

    async fn add_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>> {
        let query = format!(
            "UPDATE sites SET
                team_members = CASE WHEN $2 = ANY(team_members) THEN team_members
                                    ELSE array_append(team_members, $2) END,
                updated_at = now()
             WHERE id = $1 RETURNING {}",
            SITE_COLUMNS
        );
        let rows = self.client.query(&query, &[&site, &user]).await?;
        first(rows, row_to_site)
    }

    async fn remove_team_member(&self, site: Uuid, user: Uuid) -> Result<Option<Site>> {
        let query = format!(
            "UPDATE sites SET
                team_members = array_remove(team_members, $2),
                updated_at = CASE WHEN $2 = ANY(team_members) THEN now() ELSE updated_at END
             WHERE id = $1 RETURNING {}",
            SITE_COLUMNS
        );
        let rows = self.client.query(&query, &[&site, &user]).await?;
        first(rows, row_to_site)
    }

    async fn count(&self) -> Result<u64> {
        let row = self.client.query_one("SELECT COUNT(*) FROM sites", &[]).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }
}

#[async_trait]
impl TreeStore for PgStore {
    async fn insert(&self, tree: NewTree, planted_by: Uuid) -> Result<Tree> {
        let tree = tree.into_tree(planted_by);
        self.client
            .execute(
                "INSERT INTO trees (id, site_id, planted_by, tree_name, lat, lng, date_planted, \
                 status, remarks, verified, images, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                &[
                    &tree.id,
                    &tree.site_id,
                    &tree.planted_by,
                    &tree.tree_name,
                    &tree.coordinates.lat,
                    &tree.coordinates.lng,
                    &tree.date_planted,
                    &tree.status,
                    &tree.remarks,
                    &tree.verified,
                    &Json(&tree.images),
                    &tree.created_at,
                    &tree.updated_at,
                ],
            )
            .await?;
        Ok(tree)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tree>> {
        let query = format!("SELECT {} FROM trees WHERE id = $1", TREE_COLUMNS);
        let rows = self.client.query(&query, &[&id]).await?;
        first(rows, row_to_tree)
    }

    async fn list_by_planter(&self, user: Uuid) -> Result<Vec<Tree>> {
        let query = format!(
            "SELECT {} FROM trees WHERE planted_by = $1 ORDER BY created_at",
            TREE_COLUMNS
        );
        let rows = self.client.query(&query, &[&user]).await?;
        all(rows, row_to_tree)
    }

    async fn count_by_planter(&self, user: Uuid) -> Result<u64> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM trees WHERE planted_by = $1", &[&user])
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }

    async fn update(&self, id: Uuid, update: &TreeUpdate) -> Result<Option<Tree>> {
        let query = format!(
            "UPDATE trees SET
                tree_name = COALESCE($2, tree_name),
                lat = COALESCE($3, lat),
                lng = COALESCE($4, lng),
                status = COALESCE($5, status),
                remarks = COALESCE($6, remarks),
                images = images || $7::JSONB,
                updated_at = now()
             WHERE id = $1 RETURNING {}",
            TREE_COLUMNS
        );
        let tree_name = update.tree_name.as_ref().map(|n| n.trim().to_string());
        let rows = self
            .client
            .query(
                &query,
                &[
                    &id,
                    &tree_name,
                    &update.coordinates.map(|c| c.lat),
                    &update.coordinates.map(|c| c.lng),
                    &update.status,
                    &update.remarks,
                    &Json(&update.images),
                ],
            )
            .await?;
        first(rows, row_to_tree)
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Option<Tree>> {
        let query = format!(
            "UPDATE trees SET verified = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            TREE_COLUMNS
        );
        let rows = self.client.query(&query, &[&id, &verified]).await?;
        first(rows, row_to_tree)
    }
}
