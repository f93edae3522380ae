//! Admin handlers. Every route here sits behind `require_auth` + `require_admin`.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{parse_id, Payload};
use super::server::AppState;
use crate::auth::models::{Assignment, Gender, Role, UserView};
use crate::auth::validation::{is_valid_email, is_valid_password, INVALID_DATA, MIN_NAME_LEN};
use crate::auth::{AdminUser, Registration};
use crate::error::{Error, Result};
use crate::inventory::{NewSite, Site};
use crate::store::SITE_NOT_FOUND;

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Value>> {
    let sites = state.sites.list().await?;
    let total_users = state.auth.users().count().await?;

    Ok(Json(json!({
        "totalSites": sites.len(),
        "totalUsers": total_users,
        "sites": sites,
    })))
}

pub async fn list_sites(State(state): State<AppState>) -> Result<Json<Vec<Site>>> {
    Ok(Json(state.sites.list().await?))
}

pub async fn add_site(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Payload(site): Payload<NewSite>,
) -> Result<(StatusCode, Json<Value>)> {
    site.validate()?;
    let site = state.sites.insert(site).await?;
    tracing::info!(site_id = %site.id, admin_id = %admin.id, "Site added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Site added successfully", "site": site })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    pub site_id: Option<String>,
}

pub async fn list_team(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<UserView>>> {
    let site = query.site_id.as_deref().map(parse_id).transpose()?;
    let users = state.auth.users().list(site).await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// Body of `POST /admin/site/team/add`; every field is required
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub site_id: Option<String>,
    pub gender: Option<String>,
    pub designation: Option<String>,
}

fn required(field: Option<String>) -> Result<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::bad_request("All fields are required")),
    }
}

impl TeamMemberRequest {
    fn into_registration(self) -> Result<Registration> {
        let name = required(self.name)?.trim().to_string();
        let email = required(self.email)?;
        let password = required(self.password)?;
        let role = required(self.role)?;
        let site_id = required(self.site_id)?;
        let gender = required(self.gender)?;
        let designation = required(self.designation)?.trim().to_string();

        if name.chars().count() < MIN_NAME_LEN
            || !is_valid_email(&email)
            || !is_valid_password(&password)
        {
            return Err(Error::bad_request(INVALID_DATA));
        }
        let role: Role = role.parse().map_err(|_| Error::bad_request(INVALID_DATA))?;
        let gender: Gender = gender.parse().map_err(|_| Error::bad_request(INVALID_DATA))?;

        let site_id = parse_id(&site_id)?;

        Ok(Registration {
            name,
            email,
            password,
            role,
            site_id: Some(site_id),
            gender,
            designation: Some(designation),
        })
    }
}

pub async fn add_team_member(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Payload(req): Payload<TeamMemberRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = state.auth.register(req.into_registration()?).await?;
    tracing::info!(
        user_id = %user.id,
        site_id = ?user.site_id,
        admin_id = %admin.id,
        "Team member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Team member added successfully", "user": user.view() })),
    ))
}

pub async fn assign_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(assignment): Payload<Assignment>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    if assignment.is_empty() {
        return Err(Error::bad_request("Role or siteId is required"));
    }
    if let Some(site_id) = assignment.site_id {
        if state.sites.find_by_id(site_id).await?.is_none() {
            return Err(Error::not_found(SITE_NOT_FOUND));
        }
    }

    let users = state.auth.users();
    let previous = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;
    let user = users
        .update_assignment(id, &assignment)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    // A user belongs to at most one site team
    if let Some(site_id) = assignment.site_id {
        if let Some(old_site) = previous.site_id.filter(|old| *old != site_id) {
            state.sites.remove_team_member(old_site, user.id).await?;
        }
        state.sites.add_team_member(site_id, user.id).await?;
    }
    tracing::info!(user_id = %user.id, role = %user.role, "User reassigned");

    Ok(Json(json!({ "message": "User updated successfully", "user": user.view() })))
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    pub verified: Option<bool>,
}

/// The body is optional; an empty one verifies the tree
pub async fn verify_tree(
    State(state): State<AppState>,
    Path(tree_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let tree_id: Uuid = parse_id(&tree_id)?;
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        VerifyRequest::default()
    } else {
        serde_json::from_slice::<VerifyRequest>(&body)
            .map_err(|_| Error::bad_request(INVALID_DATA))?
    };
    let verified = req.verified.unwrap_or(true);

    let tree = state
        .trees
        .set_verified(tree_id, verified)
        .await?
        .ok_or_else(|| Error::not_found("Tree not found"))?;
    tracing::info!(%tree_id, verified, "Tree verification changed");

    let message = if verified {
        "Tree verified successfully"
    } else {
        "Tree verification revoked"
    };
    Ok(Json(json!({ "message": message, "tree": tree })))
}
