//! Handlers for any authenticated member

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::extract::{parse_id, Payload};
use super::server::AppState;
use crate::auth::models::{ProfileUpdate, UserView};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::store::SITE_NOT_FOUND;
use crate::inventory::{NewTree, Tree, TreeUpdate};

const TREE_NOT_FOUND: &str = "Tree not found";

pub async fn dashboard(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>> {
    let trees_count = state.trees.count_by_planter(user.id).await?;
    let sites_count = state.sites.count().await?;

    Ok(Json(json!({
        "message": "User Dashboard",
        "stats": { "treesCount": trees_count, "sitesCount": sites_count },
    })))
}

pub async fn profile(State(state): State<AppState>, user: AuthUser) -> Result<Json<UserView>> {
    let user = state.auth.current_user(&user).await?;
    Ok(Json(user.view()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Payload(mut update): Payload<ProfileUpdate>,
) -> Result<Json<Value>> {
    if update.is_empty() {
        return Err(Error::bad_request(
            "At least one field must be provided to update",
        ));
    }
    if let Some(name) = update.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::bad_request("Name cannot be empty"));
        }
    }

    let user = state
        .auth
        .users()
        .update_profile(user.id, &update)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user.view(),
    })))
}

pub async fn list_trees(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>> {
    let trees = state.trees.list_by_planter(user.id).await?;
    Ok(Json(json!({ "trees": trees })))
}

/// Load a tree the caller planted, or any tree for an admin
async fn owned_tree(state: &AppState, user: &AuthUser, raw_id: &str) -> Result<Tree> {
    let tree = state
        .trees
        .find_by_id(parse_id(raw_id)?)
        .await?
        .ok_or_else(|| Error::not_found(TREE_NOT_FOUND))?;

    if tree.planted_by != user.id && !user.is_admin() {
        tracing::warn!(tree_id = %tree.id, user_id = %user.id, "Denied access to tree");
        return Err(Error::forbidden("You can only access trees you planted"));
    }
    Ok(tree)
}

pub async fn get_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tree_id): Path<String>,
) -> Result<Json<Value>> {
    let tree = owned_tree(&state, &user, &tree_id).await?;
    Ok(Json(json!({ "tree": tree })))
}

pub async fn add_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Payload(tree): Payload<NewTree>,
) -> Result<(StatusCode, Json<Value>)> {
    tree.validate()?;
    if state.sites.find_by_id(tree.site_id).await?.is_none() {
        return Err(Error::not_found(SITE_NOT_FOUND));
    }

    let tree = state.trees.insert(tree, user.id).await?;
    tracing::info!(tree_id = %tree.id, user_id = %user.id, "Tree added");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Tree added successfully", "tree": tree })),
    ))
}

pub async fn update_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Path(tree_id): Path<String>,
    Payload(update): Payload<TreeUpdate>,
) -> Result<Json<Value>> {
    update.validate()?;
    let tree = owned_tree(&state, &user, &tree_id).await?;

    let tree = state
        .trees
        .update(tree.id, &update)
        .await?
        .ok_or_else(|| Error::not_found(TREE_NOT_FOUND))?;

    Ok(Json(json!({ "message": "Tree updated successfully", "tree": tree })))
}
