use super::{ok, PageParams};
use crate::models::AccountUpdate;
use crate::services::validation::ServiceError;
use crate::services::{auth, posts};
use crate::web::error::AppResult;
use crate::web::extractors::{CurrentUser, OptionalUser};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde_json::json;
use std::sync::Arc;

pub async fn account(CurrentUser(account): CurrentUser) -> AppResult<Response> {
    Ok(ok(account).into_response())
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<AccountUpdate>,
) -> AppResult<Response> {
    let updated = auth::update_account(&state.db, &account, &form)?;
    tracing::info!("Account '{}' updated", updated.user.username);
    Ok(ok(updated).into_response())
}

pub async fn favorites(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let page = posts::list_liked_posts(
        &state.db,
        account.profile.id,
        params.number(),
        state.config.content.account_posts_per_page,
    )?;
    Ok(ok(json!({ "posts": page })).into_response())
}

pub async fn my_posts(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let page = posts::list_posts_by_author(
        &state.db,
        account.profile.id,
        params.number(),
        state.config.content.account_posts_per_page,
    )?;
    Ok(ok(json!({ "posts": page })).into_response())
}

pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let account = auth::get_account_by_username(&state.db, &username)?
        .ok_or(ServiceError::NotFound("User"))?;
    let page = posts::list_posts_by_author(
        &state.db,
        account.profile.id,
        params.number(),
        state.config.content.posts_per_page,
    )?;
    Ok(ok(json!({
        "username": account.user.username,
        "full_name": account.profile.full_name,
        "image": account.profile.image,
        "posts": page,
    }))
    .into_response())
}

/// Header widget data: who is signed in, if anyone.
pub async fn user_info(OptionalUser(account): OptionalUser) -> AppResult<Response> {
    let info = match account {
        Some(account) => json!({
            "authenticated": true,
            "username": account.user.username,
            "full_name": account.profile.full_name,
            "image": account.profile.image,
            "role": account.user.role,
            "profile_url": account.profile_url(),
        }),
        None => json!({ "authenticated": false }),
    };
    Ok(ok(info).into_response())
}
