use super::{ok, require_publisher, PageParams};
use crate::models::{NewCategory, NewTag};
use crate::services::validation::ServiceError;
use crate::services::{categories, posts, tags};
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde_json::json;
use std::sync::Arc;

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<NewTag>,
) -> AppResult<Response> {
    require_publisher(&account)?;
    let tag = tags::create_tag(&state.db, &form)?;
    Ok(ok(json!({
        "url": tag.url(),
        "tag": tag,
    }))
    .into_response())
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<NewCategory>,
) -> AppResult<Response> {
    require_publisher(&account)?;
    let category = categories::create_category(&state.db, &form)?;
    Ok(ok(json!({
        "url": category.url(),
        "category": category,
    }))
    .into_response())
}

pub async fn tag_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let tag = tags::get_tag_by_slug(&state.db, &slug)?.ok_or(ServiceError::NotFound("Tag"))?;
    let page = posts::list_posts_by_tag(
        &state.db,
        tag.id,
        params.number(),
        state.config.content.posts_per_page,
    )?;
    Ok(ok(json!({
        "tag": tag,
        "posts": page,
    }))
    .into_response())
}

pub async fn category_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let category = categories::get_category_by_slug(&state.db, &slug)?
        .ok_or(ServiceError::NotFound("Category"))?;
    let page = posts::list_posts_by_category(
        &state.db,
        category.id,
        params.number(),
        state.config.content.posts_per_page,
    )?;
    Ok(ok(json!({
        "category": category,
        "posts": page,
    }))
    .into_response())
}
