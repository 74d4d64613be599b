use super::{ok, page_number, require_publisher, PageParams, INVALID_CHOICE};
use crate::models::{Account, NewPost, UserRole};
use crate::services::validation::{FormErrors, ServiceError};
use crate::services::{likes, pins, posts, search as search_service};
use crate::web::error::AppResult;
use crate::web::extractors::{CurrentUser, OptionalUser};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Post form as submitted. `tags` is a comma separated list of tag ids.
#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    cover: Option<String>,
}

impl PostForm {
    fn into_new_post(self) -> Result<NewPost, FormErrors> {
        let mut errors = FormErrors::new();

        let category_id = match self.category.trim() {
            "" => {
                errors.add("category", "This field is required.");
                0
            }
            raw => raw.parse::<i64>().unwrap_or_else(|_| {
                errors.add("category", INVALID_CHOICE);
                0
            }),
        };

        let mut tag_ids = Vec::new();
        for raw in self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match raw.parse::<i64>() {
                Ok(id) => tag_ids.push(id),
                Err(_) => errors.add("tags", format!("\"{}\" is not a valid value.", raw)),
            }
        }

        errors.into_result()?;
        Ok(NewPost {
            title: self.title,
            body: self.body,
            category_id,
            tag_ids,
            cover: self.cover,
        })
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let content = &state.config.content;
    let page = posts::list_posts(
        &state.db,
        &posts::PostFilter::All,
        params.number(),
        content.posts_per_page,
    )?;
    let pinned = pins::list_pinned(&state.db, content.pinned_limit)?;

    Ok(ok(json!({
        "posts": page,
        "pinned": pinned,
    }))
    .into_response())
}

pub async fn post_detail(
    State(state): State<Arc<AppState>>,
    OptionalUser(viewer): OptionalUser,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let viewer = viewer.map(|account| account.profile.id);
    let detail = posts::view_post(&state.db, &slug, viewer)?.ok_or(ServiceError::NotFound("Post"))?;
    Ok(ok(detail).into_response())
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    require_publisher(&account)?;
    let input = form.into_new_post()?;
    let post = posts::create_post(&state.db, &state.slugs, &input, account.profile.id)?;
    Ok(ok(json!({
        "url": post.url(),
        "post": post,
    }))
    .into_response())
}

fn modifiable_post(state: &AppState, account: &Account, slug: &str) -> AppResult<()> {
    let post = posts::get_post_by_slug(&state.db, slug)?.ok_or(ServiceError::NotFound("Post"))?;
    if !posts::can_modify(account, &post) {
        return Err(ServiceError::Forbidden.into());
    }
    Ok(())
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    modifiable_post(&state, &account, &slug)?;
    let input = form.into_new_post()?;
    let post = posts::update_post(&state.db, &slug, &input)?;
    Ok(ok(json!({
        "url": post.url(),
        "post": post,
    }))
    .into_response())
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    modifiable_post(&state, &account, &slug)?;
    posts::delete_post(&state.db, &slug)?;
    tracing::info!("Post '{}' deleted by '{}'", slug, account.user.username);
    Ok(ok(json!({ "redirect": "/" })).into_response())
}

pub async fn like_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    let like = likes::toggle_like(&state.db, &slug, account.profile.id)?;
    Ok(ok(like).into_response())
}

pub async fn pin_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Response> {
    if account.user.role != UserRole::Admin {
        return Err(ServiceError::Forbidden.into());
    }
    let pinned = pins::toggle_pin(&state.db, &slug)?;
    Ok(ok(json!({ "pinned": pinned })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    page: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let page = search_service::search_posts(
        &state.db,
        &params.q,
        page_number(params.page.as_deref()),
        state.config.content.posts_per_page,
    )?;
    Ok(ok(json!({
        "query": params.q,
        "posts": page,
    }))
    .into_response())
}
