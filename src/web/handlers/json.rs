use super::ok;
use crate::services::{categories, posts, tags};
use crate::web::error::AppResult;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::sync::Arc;

pub async fn tags(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let tags: Vec<_> = tags::list_tags(&state.db)?
        .into_iter()
        .map(|tag| {
            json!({
                "title": tag.title.to_lowercase(),
                "url": tag.url(),
            })
        })
        .collect();
    Ok(ok(tags).into_response())
}

pub async fn categories(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let categories: Vec<_> = categories::list_categories_with_counts(&state.db)?
        .into_iter()
        .map(|entry| {
            json!({
                "title": entry.category.title,
                "url": entry.category.url(),
                "posts_count": entry.posts_count,
            })
        })
        .collect();
    Ok(ok(categories).into_response())
}

/// This month's most viewed posts. An empty month answers with a
/// `NOTFOUND` envelope rather than an empty list.
pub async fn popular_posts(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let today = chrono::Utc::now().date_naive();
    let popular = posts::popular_posts(&state.db, today, state.config.content.popular_limit)?;
    if popular.is_empty() {
        return Ok(Json(json!({
            "status": "NOTFOUND",
            "data": "",
        }))
        .into_response());
    }
    Ok(ok(popular).into_response())
}
