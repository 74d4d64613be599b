use super::handlers;
use super::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn blog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::posts::index))
        .route("/search", get(handlers::posts::search))
        .route("/post/create", post(handlers::posts::create_post))
        .route("/post/:slug", get(handlers::posts::post_detail))
        .route("/post/:slug/update", post(handlers::posts::update_post))
        .route("/post/:slug/delete", post(handlers::posts::delete_post))
        .route("/post/:slug/like", post(handlers::posts::like_post))
        .route("/post/:slug/pin", post(handlers::posts::pin_post))
        .route("/tag/create", post(handlers::taxonomy::create_tag))
        .route("/tag/:slug", get(handlers::taxonomy::tag_posts))
        .route("/category/create", post(handlers::taxonomy::create_category))
        .route("/category/:slug", get(handlers::taxonomy::category_posts))
}

pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/account",
            get(handlers::account::account).post(handlers::account::update_account),
        )
        .route("/account/register", post(handlers::auth::register))
        .route("/account/login", post(handlers::auth::login))
        .route("/account/logout", post(handlers::auth::logout))
        .route("/account/reset", post(handlers::auth::reset_password))
        .route("/account/favorite", get(handlers::account::favorites))
        .route("/account/posts", get(handlers::account::my_posts))
        .route("/user/:username", get(handlers::account::user_profile))
        .route("/partial/user-info", get(handlers::account::user_info))
}

pub fn community_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comment", post(handlers::community::comment))
        .route("/reply", post(handlers::community::reply))
        .route("/contact", post(handlers::community::contact))
}

pub fn json_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/json/tags", get(handlers::json::tags))
        .route("/json/categories", get(handlers::json::categories))
        .route("/json/popular-posts", get(handlers::json::popular_posts))
}
