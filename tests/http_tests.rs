use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use blog_engine::models::UserRole;
use blog_engine::services::auth;
use blog_engine::services::mail::OutboxMailer;
use blog_engine::web::{self, AppState};
use blog_engine::{Config, Database};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const TEST_PASSWORD: &str = "Password123";

struct TestApp {
    router: Router,
    db: Database,
    mailer: Arc<OutboxMailer>,
}

fn create_test_app() -> TestApp {
    use rand::Rng;
    let id: u32 = rand::thread_rng().gen();
    let db = Database::open_memory(&format!("http_test_db_{}", id)).expect("Failed to open db");
    db.migrate().expect("Failed to run migrations");

    let mailer = Arc::new(OutboxMailer::new());
    let state = AppState::new(Config::default(), db.clone())
        .expect("Failed to build state")
        .with_mailer(mailer.clone());

    TestApp {
        router: web::router(Arc::new(state)),
        db,
        mailer,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, cookie, body)
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (status, _, body) = self.send(builder.body(Body::empty()).unwrap()).await;
        (status, body)
    }

    async fn post_form(
        &self,
        uri: &str,
        form: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn login_as(&self, username: &str, role: UserRole) -> String {
        auth::create_user(
            &self.db,
            username,
            &format!("{}@example.com", username),
            TEST_PASSWORD,
            role,
        )
        .unwrap();
        let (status, cookie, _) = self
            .post_form(
                "/account/login",
                &format!("username={}&password={}", username, TEST_PASSWORD),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        cookie.expect("login should set a session cookie")
    }
}

#[tokio::test]
async fn test_home_page_clamps_page_number() {
    let app = create_test_app();
    let (status, body) = app.get("/?page=99", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["data"]["posts"]["number"], 1);
    assert_eq!(body["data"]["posts"]["num_pages"], 1);
    assert_eq!(body["data"]["pinned"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_test_app();
    let (status, body) = app.get("/definitely/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "NOTFOUND");
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    let app = create_test_app();
    let (status, body) = app.get("/post/nothing-here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "NOTFOUND");
}

#[tokio::test]
async fn test_popular_posts_empty_month() {
    let app = create_test_app();
    let (status, body) = app.get("/json/popular-posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "NOTFOUND", "data": ""}));
}

#[tokio::test]
async fn test_create_post_requires_session() {
    let app = create_test_app();
    let (status, _, body) = app
        .post_form("/post/create", "title=Hi&body=There&category=1", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_reader_cannot_publish() {
    let app = create_test_app();
    let cookie = app.login_as("reader", UserRole::Reader).await;
    let (status, _, body) = app
        .post_form("/category/create", "title=News&slug=news", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "FORBIDDEN");
}

#[tokio::test]
async fn test_reserved_category_slug_is_invalid() {
    let app = create_test_app();
    let cookie = app.login_as("writer", UserRole::Author).await;
    let (status, _, body) = app
        .post_form("/category/create", "title=Create&slug=create", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "INVALID");
    assert_eq!(body["errors"]["slug"][0], "Enter correct slug");
}

#[tokio::test]
async fn test_publish_view_and_like() {
    let app = create_test_app();
    let cookie = app.login_as("writer", UserRole::Author).await;

    let (status, _, body) = app
        .post_form("/category/create", "title=Rust&slug=rust", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    let category_id = body["data"]["category"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .post_form("/tag/create", "title=Async&slug=async", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    let tag_id = body["data"]["tag"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .post_form(
            "/post/create",
            &format!(
                "title=Hello+World&body=Body&category={}&tags={}",
                category_id, tag_id
            ),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/post/hello-world-"));

    let (status, body) = app.get(&url, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    assert_eq!(body["data"]["is_liked"], false);
    assert_eq!(body["data"]["tags"][0]["slug"], "async");

    let (status, _, body) = app
        .post_form(&format!("{}/like", url), "", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likes"], 1);

    let (_, body) = app.get("/account/favorite", Some(&cookie)).await;
    assert_eq!(body["data"]["posts"]["total"], 1);

    let (_, body) = app.get("/json/categories", None).await;
    assert_eq!(body["data"][0]["url"], "/category/rust");
    assert_eq!(body["data"][0]["posts_count"], 1);

    let (_, body) = app.get("/json/tags", None).await;
    assert_eq!(body["data"][0]["title"], "async");
}

#[tokio::test]
async fn test_post_form_rejects_bad_tags() {
    let app = create_test_app();
    let cookie = app.login_as("writer", UserRole::Author).await;
    let (status, _, body) = app
        .post_form(
            "/post/create",
            "title=T&body=B&category=&tags=abc",
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["category"][0], "This field is required.");
    assert!(body["errors"]["tags"].is_array());
}

#[tokio::test]
async fn test_only_admin_pins() {
    let app = create_test_app();
    let author = app.login_as("writer", UserRole::Author).await;
    let admin = app.login_as("boss", UserRole::Admin).await;

    app.post_form("/category/create", "title=Rust&slug=rust", Some(&author))
        .await;
    let (_, _, body) = app
        .post_form("/post/create", "title=Pinned&body=B&category=1", Some(&author))
        .await;
    let url = body["data"]["url"].as_str().unwrap().to_string();

    let (status, _, _) = app
        .post_form(&format!("{}/pin", url), "", Some(&author))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .post_form(&format!("{}/pin", url), "", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pinned"], true);

    let (_, body) = app.get("/", None).await;
    assert_eq!(body["data"]["pinned"][0]["title"], "Pinned");
}

#[tokio::test]
async fn test_login_failure_messages() {
    let app = create_test_app();
    auth::create_user(&app.db, "writer", "writer@example.com", TEST_PASSWORD, UserRole::Author)
        .unwrap();

    let (status, cookie, body) = app
        .post_form("/account/login", "username=ghost&password=Password123", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(cookie.is_none());
    assert_eq!(body["errors"]["username"][0], "User not found");

    let (_, _, body) = app
        .post_form("/account/login", "username=writer&password=Nope12345", None)
        .await;
    assert_eq!(body["errors"]["password"][0], "Wrong password");
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = create_test_app();
    auth::create_user(&app.db, "writer", "writer@example.com", TEST_PASSWORD, UserRole::Author)
        .unwrap();

    for _ in 0..5 {
        app.post_form("/account/login", "username=writer&password=Nope12345", None)
            .await;
    }
    let (status, _, _) = app
        .post_form("/account/login", "username=writer&password=Password123", None)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_login_redirect_stays_local() {
    let app = create_test_app();
    auth::create_user(&app.db, "writer", "writer@example.com", TEST_PASSWORD, UserRole::Author)
        .unwrap();
    let (_, _, body) = app
        .post_form(
            "/account/login",
            "username=writer&password=Password123&next=%2F%2Fevil.example",
            None,
        )
        .await;
    assert_eq!(body["data"]["redirect"], "/");
}

#[tokio::test]
async fn test_register_then_user_info() {
    let app = create_test_app();
    let (_, body) = app.get("/partial/user-info", None).await;
    assert_eq!(body["data"]["authenticated"], false);

    let (status, cookie, body) = app
        .post_form(
            "/account/register",
            "username=newbie&email=newbie%40example.com&full_name=New+Bie&password=Password123&confirm_password=Password123",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"]["role"], "reader");
    assert!(body["data"]["account"].get("password_hash").is_none());
    let cookie = cookie.expect("registration should sign the user in");

    let (_, body) = app.get("/partial/user-info", Some(&cookie)).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["full_name"], "New Bie");
    assert_eq!(body["data"]["profile_url"], "/user/newbie");

    let (status, _, _) = app.post_form("/account/logout", "", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/account", Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_sends_mail() {
    let app = create_test_app();
    auth::create_user(&app.db, "writer", "writer@example.com", TEST_PASSWORD, UserRole::Author)
        .unwrap();

    let (status, _, body) = app
        .post_form("/account/reset", "email=WRITER%40example.com", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "writer@example.com");
    assert_eq!(app.mailer.messages().len(), 1);

    let (status, _, body) = app
        .post_form("/account/reset", "email=ghost%40example.com", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "User not found!");
}

#[tokio::test]
async fn test_comment_and_contact() {
    let app = create_test_app();
    let cookie = app.login_as("writer", UserRole::Author).await;
    app.post_form("/category/create", "title=Rust&slug=rust", Some(&cookie))
        .await;
    let (_, _, body) = app
        .post_form("/post/create", "title=Talk&body=B&category=1", Some(&cookie))
        .await;
    let post_id = body["data"]["post"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .post_form(
            "/comment",
            &format!("post={}&text=Nice", post_id),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .post_form(
            "/reply",
            &format!("comment={}&text=Thanks", comment_id),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["addressee"]["username"], "writer");

    let (status, _, _) = app
        .post_form("/contact", "name=Carol&email=carol%40example.com&message=Hi", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_comment_with_malformed_ids_is_invalid() {
    let app = create_test_app();
    let cookie = app.login_as("reader", UserRole::Reader).await;

    let (status, _, body) = app
        .post_form("/comment", "post=abc&text=hello", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "INVALID");
    assert_eq!(
        body["errors"]["post"][0],
        "Select a valid choice. That choice is not one of the available choices."
    );

    let (status, _, body) = app.post_form("/comment", "text=hello", Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["post"][0], "This field is required.");

    let (status, _, body) = app
        .post_form("/reply", "comment=1x&text=hi&author=me", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "INVALID");
    assert!(body["errors"]["comment"].is_array());
    assert!(body["errors"]["author"].is_array());
}

#[tokio::test]
async fn test_malformed_page_falls_back_to_first() {
    let app = create_test_app();
    for uri in ["/?page=-1", "/?page=", "/?page=two", "/search?q=rust&page=-3"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["status"], "OK", "{}", uri);
        assert_eq!(body["data"]["posts"]["number"], 1, "{}", uri);
    }
}

#[tokio::test]
async fn test_search_endpoint() {
    let app = create_test_app();
    let cookie = app.login_as("writer", UserRole::Author).await;
    app.post_form("/category/create", "title=Rust&slug=rust", Some(&cookie))
        .await;
    app.post_form(
        "/post/create",
        "title=Borrow+checker&body=lifetimes&category=1",
        Some(&cookie),
    )
    .await;

    let (status, body) = app.get("/search?q=LIFETIMES", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["posts"]["total"], 1);
    assert_eq!(body["data"]["query"], "LIFETIMES");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = create_test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/json/tags").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn test_slow_request_times_out() {
    use axum::routing::get;
    use std::time::Duration;

    let router: Router = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "done"
            }),
        )
        .layer(web::request_timeout(Duration::from_millis(20)));

    let response = router
        .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
