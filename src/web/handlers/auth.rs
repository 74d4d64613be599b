use super::ok;
use crate::models::Registration;
use crate::services::auth;
use crate::services::validation::{FormErrors, NON_FIELD};
use crate::web::error::AppResult;
use crate::web::extractors::SESSION_COOKIE;
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use time::Duration;

fn session_cookie(token: String, days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(Duration::days(days))
        .build()
}

/// Only same-site absolute paths are followed after login.
fn safe_redirect(next: Option<&str>) -> &str {
    match next {
        Some(target)
            if target.starts_with('/') && !target.starts_with("//") && !target.contains('\\') =>
        {
            target
        }
        _ => "/",
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<Registration>,
) -> AppResult<Response> {
    let account = auth::register(&state.db, &form)?;
    let token = auth::create_session(&state.db, account.user.id, state.session_days)?;

    Ok((
        jar.add(session_cookie(token, state.session_days)),
        ok(json!({
            "account": account,
            "redirect": "/",
        })),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    next: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if !state.rate_limiter.check(&form.username) {
        tracing::warn!("Login rate limit hit for '{}'", form.username);
        let errors = FormErrors::single(
            NON_FIELD,
            "Too many login attempts. Please try again later.",
        );
        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "status": "INVALID",
                "errors": errors,
            })),
        )
            .into_response());
    }

    let account = match auth::login(&state.db, &form.username, &form.password) {
        Ok(account) => account,
        Err(e) => {
            state.rate_limiter.record_attempt(&form.username);
            return Err(e.into());
        }
    };
    state.rate_limiter.clear(&form.username);

    let token = auth::create_session(&state.db, account.user.id, state.session_days)?;
    tracing::info!("User '{}' logged in", account.user.username);

    Ok((
        jar.add(session_cookie(token, state.session_days)),
        ok(json!({
            "account": account,
            "redirect": safe_redirect(form.next.as_deref()),
        })),
    )
        .into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        auth::delete_session(&state.db, cookie.value())?;
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    Ok((jar.remove(cookie), ok(json!({ "redirect": "/" }))).into_response())
}

#[derive(Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    email: String,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetForm>,
) -> AppResult<Response> {
    let sent_to = auth::reset_password(&state.db, state.mailer.as_ref(), &form.email)?;
    Ok(ok(json!({
        "message": "A new password has been sent to your email",
        "email": sent_to,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::safe_redirect;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/account")), "/account");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect(None), "/");
    }
}
