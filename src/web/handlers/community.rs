use super::{ok, INVALID_CHOICE};
use crate::models::{NewComment, NewFeedback, NewReply};
use crate::services::validation::FormErrors;
use crate::services::{comments, feedback};
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use std::sync::Arc;

/// Comment form as submitted. Ids arrive as text and are checked here so a
/// malformed id becomes a field error.
#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    post: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    comment: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    author: String,
}

fn required_id(errors: &mut FormErrors, field: &str, raw: &str) -> i64 {
    match raw.trim() {
        "" => {
            errors.add(field, "This field is required.");
            0
        }
        raw => raw.parse::<i64>().unwrap_or_else(|_| {
            errors.add(field, INVALID_CHOICE);
            0
        }),
    }
}

fn optional_id(errors: &mut FormErrors, field: &str, raw: &str) -> Option<i64> {
    match raw.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(field, INVALID_CHOICE);
                None
            }
        },
    }
}

impl CommentForm {
    fn into_new_comment(self) -> Result<NewComment, FormErrors> {
        let mut errors = FormErrors::new();
        let post = required_id(&mut errors, "post", &self.post);
        let author = optional_id(&mut errors, "author", &self.author);
        errors.into_result()?;
        Ok(NewComment {
            post,
            text: self.text,
            author,
        })
    }
}

impl ReplyForm {
    fn into_new_reply(self) -> Result<NewReply, FormErrors> {
        let mut errors = FormErrors::new();
        let comment = required_id(&mut errors, "comment", &self.comment);
        let author = optional_id(&mut errors, "author", &self.author);
        errors.into_result()?;
        Ok(NewReply {
            comment,
            text: self.text,
            author,
        })
    }
}

pub async fn comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let input = form.into_new_comment()?;
    let comment = comments::add_comment(&state.db, &input, &account)?;
    Ok(ok(comment).into_response())
}

pub async fn reply(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Form(form): Form<ReplyForm>,
) -> AppResult<Response> {
    let input = form.into_new_reply()?;
    let reply = comments::add_reply(&state.db, &input, &account)?;
    Ok(ok(reply).into_response())
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    Form(form): Form<NewFeedback>,
) -> AppResult<Response> {
    let feedback = feedback::submit_feedback(&state.db, &form)?;
    Ok(ok(feedback).into_response())
}
