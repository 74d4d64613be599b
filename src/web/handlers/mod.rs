pub mod account;
pub mod auth;
pub mod community;
pub mod json;
pub mod posts;
pub mod taxonomy;

use crate::models::Account;
use crate::services::validation::ServiceError;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub(crate) const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// `?page=` as sent. Anything that is not a page number means the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageParams {
    pub fn number(&self) -> usize {
        page_number(self.page.as_deref())
    }
}

pub fn page_number(raw: Option<&str>) -> usize {
    raw.and_then(|page| page.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

/// `{"status": "OK", "data": ...}`
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "data": data,
    }))
}

pub fn require_publisher(account: &Account) -> Result<(), ServiceError> {
    if account.user.role.can_publish() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
