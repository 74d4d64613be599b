use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_PROFILE_IMAGE: &str = "static/images/users/default-user-image.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Author,
    #[default]
    Reader,
}

impl UserRole {
    /// Authors and admins may publish posts and create categories and tags.
    pub fn can_publish(self) -> bool {
        matches!(self, Self::Admin | Self::Author)
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "author" => Ok(Self::Author),
            "reader" => Ok(Self::Reader),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Author => write!(f, "author"),
            Self::Reader => write!(f, "reader"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub image: String,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// A user together with its public profile; what a session resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
}

impl Account {
    pub fn profile_url(&self) -> String {
        format!("/user/{}", self.user.username)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl From<&Account> for AuthorSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.profile.id,
            username: account.user.username.clone(),
            full_name: account.profile.full_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AccountUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}
