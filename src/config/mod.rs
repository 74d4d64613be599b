use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            url: default_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds before an in-flight request is answered with 408.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Page size of the home, tag, category, author and search listings.
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
    /// Page size of the signed-in user's own and liked posts.
    #[serde(default = "default_account_posts_per_page")]
    pub account_posts_per_page: usize,
    #[serde(default = "default_featured_limit")]
    pub pinned_limit: usize,
    #[serde(default = "default_featured_limit")]
    pub popular_limit: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_per_page: default_posts_per_page(),
            account_posts_per_page: default_account_posts_per_page(),
            pinned_limit: default_featured_limit(),
            popular_limit: default_featured_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime: default_session_lifetime(),
        }
    }
}

impl AuthConfig {
    /// Session lifetime in whole days. Accepts `<n>d` or `<n>w`.
    pub fn session_days(&self) -> Result<i64> {
        parse_lifetime_days(&self.session_lifetime)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_mail_from(),
        }
    }
}

fn default_title() -> String {
    "My Blog".to_string()
}

fn default_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_db_path() -> String {
    "./data/blog.db".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_posts_per_page() -> usize {
    8
}

fn default_account_posts_per_page() -> usize {
    3
}

fn default_featured_limit() -> usize {
    3
}

fn default_session_lifetime() -> String {
    "7d".to_string()
}

fn default_mail_from() -> String {
    "noreply@localhost".to_string()
}

pub fn parse_lifetime_days(value: &str) -> Result<i64> {
    let value = value.trim();
    let unit_start = value.char_indices().last().map(|(i, _)| i).unwrap_or(0);
    let (number, unit) = value.split_at(unit_start);
    let count: i64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid session lifetime '{}'", value))?;
    if count <= 0 {
        anyhow::bail!("Session lifetime must be positive, got '{}'", value);
    }
    match unit {
        "d" => Ok(count),
        "w" => Ok(count * 7),
        _ => anyhow::bail!(
            "Invalid session lifetime '{}': expected a number followed by 'd' or 'w'",
            value
        ),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Run 'blog init' to create one.",
                path.display(),
                e
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("content.posts_per_page", self.content.posts_per_page),
            (
                "content.account_posts_per_page",
                self.content.account_posts_per_page,
            ),
        ] {
            if size == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
            if size > 100 {
                anyhow::bail!("{} must be 100 or less", name);
            }
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be greater than 0");
        }
        if self.server.request_timeout == 0 {
            anyhow::bail!("server.request_timeout must be greater than 0");
        }
        self.auth.session_days()?;
        Ok(())
    }
}
