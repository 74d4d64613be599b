use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "My Blog".to_string());

    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(path.join("data"))?;

    let config_path = path.join("blog.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let config = format!(
        r#"[site]
title = "{}"
description = "A blog"
url = "http://localhost:8000"

[server]
host = "127.0.0.1"
port = 8000
request_timeout = 30

[database]
path = "./data/blog.db"
pool_size = 10

[content]
posts_per_page = 8
account_posts_per_page = 3
pinned_limit = 3
popular_limit = 3

[auth]
session_lifetime = "7d"

[mail]
from = "noreply@localhost"
"#,
        site_name
    );

    std::fs::write(&config_path, config)?;

    tracing::info!("Created new blog at {:?}", path);
    tracing::info!("Run 'blog migrate' to set up the database");
    tracing::info!("Run 'blog user add' to create an author account");
    tracing::info!("Run 'blog serve' to start the server");

    Ok(())
}
