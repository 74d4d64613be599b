use crate::models::PostWithRelations;
use crate::services::posts::{enrich, get_post_by_slug, row_to_post};
use crate::services::validation::{ServiceError, ServiceResult};
use crate::Database;
use anyhow::Result;

pub fn is_pinned(db: &Database, post_id: i64) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pinned_posts WHERE post_id = ?",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Pins an unpinned post or unpins a pinned one. Returns the new state.
pub fn toggle_pin(db: &Database, slug: &str) -> ServiceResult<bool> {
    let post = get_post_by_slug(db, slug)?.ok_or(ServiceError::NotFound("Post"))?;
    let pinned = is_pinned(db, post.id)?;

    let conn = db.get()?;
    if pinned {
        conn.execute("DELETE FROM pinned_posts WHERE post_id = ?", [post.id])?;
        tracing::info!("Unpinned post '{}'", post.slug);
    } else {
        conn.execute("INSERT INTO pinned_posts (post_id) VALUES (?)", [post.id])?;
        tracing::info!("Pinned post '{}'", post.slug);
    }
    Ok(!pinned)
}

/// Pinned posts in the order they were pinned.
pub fn list_pinned(db: &Database, limit: usize) -> Result<Vec<PostWithRelations>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT p.id, p.title, p.body, p.slug, p.cover, p.date, p.category_id, p.author_id, p.views
        FROM pinned_posts pp
        JOIN posts p ON p.id = pp.post_id
        ORDER BY pp.id
        LIMIT ?
        "#,
    )?;
    let posts = stmt
        .query_map([limit as i64], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    posts.into_iter().map(|p| enrich(&conn, p)).collect()
}
