//! Likes are a set of (post, profile) pairs.

use crate::models::LikeState;
use crate::services::auth::profile_exists;
use crate::services::posts::{get_post_by_slug, post_exists};
use crate::services::validation::{FormErrors, ServiceError, ServiceResult, NON_FIELD};
use crate::Database;
use anyhow::Result;

fn check_targets(db: &Database, post_id: i64, profile_id: i64) -> ServiceResult<()> {
    if !post_exists(db, post_id)? {
        return Err(ServiceError::invalid("post", "Post not found"));
    }
    if !profile_exists(db, profile_id)? {
        return Err(ServiceError::invalid("profile", "Profile not found"));
    }
    Ok(())
}

pub fn like_count(db: &Database, post_id: i64) -> Result<i64> {
    let conn = db.get()?;
    let count = conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn is_liked(db: &Database, post_id: i64, profile_id: i64) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ? AND profile_id = ?",
        (post_id, profile_id),
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Adds `profile_id` to the post's likers. Liking twice changes nothing.
/// Returns the resulting like count.
pub fn like_post(db: &Database, post_id: i64, profile_id: i64) -> ServiceResult<i64> {
    check_targets(db, post_id, profile_id)?;
    {
        let conn = db.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO post_likes (post_id, profile_id) VALUES (?, ?)",
            (post_id, profile_id),
        )?;
    }
    Ok(like_count(db, post_id)?)
}

/// Removes an existing like. Fails with `Like not found` when the profile
/// never liked the post.
pub fn unlike_post(db: &Database, post_id: i64, profile_id: i64) -> ServiceResult<i64> {
    check_targets(db, post_id, profile_id)?;
    let removed = {
        let conn = db.get()?;
        conn.execute(
            "DELETE FROM post_likes WHERE post_id = ? AND profile_id = ?",
            (post_id, profile_id),
        )?
    };
    if removed == 0 {
        return Err(FormErrors::single(NON_FIELD, "Like not found").into());
    }
    Ok(like_count(db, post_id)?)
}

/// Likes the post when `profile_id` has not liked it yet, otherwise unlikes
/// it.
pub fn toggle_like(db: &Database, slug: &str, profile_id: i64) -> ServiceResult<LikeState> {
    let post = get_post_by_slug(db, slug)?.ok_or(ServiceError::NotFound("Post"))?;
    if is_liked(db, post.id, profile_id)? {
        let likes = unlike_post(db, post.id, profile_id)?;
        Ok(LikeState {
            liked: false,
            likes,
        })
    } else {
        let likes = like_post(db, post.id, profile_id)?;
        Ok(LikeState { liked: true, likes })
    }
}
