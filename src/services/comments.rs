use crate::models::{Account, AuthorSummary, Comment, CommentThread, NewComment, NewReply, Reply};
use crate::services::posts::post_exists;
use crate::services::validation::{required, FormErrors, ServiceError, ServiceResult};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;
use std::collections::HashMap;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.text, c.date, p.id, u.username, p.full_name
    FROM comments c
    JOIN profiles p ON p.id = c.author_id
    JOIN users u ON u.id = p.user_id
"#;

const REPLY_SELECT: &str = r#"
    SELECT r.id, r.comment_id, r.text, r.date,
           rp.id, ru.username, rp.full_name,
           cp.id, cu.username, cp.full_name
    FROM replies r
    JOIN comments c ON c.id = r.comment_id
    JOIN profiles rp ON rp.id = r.author_id
    JOIN users ru ON ru.id = rp.user_id
    JOIN profiles cp ON cp.id = c.author_id
    JOIN users cu ON cu.id = cp.user_id
"#;

fn author_at(row: &rusqlite::Row, start: usize) -> rusqlite::Result<AuthorSummary> {
    Ok(AuthorSummary {
        id: row.get(start)?,
        username: row.get(start + 1)?,
        full_name: row.get(start + 2)?,
    })
}

fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        text: row.get(2)?,
        date: row.get(3)?,
        author: author_at(row, 4)?,
    })
}

fn row_to_reply(row: &rusqlite::Row) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        text: row.get(2)?,
        date: row.get(3)?,
        author: author_at(row, 4)?,
        addressee: author_at(row, 7)?,
    })
}

/// A submission may name its author, but only as the signed-in profile.
fn check_author(claimed: Option<i64>, account: &Account) -> ServiceResult<()> {
    match claimed {
        Some(id) if id != account.profile.id => Err(ServiceError::Forbidden),
        _ => Ok(()),
    }
}

fn comment_exists(db: &Database, comment_id: i64) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM comments WHERE id = ?",
        [comment_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_comment(db: &Database, id: i64) -> Result<Option<Comment>> {
    let conn = db.get()?;
    let comment = conn
        .query_row(
            &format!("{} WHERE c.id = ?", COMMENT_SELECT),
            [id],
            row_to_comment,
        )
        .optional()?;
    Ok(comment)
}

pub fn add_comment(db: &Database, input: &NewComment, account: &Account) -> ServiceResult<Comment> {
    check_author(input.author, account)?;

    let mut errors = FormErrors::new();
    required(&mut errors, "text", &input.text, None);
    if !post_exists(db, input.post)? {
        errors.add(
            "post",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    errors.into_result()?;

    let id = {
        let conn = db.get()?;
        conn.execute(
            "INSERT INTO comments (post_id, text, author_id) VALUES (?, ?, ?)",
            (input.post, input.text.trim(), account.profile.id),
        )?;
        conn.last_insert_rowid()
    };

    let comment = get_comment(db, id)?.ok_or(ServiceError::NotFound("Comment"))?;
    tracing::debug!("New comment {}", comment);
    Ok(comment)
}

pub fn add_reply(db: &Database, input: &NewReply, account: &Account) -> ServiceResult<Reply> {
    check_author(input.author, account)?;

    let mut errors = FormErrors::new();
    required(&mut errors, "text", &input.text, None);
    if !comment_exists(db, input.comment)? {
        errors.add(
            "comment",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    errors.into_result()?;

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO replies (comment_id, text, author_id) VALUES (?, ?, ?)",
        (input.comment, input.text.trim(), account.profile.id),
    )?;
    let reply = conn.query_row(
        &format!("{} WHERE r.id = ?", REPLY_SELECT),
        [conn.last_insert_rowid()],
        row_to_reply,
    )?;
    tracing::debug!("New reply {}", reply);
    Ok(reply)
}

/// Comments of a post, oldest first, each with its replies oldest first.
pub fn comments_for_post(db: &Database, post_id: i64) -> Result<Vec<CommentThread>> {
    let conn = db.get()?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.post_id = ? ORDER BY c.date, c.id",
        COMMENT_SELECT
    ))?;
    let comments = stmt
        .query_map([post_id], row_to_comment)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.post_id = ? ORDER BY r.date, r.id",
        REPLY_SELECT
    ))?;
    let mut replies: HashMap<i64, Vec<Reply>> = HashMap::new();
    for reply in stmt.query_map([post_id], row_to_reply)? {
        let reply = reply?;
        replies.entry(reply.comment_id).or_default().push(reply);
    }

    Ok(comments
        .into_iter()
        .map(|comment| CommentThread {
            replies: replies.remove(&comment.id).unwrap_or_default(),
            comment,
        })
        .collect())
}
