use crate::models::{Feedback, NewFeedback};
use crate::services::validation::{is_valid_email, required, FormErrors, ServiceResult};
use crate::Database;
use anyhow::Result;

const MAX_NAME_LENGTH: usize = 200;

fn row_to_feedback(row: &rusqlite::Row) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        date: row.get(4)?,
    })
}

pub fn submit_feedback(db: &Database, input: &NewFeedback) -> ServiceResult<Feedback> {
    let mut errors = FormErrors::new();
    required(&mut errors, "name", &input.name, Some(MAX_NAME_LENGTH));
    if input.email.trim().is_empty() {
        errors.add("email", "This field is required.");
    } else if !is_valid_email(&input.email) {
        errors.add("email", "Enter a valid email address.");
    }
    required(&mut errors, "message", &input.message, None);
    errors.into_result()?;

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO feedback (name, email, message) VALUES (?, ?, ?)",
        (input.name.trim(), input.email.trim(), input.message.trim()),
    )?;
    let feedback = conn.query_row(
        "SELECT id, name, email, message, date FROM feedback WHERE id = ?",
        [conn.last_insert_rowid()],
        row_to_feedback,
    )?;
    tracing::info!("Feedback received from {}", feedback);
    Ok(feedback)
}

/// All contact messages, newest first.
pub fn list_feedback(db: &Database) -> Result<Vec<Feedback>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, name, email, message, date FROM feedback ORDER BY date DESC, id DESC",
    )?;
    let feedback = stmt
        .query_map([], row_to_feedback)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(feedback)
}

pub fn delete_feedback(db: &Database, id: i64) -> Result<bool> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM feedback WHERE id = ?", [id])?;
    Ok(affected > 0)
}
