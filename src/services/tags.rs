use crate::models::{NewTag, Tag};
use crate::services::slug::{is_reserved, validate_slug};
use crate::services::validation::{required, FormErrors, ServiceResult};
use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

const MAX_TITLE_LENGTH: usize = 50;

pub(crate) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn clean_slug(db: &Database, slug: &str, errors: &mut FormErrors) -> Result<()> {
    let slug = slug.trim();
    if slug.is_empty() {
        errors.add("slug", "This field is required.");
        return Ok(());
    }
    if is_reserved(slug) || !validate_slug(slug) {
        errors.add("slug", "Enter correct slug");
        return Ok(());
    }
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tags WHERE slug = ? COLLATE NOCASE",
        [slug],
        |row| row.get(0),
    )?;
    if count > 0 {
        errors.add("slug", format!("Slug {} already exists", slug));
    }
    Ok(())
}

pub fn create_tag(db: &Database, input: &NewTag) -> ServiceResult<Tag> {
    let mut errors = FormErrors::new();
    required(&mut errors, "title", &input.title, Some(MAX_TITLE_LENGTH));
    let slug = input.slug.trim().to_lowercase();
    clean_slug(db, &slug, &mut errors)?;
    errors.into_result()?;

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO tags (title, slug) VALUES (?, ?)",
        (input.title.trim(), &slug),
    )?;
    let id = conn.last_insert_rowid();
    let tag = conn.query_row(
        "SELECT id, title, slug, created_at FROM tags WHERE id = ?",
        [id],
        row_to_tag,
    )?;
    tracing::info!("Created tag '{}'", tag.slug);
    Ok(tag)
}

pub fn get_tag_by_slug(db: &Database, slug: &str) -> Result<Option<Tag>> {
    let conn = db.get()?;
    let tag = conn
        .query_row(
            "SELECT id, title, slug, created_at FROM tags WHERE slug = ? COLLATE NOCASE",
            [slug],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}

pub fn list_tags(db: &Database) -> Result<Vec<Tag>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT id, title, slug, created_at FROM tags ORDER BY title")?;
    let tags = stmt
        .query_map([], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

/// Returns the ids in `ids` that do not name an existing tag.
pub fn missing_tag_ids(db: &Database, ids: &[i64]) -> Result<Vec<i64>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM tags WHERE id = ?")?;
    let mut missing = Vec::new();
    for id in ids {
        let count: i64 = stmt.query_row([id], |row| row.get(0))?;
        if count == 0 {
            missing.push(*id);
        }
    }
    Ok(missing)
}
