use crate::models::{Category, CategoryWithCount, NewCategory, DEFAULT_CATEGORY_COVER};
use crate::services::slug::{is_reserved, validate_slug};
use crate::services::validation::{required, FormErrors, ServiceResult};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

const MAX_TITLE_LENGTH: usize = 50;

pub(crate) fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        cover: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn slug_in_use(conn: &Connection, slug: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE slug = ? COLLATE NOCASE",
        [slug],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Checks a category slug: well formed, not reserved, not taken by another
/// category regardless of case.
pub fn clean_slug(db: &Database, slug: &str, errors: &mut FormErrors) -> Result<()> {
    let slug = slug.trim();
    if slug.is_empty() {
        errors.add("slug", "This field is required.");
    } else if is_reserved(slug) || !validate_slug(slug) {
        errors.add("slug", "Enter correct slug");
    } else if slug_in_use(&*db.get()?, slug)? {
        errors.add("slug", format!("Slug {} already exists", slug));
    }
    Ok(())
}

pub fn create_category(db: &Database, input: &NewCategory) -> ServiceResult<Category> {
    let mut errors = FormErrors::new();
    required(&mut errors, "title", &input.title, Some(MAX_TITLE_LENGTH));
    let slug = input.slug.trim().to_lowercase();
    clean_slug(db, &slug, &mut errors)?;
    errors.into_result()?;

    let cover = input
        .cover
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY_COVER);

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO categories (title, slug, cover) VALUES (?, ?, ?)",
        (input.title.trim(), &slug, cover),
    )?;
    let id = conn.last_insert_rowid();
    let category = conn.query_row(
        "SELECT id, title, slug, cover, created_at FROM categories WHERE id = ?",
        [id],
        row_to_category,
    )?;
    tracing::info!("Created category '{}'", category.slug);
    Ok(category)
}

pub fn get_category(db: &Database, id: i64) -> Result<Option<Category>> {
    let conn = db.get()?;
    let category = conn
        .query_row(
            "SELECT id, title, slug, cover, created_at FROM categories WHERE id = ?",
            [id],
            row_to_category,
        )
        .optional()?;
    Ok(category)
}

pub fn get_category_by_slug(db: &Database, slug: &str) -> Result<Option<Category>> {
    let conn = db.get()?;
    let category = conn
        .query_row(
            "SELECT id, title, slug, cover, created_at FROM categories WHERE slug = ? COLLATE NOCASE",
            [slug],
            row_to_category,
        )
        .optional()?;
    Ok(category)
}

pub fn list_categories(db: &Database) -> Result<Vec<Category>> {
    let conn = db.get()?;
    let mut stmt =
        conn.prepare("SELECT id, title, slug, cover, created_at FROM categories ORDER BY title")?;
    let categories = stmt
        .query_map([], row_to_category)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn list_categories_with_counts(db: &Database) -> Result<Vec<CategoryWithCount>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT c.id, c.title, c.slug, c.cover, c.created_at, COUNT(p.id) AS posts_count
        FROM categories c
        LEFT JOIN posts p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.title
        "#,
    )?;
    let categories = stmt
        .query_map([], |row| {
            Ok(CategoryWithCount {
                category: row_to_category(row)?,
                posts_count: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}
