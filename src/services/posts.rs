use crate::models::{
    Account, AuthorSummary, NewPost, PopularPost, Post, PostDetail, PostWithRelations, Tag,
    UserRole, DEFAULT_POST_COVER,
};
use crate::services::categories::{get_category, row_to_category};
use crate::services::pagination::{Page, PageWindow};
use crate::services::slug::{post_slug, slug_suffix, SlugClock};
use crate::services::tags::{missing_tag_ids, row_to_tag};
use crate::services::validation::{required, FormErrors, ServiceError, ServiceResult};
use crate::services::{comments, likes, pins};
use crate::Database;
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

const MAX_TITLE_LENGTH: usize = 200;

/// Attempts at a fresh slug when another clock already used the suffix.
const SLUG_ATTEMPTS: usize = 3;

const POST_SELECT: &str =
    "SELECT p.id, p.title, p.body, p.slug, p.cover, p.date, p.category_id, p.author_id, p.views FROM posts p";

pub(crate) fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        slug: row.get(3)?,
        cover: row.get(4)?,
        date: row.get(5)?,
        category_id: row.get(6)?,
        author_id: row.get(7)?,
        views: row.get(8)?,
    })
}

/// Which posts a listing covers.
#[derive(Debug, Clone)]
pub enum PostFilter {
    All,
    Category(i64),
    Tag(i64),
    Author(i64),
    LikedBy(i64),
    /// Case-insensitive substring of title or body.
    Containing(String),
}

impl PostFilter {
    fn clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::All => ("1=1", vec![]),
            Self::Category(id) => ("p.category_id = ?", vec![Value::Integer(*id)]),
            Self::Tag(id) => (
                "p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ?)",
                vec![Value::Integer(*id)],
            ),
            Self::Author(id) => ("p.author_id = ?", vec![Value::Integer(*id)]),
            Self::LikedBy(id) => (
                "p.id IN (SELECT post_id FROM post_likes WHERE profile_id = ?)",
                vec![Value::Integer(*id)],
            ),
            Self::Containing(query) => {
                let pattern = format!("%{}%", escape_like(query));
                (
                    r"(p.title LIKE ? ESCAPE '\' OR p.body LIKE ? ESCAPE '\')",
                    vec![Value::Text(pattern.clone()), Value::Text(pattern)],
                )
            }
        }
    }
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn validate(db: &Database, input: &NewPost) -> Result<FormErrors> {
    let mut errors = FormErrors::new();
    required(&mut errors, "title", &input.title, Some(MAX_TITLE_LENGTH));
    required(&mut errors, "body", &input.body, None);

    if get_category(db, input.category_id)?.is_none() {
        errors.add(
            "category",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    for id in missing_tag_ids(db, &input.tag_ids)? {
        errors.add(
            "tags",
            format!(
                "Select a valid choice. {} is not one of the available choices.",
                id
            ),
        );
    }
    Ok(errors)
}

fn cover_or_default(cover: Option<&str>) -> Option<&str> {
    cover.map(str::trim).filter(|c| !c.is_empty())
}

fn replace_tags(conn: &Connection, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?", [post_id])?;
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)",
            (post_id, tag_id),
        )?;
    }
    Ok(())
}

/// Publishes a post for `author_id` (a profile id). The slug is always
/// derived from the title on the server.
pub fn create_post(
    db: &Database,
    clock: &SlugClock,
    input: &NewPost,
    author_id: i64,
) -> ServiceResult<Post> {
    validate(db, input)?.into_result()?;

    let mut attempt = 1;
    loop {
        let slug = post_slug(input.title.trim(), clock);
        match insert_post(db, &slug, input, author_id) {
            Err(err) if attempt < SLUG_ATTEMPTS && is_unique_violation(&err) => {
                tracing::warn!("Slug '{}' already taken, resyncing slug clock", slug);
                clock.advance_past(latest_slug_suffix(db)?);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
            Ok(post) => {
                tracing::info!("Created post '{}'", post.slug);
                return Ok(post);
            }
        }
    }
}

fn insert_post(
    db: &Database,
    slug: &str,
    input: &NewPost,
    author_id: i64,
) -> Result<Post> {
    let cover = cover_or_default(input.cover.as_deref()).unwrap_or(DEFAULT_POST_COVER);

    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (title, body, slug, cover, category_id, author_id) VALUES (?, ?, ?, ?, ?, ?)",
        (
            input.title.trim(),
            &input.body,
            slug,
            cover,
            input.category_id,
            author_id,
        ),
    )?;
    let post_id = tx.last_insert_rowid();
    replace_tags(&tx, post_id, &input.tag_ids)?;
    let post = tx.query_row(
        &format!("{} WHERE p.id = ?", POST_SELECT),
        [post_id],
        row_to_post,
    )?;
    tx.commit()?;
    Ok(post)
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Highest clock suffix among stored post slugs, or 0 without posts.
pub fn latest_slug_suffix(db: &Database) -> Result<i64> {
    let conn = db.get()?;
    let mut stmt = conn.prepare("SELECT slug FROM posts")?;
    let slugs = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut latest = 0;
    for slug in slugs {
        if let Some(suffix) = slug_suffix(&slug?) {
            latest = latest.max(suffix);
        }
    }
    Ok(latest)
}

/// Rewrites a post's content. The slug it was published under is kept.
pub fn update_post(db: &Database, slug: &str, input: &NewPost) -> ServiceResult<Post> {
    let current = get_post_by_slug(db, slug)?.ok_or(ServiceError::NotFound("Post"))?;
    validate(db, input)?.into_result()?;

    let cover = cover_or_default(input.cover.as_deref()).unwrap_or(current.cover.as_str());

    let mut conn = db.get()?;
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE posts SET title = ?, body = ?, cover = ?, category_id = ? WHERE id = ?",
        (
            input.title.trim(),
            &input.body,
            cover,
            input.category_id,
            current.id,
        ),
    )?;
    replace_tags(&tx, current.id, &input.tag_ids)?;
    let post = tx.query_row(
        &format!("{} WHERE p.id = ?", POST_SELECT),
        [current.id],
        row_to_post,
    )?;
    tx.commit()?;
    Ok(post)
}

pub fn delete_post(db: &Database, slug: &str) -> ServiceResult<()> {
    let conn = db.get()?;
    let affected = conn.execute("DELETE FROM posts WHERE slug = ?", [slug])?;
    if affected == 0 {
        return Err(ServiceError::NotFound("Post"));
    }
    tracing::info!("Deleted post '{}'", slug);
    Ok(())
}

pub fn get_post_by_slug(db: &Database, slug: &str) -> Result<Option<Post>> {
    let conn = db.get()?;
    let post = conn
        .query_row(
            &format!("{} WHERE p.slug = ?", POST_SELECT),
            [slug],
            row_to_post,
        )
        .optional()?;
    Ok(post)
}

pub fn post_exists(db: &Database, post_id: i64) -> Result<bool> {
    let conn = db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE id = ?",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Admins may change any post; authors only their own.
pub fn can_modify(account: &Account, post: &Post) -> bool {
    match account.user.role {
        UserRole::Admin => true,
        UserRole::Author => post.author_id == account.profile.id,
        UserRole::Reader => false,
    }
}

pub(crate) fn enrich(conn: &Connection, post: Post) -> Result<PostWithRelations> {
    let category = conn.query_row(
        "SELECT id, title, slug, cover, created_at FROM categories WHERE id = ?",
        [post.category_id],
        row_to_category,
    )?;

    let mut tag_stmt = conn.prepare(
        "SELECT t.id, t.title, t.slug, t.created_at FROM tags t JOIN post_tags pt ON t.id = pt.tag_id WHERE pt.post_id = ? ORDER BY t.title",
    )?;
    let tags: Vec<Tag> = tag_stmt
        .query_map([post.id], row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;

    let author = conn.query_row(
        "SELECT p.id, u.username, p.full_name FROM profiles p JOIN users u ON u.id = p.user_id WHERE p.id = ?",
        [post.author_id],
        |row| {
            Ok(AuthorSummary {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
            })
        },
    )?;

    let likes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?",
        [post.id],
        |row| row.get(0),
    )?;

    Ok(PostWithRelations {
        post,
        category,
        tags,
        author,
        likes,
    })
}

pub fn get_post_with_relations(db: &Database, slug: &str) -> Result<Option<PostWithRelations>> {
    let conn = db.get()?;
    let post = conn
        .query_row(
            &format!("{} WHERE p.slug = ?", POST_SELECT),
            [slug],
            row_to_post,
        )
        .optional()?;
    post.map(|p| enrich(&conn, p)).transpose()
}

/// Counts a view of the post and returns everything its page shows.
/// `viewer` is the profile of a signed-in reader, if any.
pub fn view_post(db: &Database, slug: &str, viewer: Option<i64>) -> Result<Option<PostDetail>> {
    {
        let conn = db.get()?;
        conn.execute("UPDATE posts SET views = views + 1 WHERE slug = ?", [slug])?;
    }

    let post = match get_post_with_relations(db, slug)? {
        Some(post) => post,
        None => return Ok(None),
    };

    let comments = comments::comments_for_post(db, post.post.id)?;
    let (is_liked, is_pinned) = match viewer {
        Some(profile_id) => (
            Some(likes::is_liked(db, post.post.id, profile_id)?),
            Some(pins::is_pinned(db, post.post.id)?),
        ),
        None => (None, None),
    };

    Ok(Some(PostDetail {
        post,
        comments,
        is_liked,
        is_pinned,
    }))
}

/// Newest-first page of the posts matching `filter`. Requests past the last
/// page get the last page.
pub fn list_posts(
    db: &Database,
    filter: &PostFilter,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    let (clause, params) = filter.clause();
    let conn = db.get()?;

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p WHERE {}", clause),
        rusqlite::params_from_iter(params.iter()),
        |row| row.get(0),
    )?;
    let window = PageWindow::new(total.max(0) as usize, page, per_page);

    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} ORDER BY p.date DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_SELECT, clause
    ))?;
    let mut bound = params;
    bound.push(Value::Integer(window.limit() as i64));
    bound.push(Value::Integer(window.offset() as i64));
    let posts = stmt
        .query_map(rusqlite::params_from_iter(bound.iter()), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    let items = posts
        .into_iter()
        .map(|p| enrich(&conn, p))
        .collect::<Result<Vec<_>>>()?;
    Ok(window.fill(items))
}

/// The most viewed posts published in the calendar month of `today`.
pub fn popular_posts(
    db: &Database,
    today: chrono::NaiveDate,
    limit: usize,
) -> Result<Vec<PopularPost>> {
    let month = today.format("%Y-%m").to_string();
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "{} WHERE substr(p.date, 1, 7) = ? ORDER BY p.views DESC, p.id DESC LIMIT ?",
        POST_SELECT
    ))?;
    let posts = stmt
        .query_map((month, limit as i64), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(posts
        .into_iter()
        .map(|post| PopularPost {
            url: post.url(),
            date: display_date(&post.date),
            image: post.cover,
            title: post.title,
        })
        .collect())
}

/// Formats a stored timestamp as `Jan. 05, 2024`.
pub fn display_date(stored: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%b. %d, %Y").to_string())
        .unwrap_or_else(|_| stored.to_string())
}

pub fn list_posts_by_category(
    db: &Database,
    category_id: i64,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    list_posts(db, &PostFilter::Category(category_id), page, per_page)
}

pub fn list_posts_by_tag(
    db: &Database,
    tag_id: i64,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    list_posts(db, &PostFilter::Tag(tag_id), page, per_page)
}

pub fn list_posts_by_author(
    db: &Database,
    profile_id: i64,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    list_posts(db, &PostFilter::Author(profile_id), page, per_page)
}

pub fn list_liked_posts(
    db: &Database,
    profile_id: i64,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    list_posts(db, &PostFilter::LikedBy(profile_id), page, per_page)
}
