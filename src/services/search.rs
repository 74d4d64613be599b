use crate::models::PostWithRelations;
use crate::services::pagination::{Page, PageWindow};
use crate::services::posts::{list_posts, PostFilter};
use crate::Database;
use anyhow::Result;

/// Posts whose title or body contains `query`, newest first.
///
/// A blank query matches nothing and yields a single empty page.
pub fn search_posts(
    db: &Database,
    query: &str,
    page: usize,
    per_page: usize,
) -> Result<Page<PostWithRelations>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(PageWindow::new(0, page, per_page).fill(Vec::new()));
    }
    list_posts(db, &PostFilter::Containing(query.to_string()), page, per_page)
}
