use super::{AuthorSummary, Category, CommentThread, Tag};
use serde::Serialize;

pub const DEFAULT_POST_COVER: &str = "static/images/posts/default-post-image.jpg";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub slug: String,
    pub cover: String,
    pub date: String,
    pub category_id: i64,
    pub author_id: i64,
    pub views: i64,
}

impl Post {
    pub fn url(&self) -> String {
        format!("/post/{}", self.slug)
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostWithRelations {
    #[serde(flatten)]
    pub post: Post,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub author: AuthorSummary,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostWithRelations,
    pub comments: Vec<CommentThread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

/// Entry of the "popular this month" feed.
#[derive(Debug, Clone, Serialize)]
pub struct PopularPost {
    pub title: String,
    pub url: String,
    pub image: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub category_id: i64,
    pub tag_ids: Vec<i64>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i64,
}
