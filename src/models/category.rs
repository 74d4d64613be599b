use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_COVER: &str = "static/images/categories/default-category-image.jpg";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub cover: String,
    pub created_at: String,
}

impl Category {
    pub fn url(&self) -> String {
        format!("/category/{}", self.slug)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub posts_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub cover: Option<String>,
}
