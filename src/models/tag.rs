use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub created_at: String,
}

impl Tag {
    pub fn url(&self) -> String {
        format!("/tag/{}", self.slug)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTag {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
}
