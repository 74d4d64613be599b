use super::AuthorSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub date: String,
    pub author: AuthorSummary,
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.author.full_name, self.text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    pub text: String,
    pub date: String,
    pub author: AuthorSummary,
    /// Author of the comment being replied to.
    pub addressee: AuthorSummary,
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] to [{}]: \"{}\"",
            self.author.full_name, self.addressee.full_name, self.text
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub post: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NewReply {
    pub comment: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: Option<i64>,
}
