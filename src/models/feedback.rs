use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub date: String,
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | ({})", self.name, self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewFeedback {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}
