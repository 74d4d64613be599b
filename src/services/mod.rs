pub mod auth;
pub mod categories;
pub mod comments;
pub mod feedback;
pub mod likes;
pub mod mail;
pub mod pagination;
pub mod pins;
pub mod posts;
pub mod search;
pub mod slug;
pub mod tags;
pub mod validation;
