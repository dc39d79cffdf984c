use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// Like state of one item as seen by the current client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeState {
    pub item: u64,
    pub liked: bool,
    pub like_count: u64,
}

/// Flip the current client's like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LikeCount {
    #[serde(default)]
    pub like_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LikeStatus {
    pub has_liked: bool,
}

/// Comments carry no identifier on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub client_id: u64,
    pub text: String,
    #[serde(default, with = "wire::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_name: Option<String>,
}

/// The comments endpoint has answered both with a bare list and with
/// `{"comments": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentList {
    Wrapped { comments: Vec<Comment> },
    Bare(Vec<Comment>),
}

impl CommentList {
    pub fn into_vec(self) -> Vec<Comment> {
        match self {
            CommentList::Wrapped { comments } => comments,
            CommentList::Bare(comments) => comments,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemRef {
    pub item_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentCreate {
    pub item_id: u64,
    pub text: String,
}
