//! Typed shapes for raw API items and the normalized records built from them.
//!
//! Raw shapes keep every field optional; the normalizer decides which absences are
//! defaults and which are errors.

use serde::{Deserialize, Serialize};

/// Column names for post rows, in output order.
pub const POST_COLUMNS: [&str; 12] = [
    "post_id",
    "post_message",
    "poster_id",
    "poster_name",
    "link_name",
    "post_type",
    "post_link",
    "post_published",
    "num_likes",
    "num_comments",
    "num_shares",
    "update_time",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Post,
    Reaction,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPost {
    pub id: Option<String>,
    pub message: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub link: Option<String>,
    pub from: Option<RawActor>,
    pub created_time: Option<String>,
    pub updated_time: Option<String>,
    pub likes: Option<RawSummarized>,
    pub comments: Option<RawSummarized>,
    pub shares: Option<RawShares>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawActor {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Edge requested with `.summary(true)`: `{ "data": [...], "summary": { "total_count": N } }`.
#[derive(Debug, Default, Deserialize)]
pub struct RawSummarized {
    pub summary: Option<RawSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSummary {
    pub total_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawShares {
    pub count: Option<u64>,
}

/// One entry of a post's `reactions` edge.
#[derive(Debug, Default, Deserialize)]
pub struct RawReaction {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Flattened post row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub post_message: String,
    pub poster_id: String,
    pub poster_name: String,
    pub link_name: String,
    pub post_type: String,
    pub post_link: String,
    pub post_published: String,
    pub num_likes: u64,
    pub num_comments: u64,
    pub num_shares: u64,
    pub update_time: String,
}

impl PostRecord {
    /// Cell values in `POST_COLUMNS` order.
    pub fn cells(&self) -> [String; 12] {
        [
            self.post_id.clone(),
            self.post_message.clone(),
            self.poster_id.clone(),
            self.poster_name.clone(),
            self.link_name.clone(),
            self.post_type.clone(),
            self.post_link.clone(),
            self.post_published.clone(),
            self.num_likes.to_string(),
            self.num_comments.to_string(),
            self.num_shares.to_string(),
            self.update_time.clone(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub user_id: String,
    pub user_name: String,
    pub reaction_type: String,
    pub post_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Post(PostRecord),
    Reaction(ReactionRecord),
}
