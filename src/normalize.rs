//! Raw item -> record. Pure; no I/O.

use crate::date::to_local_row_time;
use crate::error::NormalizeError;
use crate::models::{
    ItemKind, PostRecord, RawPost, RawReaction, RawShares, RawSummarized, ReactionRecord, Record,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn decode<T: DeserializeOwned>(raw: &Value, kind: &'static str) -> Result<T, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::Malformed { kind, message: format!("expected object, got {}", raw) });
    }
    serde_json::from_value::<T>(raw.clone()).map_err(|e| NormalizeError::Malformed { kind, message: e.to_string() })
}

fn required(v: &Option<String>, field: &'static str) -> Result<String, NormalizeError> {
    v.clone().ok_or(NormalizeError::MissingField(field))
}

fn timestamp(v: &Option<String>, field: &'static str) -> Result<String, NormalizeError> {
    let raw = v.as_deref().ok_or(NormalizeError::MissingField(field))?;
    to_local_row_time(raw).ok_or_else(|| NormalizeError::BadTimestamp { field, value: raw.to_string() })
}

// Absent edge -> 0; present edge must carry the full summary path.
fn summary_count(edge: &Option<RawSummarized>, path: &'static str) -> Result<u64, NormalizeError> {
    match edge {
        None => Ok(0),
        Some(e) => e
            .summary
            .as_ref()
            .and_then(|s| s.total_count)
            .ok_or(NormalizeError::MissingField(path)),
    }
}

fn share_count(shares: &Option<RawShares>) -> Result<u64, NormalizeError> {
    match shares {
        None => Ok(0),
        Some(s) => s.count.ok_or(NormalizeError::MissingField("shares.count")),
    }
}

pub fn normalize_post(post: &RawPost) -> Result<PostRecord, NormalizeError> {
    let post_id = required(&post.id, "id")?;
    let from = post.from.as_ref().ok_or(NormalizeError::MissingField("from"))?;
    let poster_id = required(&from.id, "from.id")?;
    let poster_name = required(&from.name, "from.name")?;
    let post_type = required(&post.kind, "type")?;
    let post_published = timestamp(&post.created_time, "created_time")?;
    let update_time = timestamp(&post.updated_time, "updated_time")?;

    Ok(PostRecord {
        post_id,
        post_message: post.message.clone().unwrap_or_default(),
        poster_id,
        poster_name,
        link_name: post.name.clone().unwrap_or_default(),
        post_type,
        post_link: post.link.clone().unwrap_or_default(),
        post_published,
        num_likes: summary_count(&post.likes, "likes.summary.total_count")?,
        num_comments: summary_count(&post.comments, "comments.summary.total_count")?,
        num_shares: share_count(&post.shares)?,
        update_time,
    })
}

/// Reaction items don't carry their post; the scan supplies it.
pub fn normalize_reaction(reaction: &RawReaction, post_id: &str) -> Result<ReactionRecord, NormalizeError> {
    Ok(ReactionRecord {
        user_id: required(&reaction.id, "id")?,
        user_name: required(&reaction.name, "name")?,
        reaction_type: required(&reaction.kind, "type")?,
        post_id: post_id.to_string(),
    })
}

pub fn post_from_value(raw: &Value) -> Result<PostRecord, NormalizeError> {
    normalize_post(&decode::<RawPost>(raw, "post")?)
}

pub fn reaction_from_value(raw: &Value, post_id: &str) -> Result<ReactionRecord, NormalizeError> {
    normalize_reaction(&decode::<RawReaction>(raw, "reaction")?, post_id)
}

/// Dispatch on item kind. `post_id` is only consulted for reactions.
pub fn normalize(raw: &Value, kind: ItemKind, post_id: &str) -> Result<Record, NormalizeError> {
    match kind {
        ItemKind::Post => post_from_value(raw).map(Record::Post),
        ItemKind::Reaction => reaction_from_value(raw, post_id).map(Record::Reaction),
    }
}
