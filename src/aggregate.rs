//! Per-user reaction aggregates and per-post reaction snapshots, kept in a `DocumentStore`.
//!
//! Pages can be redelivered (a retry after a partial failure, or a full re-run), so both
//! operations are idempotent: a user's reactions form a set keyed by `(post_id, type)`,
//! and a post snapshot is replaced wholesale.

use crate::error::StoreError;
use crate::models::ReactionRecord;
use crate::store::{DocumentStore, POST_REACTIONS, USER_REACTIONS};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReactionEntry {
    #[serde(rename = "type")]
    pub reaction_type: String,
    pub post_id: String,
}

/// Document in `user_reactions`, keyed by user id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub name: String,
    #[serde(default)]
    pub reactions: Vec<ReactionEntry>,
}

impl UserAggregate {
    /// Add the entry unless an equal one is present. Returns true if it was added.
    pub fn insert(&mut self, entry: ReactionEntry) -> bool {
        if self.reactions.contains(&entry) {
            false
        } else {
            self.reactions.push(entry);
            true
        }
    }
}

/// Document in `post_reactions`, keyed by post id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReactionsSnapshot {
    pub post_id: String,
    pub reactions: Vec<ReactionRecord>,
}

pub struct ReactionAggregator<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ReactionAggregator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Upsert one reaction into the user's aggregate, creating it if needed and
    /// overwriting the display name. Returns whether a new `(type, post)` entry was stored.
    pub fn merge_reaction(
        &mut self,
        user_id: &str,
        user_name: &str,
        reaction_type: &str,
        post_id: &str,
    ) -> Result<bool, StoreError> {
        let mut agg = self.user(user_id)?.unwrap_or_default();
        let added = agg.insert(ReactionEntry { reaction_type: reaction_type.to_string(), post_id: post_id.to_string() });
        let renamed = agg.name != user_name;
        if !added && !renamed {
            return Ok(false);
        }
        agg.name = user_name.to_string();
        self.store.put(USER_REACTIONS, user_id, serde_json::to_value(&agg)?)?;
        Ok(added)
    }

    pub fn merge_record(&mut self, r: &ReactionRecord) -> Result<bool, StoreError> {
        self.merge_reaction(&r.user_id, &r.user_name, &r.reaction_type, &r.post_id)
    }

    /// Write (or replace) the full reaction list collected for `post_id`.
    pub fn snapshot_post_reactions(&mut self, post_id: &str, reactions: &[ReactionRecord]) -> Result<(), StoreError> {
        let snap = PostReactionsSnapshot { post_id: post_id.to_string(), reactions: reactions.to_vec() };
        self.store.put(POST_REACTIONS, post_id, serde_json::to_value(&snap)?)
    }

    pub fn user(&self, user_id: &str) -> Result<Option<UserAggregate>, StoreError> {
        match self.store.get(USER_REACTIONS, user_id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub fn post_snapshot(&self, post_id: &str) -> Result<Option<PostReactionsSnapshot>, StoreError> {
        match self.store.get(POST_REACTIONS, post_id)? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn r(user: &str, kind: &str, post: &str) -> ReactionRecord {
        ReactionRecord { user_id: user.into(), user_name: format!("{user} name"), reaction_type: kind.into(), post_id: post.into() }
    }

    #[test]
    fn repeated_merge_stores_one_entry() {
        let mut agg = ReactionAggregator::new(MemoryStore::new());
        assert!(agg.merge_reaction("U1", "Ann", "LOVE", "P1").unwrap());
        assert!(!agg.merge_reaction("U1", "Ann", "LOVE", "P1").unwrap());
        let u = agg.user("U1").unwrap().unwrap();
        assert_eq!(u.reactions, vec![ReactionEntry { reaction_type: "LOVE".into(), post_id: "P1".into() }]);
    }

    #[test]
    fn distinct_pairs_accumulate_and_name_is_overwritten() {
        let mut agg = ReactionAggregator::new(MemoryStore::new());
        agg.merge_reaction("U1", "Ann", "LOVE", "P1").unwrap();
        agg.merge_reaction("U1", "Ann", "LIKE", "P1").unwrap();
        agg.merge_reaction("U1", "Ann B.", "LOVE", "P2").unwrap();
        assert!(!agg.merge_reaction("U1", "Annie", "LIKE", "P1").unwrap());
        let u = agg.user("U1").unwrap().unwrap();
        assert_eq!(u.name, "Annie");
        assert_eq!(u.reactions.len(), 3);
    }

    #[test]
    fn snapshot_replaces() {
        let mut agg = ReactionAggregator::new(MemoryStore::new());
        agg.snapshot_post_reactions("P1", &[r("U1", "LIKE", "P1"), r("U2", "WOW", "P1")]).unwrap();
        agg.snapshot_post_reactions("P1", &[r("U3", "SAD", "P1")]).unwrap();
        let snap = agg.post_snapshot("P1").unwrap().unwrap();
        assert_eq!(snap.reactions, vec![r("U3", "SAD", "P1")]);
        assert_eq!(agg.store().len(POST_REACTIONS), 1);
    }

    #[test]
    fn stored_document_shape() {
        let mut agg = ReactionAggregator::new(MemoryStore::new());
        agg.merge_record(&r("U1", "HAHA", "P9")).unwrap();
        let doc = agg.store().get(USER_REACTIONS, "U1").unwrap().unwrap();
        assert_eq!(doc, serde_json::json!({"name": "U1 name", "reactions": [{"type": "HAHA", "post_id": "P9"}]}));
    }
}
