//! Document store port plus two backends: in-memory, and one-JSON-file-per-document on disk.
//!
//! Every `put` is its own unit of work; there is no transactional grouping.

use crate::error::StoreError;
use crate::util::{create_with_backoff, part_path_for, replace_file_atomic_backoff};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const USER_REACTIONS: &str = "user_reactions";
pub const POST_REACTIONS: &str = "post_reactions";

/// Keyed JSON documents grouped into named collections.
pub trait DocumentStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;
    /// Insert or replace.
    fn put(&mut self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError>;
    /// Keys of a collection, sorted.
    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(collection, key)
    }
    fn put(&mut self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        (**self).put(collection, key, doc)
    }
    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys(collection)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.collections.get(collection).and_then(|c| c.get(key)).cloned())
    }

    fn put(&mut self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        self.collections.entry(collection.to_string()).or_default().insert(key.to_string(), doc);
        Ok(())
    }

    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.collections.get(collection).map(|c| c.keys().cloned().collect()).unwrap_or_default())
    }
}

/// `<root>/<collection>/<encoded key>.json`, written via a `.part` file and renamed into place.
pub struct JsonDirStore {
    root: PathBuf,
    pretty: bool,
}

/// Keys are graph ids (digits and `_`), but anything outside `[A-Za-z0-9_.-]` is %-encoded
/// so arbitrary keys map to distinct, valid file names.
fn encode_key(key: &str) -> String {
    let mut s = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || (b == b'.' && !s.is_empty()) {
            s.push(b as char);
        } else {
            s.push_str(&format!("%{:02X}", b));
        }
    }
    s
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

impl JsonDirStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, pretty: false })
    }

    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    fn doc_path(&self, collection: &str, key: &str) -> PathBuf {
        self.root.join(encode_key(collection)).join(format!("{}.json", encode_key(key)))
    }
}

impl DocumentStore for JsonDirStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let p = self.doc_path(collection, key);
        match fs::read(&p) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        let p = self.doc_path(collection, key);
        if let Some(dir) = p.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = part_path_for(&p);
        let mut w = BufWriter::new(create_with_backoff(&tmp, 16, 50)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut w, &doc)?;
        } else {
            serde_json::to_writer(&mut w, &doc)?;
        }
        w.flush()?;
        drop(w);
        replace_file_atomic_backoff(&tmp, &p).map_err(|e| StoreError::Backend(format!("{e:#}")))
    }

    fn keys(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(encode_key(collection));
        let rd = match fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys: Vec<String> = rd
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().and_then(|n| n.strip_suffix(".json")).and_then(decode_key))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
