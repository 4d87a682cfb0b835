use std::fmt;

use super::{Fields, NativeKey};

/// How a save treats an existing entity with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveMethod {
    /// Fails if the key already exists.
    Insert,
    /// Fails if the key does not exist.
    Update,
    /// Always writes.
    Upsert,
}

impl SaveMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveMethod::Insert => "insert",
            SaveMethod::Update => "update",
            SaveMethod::Upsert => "upsert",
        }
    }
}

impl fmt::Display for SaveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: NativeKey,
    pub data: Fields,
}

impl Entity {
    pub fn new(key: NativeKey, data: Fields) -> Self {
        Self { key, data }
    }
}

/// An entity to be written, with its indexing and conflict rules.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWrite {
    pub entity: Entity,
    /// Properties the store must not index.
    pub exclude_from_indexes: Vec<String>,
    pub method: SaveMethod,
}

impl EntityWrite {
    pub fn key(&self) -> &NativeKey {
        &self.entity.key
    }
}
