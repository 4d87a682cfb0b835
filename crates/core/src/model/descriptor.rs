use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Codec, JsonCodec};
use crate::entity::NativeKey;

/// Describes how records of type `T` map to entities of one kind.
///
/// Build one per record type and share it; cloning is cheap.
pub struct ModelDescriptor<T> {
    /// The store kind records are written under.
    pub name: String,
    /// Field holding the record's identity.
    pub key: String,
    /// Fields the store must not index.
    pub excluded_indexes: Vec<String>,
    pub value_codec: Arc<dyn Codec<T>>,
}

impl<T: Serialize + DeserializeOwned + 'static> ModelDescriptor<T> {
    /// Creates a descriptor that encodes records through serde.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_codec(name, key, JsonCodec::new())
    }
}

impl<T> ModelDescriptor<T> {
    /// Creates a descriptor with a custom codec.
    pub fn with_codec(
        name: impl Into<String>,
        key: impl Into<String>,
        codec: impl Codec<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            excluded_indexes: Vec::new(),
            value_codec: Arc::new(codec),
        }
    }

    /// Marks fields as not indexed.
    pub fn with_excluded_indexes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_indexes
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Builds the native key for a record identity.
    pub fn native_key(&self, identity: impl Into<String>) -> NativeKey {
        NativeKey::new(&self.name, identity)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_indexes.iter().any(|f| f == field)
    }
}

impl<T> Clone for ModelDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            excluded_indexes: self.excluded_indexes.clone(),
            value_codec: Arc::clone(&self.value_codec),
        }
    }
}

impl<T> fmt::Debug for ModelDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("excluded_indexes", &self.excluded_indexes)
            .finish_non_exhaustive()
    }
}
