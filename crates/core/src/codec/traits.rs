use crate::entity::Fields;
use crate::store::Result;

/// Converts records of type `T` to and from property maps.
///
/// Implementations report failures as [`StoreError::Codec`](crate::store::StoreError::Codec).
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Fields>;

    fn decode(&self, fields: Fields) -> Result<T>;
}
