//! Conversion between typed records and entity property maps.

mod json;
mod traits;

pub use json::{value_from_json, value_to_json, JsonCodec};
pub use traits::Codec;
