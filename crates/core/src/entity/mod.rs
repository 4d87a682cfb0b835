mod key;
mod types;
mod value;

pub use key::{decode_id, encode_id, NativeKey, KEY_PROPERTY};
pub use types::{Entity, EntityWrite, SaveMethod};
pub use value::{Fields, Value};
