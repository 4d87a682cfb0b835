//! storekit_core - types shared by the storekit client and its store backends.
//!
//! Everything in this crate is pure: descriptors, the native entity model,
//! identifier encoding, codecs and the traits a store backend implements.
//! Network and storage code lives in the `storekit` crate.

pub mod codec;
pub mod entity;
pub mod model;
pub mod store;
