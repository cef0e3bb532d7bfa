//! Error types for the contactvault crate
//!
//! Every module defines its own error enum. They are collected here so that
//! callers can import them from one place.

pub use crate::codec::CodecError;
pub use crate::config::ConfigError;
pub use crate::crypto::CipherError;
pub use crate::session::{LoadError, SaveError};
pub use crate::store::StoreError;
pub use crate::tree::contact::ParseRelationError;
pub use crate::tree::{TreeError, TreeResult};
