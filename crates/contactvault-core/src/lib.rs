//! Password-protected hierarchical address book.
//!
//! Folders and contacts form a tree addressed by `/`-separated paths. The
//! whole tree is saved to a single file, encrypted with a key derived from a
//! password.
//!
//! - [`tree`]: the live tree and path resolution
//! - [`record`]: the acyclic form used for persistence
//! - [`codec`], [`crypto`], [`store`]: bytes, encryption and the save file
//! - [`session`]: current folder, load/save and the retry lockout

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod record;
pub mod session;
pub mod store;
pub mod tree;

// Re-export commonly used types at crate root
pub use codec::{BinaryCodec, Codec, CodecKind, JsonCodec};
pub use config::{SessionConfig, Settings};
pub use crypto::{Aes256CtrCipher, Aes256GcmCipher, Cipher, CipherKind, DerivedKey, Iv};
pub use record::{ContactRecord, FolderRecord, ItemRecord};
pub use session::{LoadError, SaveError, Session};
pub use store::{EncryptedStore, StoreError};
pub use tree::{ContactDraft, ContactId, ContactUpdate, FolderId, Relation, Tree, TreeError};
