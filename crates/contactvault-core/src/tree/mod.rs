//! The live address-book tree: folders, contacts and path resolution.
//!
//! All items of one tree live in a single [`Tree`] arena. Folders refer to
//! their children, and every item to its parent, through typed handles
//! ([`FolderId`], [`ContactId`]) rather than references, so there is exactly
//! one owner (the arena) and no reference cycle.

pub mod contact;
pub mod folder;
pub mod id;
pub mod item;
pub mod path;
pub mod render;

use thiserror::Error;

pub use contact::{Contact, ContactDraft, ContactField, ContactUpdate, Relation};
pub use folder::Tree;
pub use id::{ContactId, FolderId, ItemId, TreeId};
pub use item::{Folder, Item, ItemKind, ItemMeta};
pub use render::render;

/// Errors raised by tree mutations and attribute validation.
///
/// Every failing operation leaves the tree exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    // =========================================================================
    // VALIDATION - rejected input, caller may retry with corrected values
    // =========================================================================
    /// An item name was empty or whitespace-only.
    #[error("The name cannot be empty")]
    EmptyName,

    /// A required contact field was empty or whitespace-only.
    #[error("The {0} cannot be empty")]
    EmptyField(ContactField),

    /// A folder name contained a path separator.
    #[error("The folder name '{0}' cannot contain '/' or '\\'")]
    InvalidNameCharacters(String),

    /// A mail address did not pass the email syntax check.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmailFormat(String),

    /// A sibling folder with the same name already exists.
    #[error("A folder with the name \"{0}\" already exists")]
    DuplicateName(String),

    // =========================================================================
    // OWNERSHIP - caller misuse of handles
    // =========================================================================
    /// The item already belongs to a folder and must be removed first.
    #[error("{0} already belongs to a folder, remove it first")]
    AlreadyOwned(ItemId),

    /// The item does not belong to the folder it was removed from.
    #[error("{item} does not belong to {folder}")]
    NotOwned { item: ItemId, folder: FolderId },

    /// The handle was issued by a different tree, or the folder is not
    /// reachable from this tree's root.
    #[error("{0} belongs to another tree")]
    CrossTreeReference(ItemId),

    /// The handle points at an item that has since been dropped.
    #[error("{0} no longer exists")]
    StaleHandle(ItemId),

    /// Adding the folder would make it its own ancestor.
    #[error("{item} cannot be placed inside its own subtree ({folder})")]
    CycleDetected { item: ItemId, folder: FolderId },

    /// The root folder can never be attached, detached or dropped.
    #[error("The root folder cannot be moved or removed")]
    RootNotMovable,
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
