//! Shared item attributes and the closed set of item kinds.

use chrono::{DateTime, Utc};

use super::contact::Contact;
use super::id::{FolderId, ItemId};
use super::path::contains_separator;
use super::{TreeError, TreeResult};

/// Attributes every item carries: name and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    name: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl ItemMeta {
    /// Fresh metadata stamped with the current time.
    pub(crate) fn new(name: String) -> Self {
        let now = Utc::now();
        ItemMeta {
            name,
            created_at: now,
            modified_at: now,
        }
    }

    /// Metadata restored verbatim from a persisted record.
    pub(crate) fn restored(
        name: String,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        ItemMeta {
            name,
            created_at,
            modified_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Bump the modification time, never moving it backwards.
    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now().max(self.modified_at);
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
        self.touch();
    }
}

/// Folder-specific state: the ordered list of direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    pub(crate) children: Vec<ItemId>,
}

impl Folder {
    /// Direct children in insertion order.
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// What an item is. Folders and contacts are the only two kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Folder(Folder),
    Contact(Contact),
}

/// One node of the tree, as stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub(crate) meta: ItemMeta,
    pub(crate) parent: Option<FolderId>,
    pub(crate) kind: ItemKind,
}

impl Item {
    pub(crate) fn folder(meta: ItemMeta) -> Self {
        Item {
            meta,
            parent: None,
            kind: ItemKind::Folder(Folder::default()),
        }
    }

    pub(crate) fn contact(meta: ItemMeta, contact: Contact) -> Self {
        Item {
            meta,
            parent: None,
            kind: ItemKind::Contact(contact),
        }
    }

    pub fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.meta.modified_at()
    }

    /// The owning folder, or `None` while detached (and always for the root).
    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder(_))
    }

    pub fn is_contact(&self) -> bool {
        matches!(self.kind, ItemKind::Contact(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match &self.kind {
            ItemKind::Folder(folder) => Some(folder),
            ItemKind::Contact(_) => None,
        }
    }

    pub fn as_contact(&self) -> Option<&Contact> {
        match &self.kind {
            ItemKind::Contact(contact) => Some(contact),
            ItemKind::Folder(_) => None,
        }
    }
}

/// Validate a generic item name: must not be empty or whitespace-only.
pub(crate) fn validate_name(name: &str) -> TreeResult<()> {
    if name.trim().is_empty() {
        return Err(TreeError::EmptyName);
    }
    Ok(())
}

/// Validate a folder name: a valid item name without path separators.
pub(crate) fn validate_folder_name(name: &str) -> TreeResult<()> {
    validate_name(name)?;
    if contains_separator(name) {
        return Err(TreeError::InvalidNameCharacters(name.to_string()));
    }
    Ok(())
}
