//! Typed handles into a [`Tree`](super::Tree).
//!
//! Items never hold references to each other. A folder's children and an
//! item's parent are stored as handles, so the live tree stays free of
//! ownership cycles. Every handle carries the identity of the tree that
//! issued it, which is how cross-tree misuse is detected, and the generation
//! of its slot, which is how handles to removed items are detected once the
//! slot has been reused.

use std::fmt;

use uuid::Uuid;

/// Identity of one [`Tree`](super::Tree) instance.
///
/// Two trees never share an identity, even when one is rebuilt from the
/// other's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(Uuid);

impl TreeId {
    pub(crate) fn generate() -> Self {
        TreeId(Uuid::new_v4())
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to any item (folder or contact) of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub(crate) tree: TreeId,
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl ItemId {
    pub(crate) fn new(tree: TreeId, index: usize, generation: u32) -> Self {
        ItemId {
            tree,
            index,
            generation,
        }
    }

    /// The tree this handle was issued by.
    #[inline]
    pub fn tree(&self) -> TreeId {
        self.tree
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Handle that is statically known to point at a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(pub(crate) ItemId);

impl FolderId {
    #[inline]
    pub fn item(self) -> ItemId {
        self.0
    }

    #[inline]
    pub fn tree(&self) -> TreeId {
        self.0.tree
    }
}

/// Handle that is statically known to point at a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactId(pub(crate) ItemId);

impl ContactId {
    #[inline]
    pub fn item(self) -> ItemId {
        self.0
    }

    #[inline]
    pub fn tree(&self) -> TreeId {
        self.0.tree
    }
}

impl From<FolderId> for ItemId {
    fn from(id: FolderId) -> Self {
        id.0
    }
}

impl From<ContactId> for ItemId {
    fn from(id: ContactId) -> Self {
        id.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder {}", self.0)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contact {}", self.0)
    }
}
