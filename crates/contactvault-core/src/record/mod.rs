//! Acyclic mirror of the live tree, used only for persistence.
//!
//! Records own their children directly and carry no parent link, so any
//! serde format can walk them. Conversion in both directions preserves
//! names, timestamps, relation and child order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::tree::{
    Contact, FolderId, Item, ItemKind, ItemMeta, Relation, Tree, TreeError, TreeResult,
};

/// A persisted folder and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub items: Vec<ItemRecord>,
}

/// A persisted contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub first_name: String,
    pub company: String,
    pub relation: Relation,
    pub mail_address: String,
}

/// A persisted child of a folder.
///
/// Externally tagged so that both self-describing and compact binary
/// formats can tell the two kinds apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemRecord {
    Folder(FolderRecord),
    Contact(ContactRecord),
}

impl FolderRecord {
    /// Total number of records below this folder, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                ItemRecord::Folder(folder) => 1 + folder.descendant_count(),
                ItemRecord::Contact(_) => 1,
            })
            .sum()
    }
}

/// Flatten the subtree rooted at `folder` into records.
pub fn to_record(tree: &Tree, folder: FolderId) -> TreeResult<FolderRecord> {
    let item = tree.item(folder)?;
    let mut record = FolderRecord {
        name: item.name().to_string(),
        created_at: item.created_at(),
        modified_at: item.modified_at(),
        items: Vec::with_capacity(tree.folder(folder)?.len()),
    };

    for child in tree.items(folder) {
        let entry = tree.item(child)?;
        let child_record = match entry.kind() {
            ItemKind::Folder(_) => {
                let id = tree
                    .as_folder_id(child)
                    .ok_or(TreeError::StaleHandle(child))?;
                ItemRecord::Folder(to_record(tree, id)?)
            }
            ItemKind::Contact(contact) => ItemRecord::Contact(contact_record(entry, contact)),
        };
        record.items.push(child_record);
    }
    Ok(record)
}

fn contact_record(item: &Item, contact: &Contact) -> ContactRecord {
    ContactRecord {
        name: item.name().to_string(),
        created_at: item.created_at(),
        modified_at: item.modified_at(),
        first_name: contact.first_name().to_string(),
        company: contact.company().to_string(),
        relation: contact.relation(),
        mail_address: contact.mail_address().to_string(),
    }
}

/// Rebuild a live tree from a root record.
///
/// Records are trusted: names and fields are not re-validated and
/// timestamps are restored verbatim.
pub fn into_tree(record: FolderRecord) -> Tree {
    let FolderRecord {
        name,
        created_at,
        modified_at,
        items,
    } = record;
    let mut tree = Tree::with_root(ItemMeta::restored(name, created_at, modified_at));
    let root = tree.root();

    let mut pending = vec![(root, items)];
    while let Some((folder, items)) = pending.pop() {
        for item in items {
            match item {
                ItemRecord::Folder(child) => {
                    let meta = ItemMeta::restored(child.name, child.created_at, child.modified_at);
                    let id = tree.attach_restored(folder, Item::folder(meta));
                    pending.push((FolderId(id), child.items));
                }
                ItemRecord::Contact(child) => {
                    let meta = ItemMeta::restored(child.name, child.created_at, child.modified_at);
                    let contact = Contact {
                        first_name: child.first_name,
                        company: child.company,
                        relation: child.relation,
                        mail_address: child.mail_address,
                    };
                    tree.attach_restored(folder, Item::contact(meta, contact));
                }
            }
        }
    }
    trace!(items = tree.len(), "Rebuilt tree from records");
    tree
}
