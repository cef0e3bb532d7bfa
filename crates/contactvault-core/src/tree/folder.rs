//! The tree arena and every folder operation: containment, lookup and paths.
//!
//! # Ownership model
//!
//! The [`Tree`] owns every item in a slot vector. A folder's children are a
//! list of [`ItemId`]s and an item's parent is a [`FolderId`]. Freed slots
//! are reused, and each reuse bumps the slot's generation, so a handle to a
//! dropped item is detected as stale instead of aliasing the newer item.
//!
//! # Invariants
//!
//! - An item's `parent` is `Some(f)` exactly when `f`'s child list contains it.
//! - Among the direct children of a folder, folder names are unique
//!   (case-sensitive). Contacts may share names.
//! - The root has no parent and can never be attached to a folder.

use tracing::{debug, trace};

use super::contact::{
    ContactDraft, ContactField, ContactUpdate, Relation, validate_field, validate_mail_address,
};
use super::id::{ContactId, FolderId, ItemId, TreeId};
use super::item::{Folder, Item, ItemKind, ItemMeta, validate_folder_name, validate_name};
use super::path::{Segment, segments};
use super::{Contact, TreeError, TreeResult};

#[derive(Debug)]
struct Slot {
    generation: u32,
    item: Option<Item>,
}

/// Arena holding one address-book tree.
#[derive(Debug)]
pub struct Tree {
    id: TreeId,
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: FolderId,
    live: usize,
}

impl Tree {
    /// Create a tree with an empty root folder named `root_name`.
    pub fn new(root_name: impl Into<String>) -> TreeResult<Self> {
        let root_name = root_name.into();
        validate_folder_name(&root_name)?;
        Ok(Self::with_root(ItemMeta::new(root_name)))
    }

    /// Create a tree around pre-existing root metadata, skipping validation.
    pub(crate) fn with_root(meta: ItemMeta) -> Self {
        let id = TreeId::generate();
        let root = FolderId(ItemId::new(id, 0, 0));
        Tree {
            id,
            slots: vec![Slot {
                generation: 0,
                item: Some(Item::folder(meta)),
            }],
            free: Vec::new(),
            root,
            live: 1,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> FolderId {
        self.root
    }

    /// Number of live items, excluding the root. Detached items count.
    pub fn len(&self) -> usize {
        self.live - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a handle refers to a live item of this tree.
    pub fn contains(&self, id: impl Into<ItemId>) -> bool {
        self.slot(id.into()).is_ok()
    }

    // ==================== Access ====================

    fn slot(&self, id: ItemId) -> TreeResult<&Item> {
        if id.tree != self.id {
            return Err(TreeError::CrossTreeReference(id));
        }
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.item.as_ref())
            .ok_or(TreeError::StaleHandle(id))
    }

    fn slot_mut(&mut self, id: ItemId) -> TreeResult<&mut Item> {
        if id.tree != self.id {
            return Err(TreeError::CrossTreeReference(id));
        }
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.item.as_mut())
            .ok_or(TreeError::StaleHandle(id))
    }

    /// Look up any item.
    pub fn item(&self, id: impl Into<ItemId>) -> TreeResult<&Item> {
        self.slot(id.into())
    }

    /// Look up a folder's child list.
    pub fn folder(&self, id: FolderId) -> TreeResult<&Folder> {
        self.slot(id.0)?
            .as_folder()
            .ok_or(TreeError::StaleHandle(id.0))
    }

    /// Look up a contact's fields.
    pub fn contact(&self, id: ContactId) -> TreeResult<&Contact> {
        self.slot(id.0)?
            .as_contact()
            .ok_or(TreeError::StaleHandle(id.0))
    }

    /// Name of any item.
    pub fn name(&self, id: impl Into<ItemId>) -> TreeResult<&str> {
        Ok(self.slot(id.into())?.name())
    }

    /// Owning folder of an item, `None` for the root and detached items.
    pub fn parent(&self, id: impl Into<ItemId>) -> Option<FolderId> {
        self.slot(id.into()).ok()?.parent
    }

    /// Classify a generic handle as a folder handle.
    pub fn as_folder_id(&self, id: ItemId) -> Option<FolderId> {
        self.slot(id).ok()?.is_folder().then_some(FolderId(id))
    }

    /// Classify a generic handle as a contact handle.
    pub fn as_contact_id(&self, id: ItemId) -> Option<ContactId> {
        self.slot(id).ok()?.is_contact().then_some(ContactId(id))
    }

    fn children_of(&self, folder: FolderId) -> &[ItemId] {
        self.folder(folder)
            .map(Folder::children)
            .unwrap_or_default()
    }

    fn children_mut(&mut self, folder: FolderId) -> TreeResult<&mut Vec<ItemId>> {
        match &mut self.slot_mut(folder.0)?.kind {
            ItemKind::Folder(f) => Ok(&mut f.children),
            ItemKind::Contact(_) => Err(TreeError::StaleHandle(folder.0)),
        }
    }

    fn touch(&mut self, id: impl Into<ItemId>) -> TreeResult<()> {
        self.slot_mut(id.into())?.meta.touch();
        Ok(())
    }

    fn insert(&mut self, item: Item) -> ItemId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.item = Some(item);
            return ItemId::new(self.id, index, slot.generation);
        }
        self.slots.push(Slot {
            generation: 0,
            item: Some(item),
        });
        ItemId::new(self.id, self.slots.len() - 1, 0)
    }

    /// Number of allocated slots, live or free.
    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    // ==================== Factories ====================

    /// Create a detached folder. It must be added to a folder to be reachable.
    pub fn new_folder(&mut self, name: impl Into<String>) -> TreeResult<FolderId> {
        let name = name.into();
        validate_folder_name(&name)?;
        let id = self.insert(Item::folder(ItemMeta::new(name)));
        trace!(id = %id, "Created folder");
        Ok(FolderId(id))
    }

    /// Create a detached contact after validating every field of `draft`.
    pub fn new_contact(&mut self, draft: ContactDraft) -> TreeResult<ContactId> {
        draft.validate()?;
        let (name, contact) = draft.into_parts();
        let id = self.insert(Item::contact(ItemMeta::new(name), contact));
        trace!(id = %id, "Created contact");
        Ok(ContactId(id))
    }

    // ==================== Containment ====================

    /// Attach a detached item to `folder`.
    ///
    /// # Errors
    ///
    /// - [`TreeError::RootNotMovable`] if `item` is the root
    /// - [`TreeError::AlreadyOwned`] if `item` already has a parent
    /// - [`TreeError::CycleDetected`] if `folder` lies inside `item`'s subtree
    /// - [`TreeError::DuplicateName`] if `item` is a folder whose name is
    ///   already used by a child folder of `folder`
    pub fn add_item(&mut self, folder: FolderId, item: impl Into<ItemId>) -> TreeResult<()> {
        let item = item.into();
        self.folder(folder)?;
        let entry = self.slot(item)?;

        if item == self.root.0 {
            return Err(TreeError::RootNotMovable);
        }
        if entry.parent.is_some() {
            return Err(TreeError::AlreadyOwned(item));
        }
        if entry.is_folder() {
            if self.is_within(folder, item) {
                return Err(TreeError::CycleDetected { item, folder });
            }
            if self.child_folder(folder, entry.name()).is_some() {
                return Err(TreeError::DuplicateName(entry.name().to_string()));
            }
        }

        self.slot_mut(item)?.parent = Some(folder);
        self.children_mut(folder)?.push(item);
        self.touch(folder)?;
        debug!(folder = %folder, item = %item, "Added item");
        Ok(())
    }

    /// Detach `item` from `folder`. The item stays alive and can be re-added.
    pub fn remove_item(&mut self, folder: FolderId, item: impl Into<ItemId>) -> TreeResult<()> {
        let item = item.into();
        self.folder(folder)?;
        if self.slot(item)?.parent != Some(folder) {
            return Err(TreeError::NotOwned { item, folder });
        }
        self.detach(folder, item)?;
        self.touch(folder)?;
        debug!(folder = %folder, item = %item, "Removed item");
        Ok(())
    }

    /// Drop a detached item together with its whole subtree.
    pub fn discard(&mut self, item: impl Into<ItemId>) -> TreeResult<()> {
        let item = item.into();
        if item == self.root.0 {
            return Err(TreeError::RootNotMovable);
        }
        if self.slot(item)?.parent.is_some() {
            return Err(TreeError::AlreadyOwned(item));
        }
        self.drop_subtree(item);
        Ok(())
    }

    /// Remove and drop the first child folder named `name`.
    ///
    /// Returns whether a folder was removed.
    pub fn remove_folder(&mut self, folder: FolderId, name: &str) -> TreeResult<bool> {
        self.folder(folder)?;
        let Some(child) = self.child_folder(folder, name) else {
            return Ok(false);
        };
        self.detach(folder, child.0)?;
        self.drop_subtree(child.0);
        self.touch(folder)?;
        debug!(folder = %folder, name, "Removed folder");
        Ok(true)
    }

    /// Remove and drop every direct child contact named `name`.
    ///
    /// Returns how many contacts were removed.
    pub fn remove_contact(&mut self, folder: FolderId, name: &str) -> TreeResult<usize> {
        self.folder(folder)?;
        let doomed: Vec<ContactId> = self
            .contacts(folder)
            .filter(|c| self.name(*c).is_ok_and(|n| n == name))
            .collect();

        for contact in &doomed {
            self.detach(folder, contact.0)?;
            self.drop_subtree(contact.0);
        }
        if !doomed.is_empty() {
            self.touch(folder)?;
            debug!(folder = %folder, name, removed = doomed.len(), "Removed contacts");
        }
        Ok(doomed.len())
    }

    /// Detach and drop every direct child of `folder`, with their subtrees.
    pub fn clear(&mut self, folder: FolderId) -> TreeResult<()> {
        let children = std::mem::take(self.children_mut(folder)?);
        for child in children {
            if let Ok(item) = self.slot_mut(child) {
                item.parent = None;
            }
            self.drop_subtree(child);
        }
        self.touch(folder)?;
        debug!(folder = %folder, "Cleared folder");
        Ok(())
    }

    fn detach(&mut self, folder: FolderId, item: ItemId) -> TreeResult<()> {
        self.slot_mut(item)?.parent = None;
        self.children_mut(folder)?.retain(|child| *child != item);
        Ok(())
    }

    fn drop_subtree(&mut self, item: ItemId) {
        let mut stack = vec![item];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            if let Some(dropped) = slot.item.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                self.live -= 1;
                if let ItemKind::Folder(folder) = dropped.kind {
                    stack.extend(folder.children);
                }
            }
        }
    }

    /// Check whether `folder` is `ancestor` or lies somewhere below it.
    fn is_within(&self, folder: FolderId, ancestor: ItemId) -> bool {
        let mut cursor = Some(folder);
        while let Some(current) = cursor {
            if current.0 == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    // Reconstruction only: attach without validation or timestamp changes.
    pub(crate) fn attach_restored(&mut self, folder: FolderId, mut item: Item) -> ItemId {
        item.parent = Some(folder);
        let id = self.insert(item);
        if let Ok(children) = self.children_mut(folder) {
            children.push(id);
        }
        id
    }

    // ==================== Lookup ====================

    /// Direct children of `folder` in insertion order.
    pub fn items(&self, folder: FolderId) -> impl Iterator<Item = ItemId> + '_ {
        self.children_of(folder).iter().copied()
    }

    /// Direct child folders of `folder` in insertion order.
    pub fn folders(&self, folder: FolderId) -> impl Iterator<Item = FolderId> + '_ {
        self.items(folder).filter_map(|id| self.as_folder_id(id))
    }

    /// Direct child contacts of `folder` in insertion order.
    pub fn contacts(&self, folder: FolderId) -> impl Iterator<Item = ContactId> + '_ {
        self.items(folder).filter_map(|id| self.as_contact_id(id))
    }

    /// First direct child contact named `name`.
    pub fn get_contact(&self, folder: FolderId, name: &str) -> Option<ContactId> {
        self.contacts(folder)
            .find(|c| self.name(*c).is_ok_and(|n| n == name))
    }

    fn child_folder(&self, folder: FolderId, name: &str) -> Option<FolderId> {
        self.folders(folder)
            .find(|f| self.name(*f).is_ok_and(|n| n == name))
    }

    /// Resolve a relative path starting at `folder`.
    ///
    /// Segments are separated by `/` or `\`. `""` and `.` stay put, `..`
    /// moves to the parent (nothing above the root), any other segment
    /// must name a child folder. A leading separator is treated as an empty
    /// first segment; resolving from the root is the caller's job.
    ///
    /// Returns `None` if any segment fails to resolve.
    pub fn get_folder(&self, folder: FolderId, path: &str) -> Option<FolderId> {
        self.folder(folder).ok()?;
        let mut cursor = folder;
        for segment in segments(path) {
            cursor = match segment {
                Segment::Current => cursor,
                Segment::Parent => self.parent(cursor)?,
                Segment::Child(name) => self.child_folder(cursor, name)?,
            };
        }
        Some(cursor)
    }

    /// Topmost ancestor of `folder` (the root, unless the subtree is detached).
    pub fn root_of(&self, folder: FolderId) -> FolderId {
        let mut cursor = folder;
        while let Some(parent) = self.parent(cursor) {
            cursor = parent;
        }
        cursor
    }

    /// Absolute path of `folder`, e.g. `/`, `/work` or `/work/team`.
    ///
    /// The topmost ancestor contributes no segment.
    pub fn path(&self, folder: FolderId) -> String {
        let mut names = Vec::new();
        let mut cursor = folder;
        while let Some(parent) = self.parent(cursor) {
            if let Ok(name) = self.name(cursor) {
                names.push(name);
            }
            cursor = parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    // ==================== Attribute mutation ====================

    /// Rename a folder.
    ///
    /// The new name is checked against the sibling folders of the folder's
    /// current parent, skipping the folder itself. The root (and any detached
    /// folder) has no siblings to collide with.
    pub fn rename_folder(&mut self, folder: FolderId, name: impl Into<String>) -> TreeResult<()> {
        let name = name.into();
        self.folder(folder)?;
        validate_folder_name(&name)?;
        if let Some(parent) = self.parent(folder) {
            if self
                .child_folder(parent, &name)
                .is_some_and(|existing| existing != folder)
            {
                return Err(TreeError::DuplicateName(name));
            }
        }
        self.slot_mut(folder.0)?.meta.set_name(name);
        Ok(())
    }

    fn contact_parts(&mut self, id: ContactId) -> TreeResult<(&mut ItemMeta, &mut Contact)> {
        let item = self.slot_mut(id.0)?;
        match &mut item.kind {
            ItemKind::Contact(contact) => Ok((&mut item.meta, contact)),
            ItemKind::Folder(_) => Err(TreeError::StaleHandle(id.0)),
        }
    }

    pub fn rename_contact(&mut self, id: ContactId, name: impl Into<String>) -> TreeResult<()> {
        let name = name.into();
        validate_name(&name)?;
        let (meta, _) = self.contact_parts(id)?;
        meta.set_name(name);
        Ok(())
    }

    pub fn set_first_name(&mut self, id: ContactId, value: impl Into<String>) -> TreeResult<()> {
        let value = value.into();
        validate_field(ContactField::FirstName, &value)?;
        let (meta, contact) = self.contact_parts(id)?;
        contact.first_name = value;
        meta.touch();
        Ok(())
    }

    pub fn set_company(&mut self, id: ContactId, value: impl Into<String>) -> TreeResult<()> {
        let value = value.into();
        validate_field(ContactField::Company, &value)?;
        let (meta, contact) = self.contact_parts(id)?;
        contact.company = value;
        meta.touch();
        Ok(())
    }

    pub fn set_relation(&mut self, id: ContactId, relation: Relation) -> TreeResult<()> {
        let (meta, contact) = self.contact_parts(id)?;
        contact.relation = relation;
        meta.touch();
        Ok(())
    }

    pub fn set_mail_address(&mut self, id: ContactId, value: impl Into<String>) -> TreeResult<()> {
        let value = value.into();
        validate_mail_address(&value)?;
        let (meta, contact) = self.contact_parts(id)?;
        contact.mail_address = value;
        meta.touch();
        Ok(())
    }

    /// Apply several field changes at once. Either all of them are applied
    /// (with a single timestamp bump) or none is.
    pub fn update_contact(&mut self, id: ContactId, update: ContactUpdate) -> TreeResult<()> {
        update.validate()?;
        if update.is_empty() {
            self.contact(id)?;
            return Ok(());
        }
        let (meta, contact) = self.contact_parts(id)?;
        match update.apply_to(contact) {
            Some(name) => meta.set_name(name),
            None => meta.touch(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_draft(name: &str) -> ContactDraft {
        ContactDraft::new(name, "Jane", "Acme", Relation::Colleague, "jane@acme.com")
    }

    fn tree_with(path: &[&str]) -> (Tree, Vec<FolderId>) {
        let mut tree = Tree::new("root").unwrap();
        let mut cursor = tree.root();
        let mut ids = Vec::new();
        for name in path {
            let f = tree.new_folder(*name).unwrap();
            tree.add_item(cursor, f).unwrap();
            ids.push(f);
            cursor = f;
        }
        (tree, ids)
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree = Tree::new("root").unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.name(tree.root()).unwrap(), "root");
        assert_eq!(tree.parent(tree.root()), None);
    }

    #[test]
    fn test_root_name_is_validated() {
        assert_eq!(Tree::new(" ").unwrap_err(), TreeError::EmptyName);
        assert!(matches!(
            Tree::new("a/b"),
            Err(TreeError::InvalidNameCharacters(_))
        ));
    }

    #[test]
    fn test_add_item_sets_parent_and_order() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let a = tree.new_folder("a").unwrap();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        let b = tree.new_folder("b").unwrap();

        tree.add_item(root, a).unwrap();
        tree.add_item(root, c).unwrap();
        tree.add_item(root, b).unwrap();

        let items: Vec<ItemId> = tree.items(root).collect();
        assert_eq!(items, vec![a.item(), c.item(), b.item()]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.folders(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.contacts(root).collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn test_add_item_bumps_folder_modified_at() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let before = tree.item(root).unwrap().modified_at();
        let a = tree.new_folder("a").unwrap();
        tree.add_item(root, a).unwrap();
        assert!(tree.item(root).unwrap().modified_at() >= before);
    }

    #[test]
    fn test_add_item_rejects_duplicate_folder_name() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let first = tree.new_folder("work").unwrap();
        tree.add_item(root, first).unwrap();

        let second = tree.new_folder("work").unwrap();
        let err = tree.add_item(root, second).unwrap_err();
        assert_eq!(err, TreeError::DuplicateName("work".to_string()));
        assert_eq!(tree.items(root).count(), 1);
        assert_eq!(tree.parent(second), None);
    }

    #[test]
    fn test_folder_names_are_case_sensitive() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let lower = tree.new_folder("work").unwrap();
        let upper = tree.new_folder("Work").unwrap();
        tree.add_item(root, lower).unwrap();
        tree.add_item(root, upper).unwrap();
        assert_eq!(tree.folders(root).count(), 2);
    }

    #[test]
    fn test_duplicate_contact_names_are_allowed() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let c1 = tree.new_contact(contact_draft("Doe")).unwrap();
        let c2 = tree.new_contact(contact_draft("Doe")).unwrap();
        tree.add_item(root, c1).unwrap();
        tree.add_item(root, c2).unwrap();
        assert_eq!(tree.get_contact(root, "Doe"), Some(c1));
        assert_eq!(tree.contacts(root).count(), 2);
    }

    #[test]
    fn test_contact_and_folder_may_share_a_name() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let c = tree.new_contact(contact_draft("work")).unwrap();
        let f = tree.new_folder("work").unwrap();
        tree.add_item(root, c).unwrap();
        tree.add_item(root, f).unwrap();
        assert_eq!(tree.get_folder(root, "work"), Some(f));
        assert_eq!(tree.get_contact(root, "work"), Some(c));
    }

    #[test]
    fn test_add_item_rejects_owned_item() {
        let (mut tree, ids) = tree_with(&["a", "b"]);
        let err = tree.add_item(tree.root(), ids[1]).unwrap_err();
        assert_eq!(err, TreeError::AlreadyOwned(ids[1].item()));
    }

    #[test]
    fn test_add_item_rejects_root() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root();
        assert_eq!(tree.add_item(ids[0], root), Err(TreeError::RootNotMovable));
    }

    #[test]
    fn test_add_item_rejects_cycle() {
        let mut tree = Tree::new("root").unwrap();
        let outer = tree.new_folder("outer").unwrap();
        let inner = tree.new_folder("inner").unwrap();
        tree.add_item(outer, inner).unwrap();

        assert!(matches!(
            tree.add_item(inner, outer),
            Err(TreeError::CycleDetected { .. })
        ));
        assert!(matches!(
            tree.add_item(outer, outer),
            Err(TreeError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_remove_item_then_readd_elsewhere() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root();
        let other = tree.new_folder("other").unwrap();
        tree.add_item(root, other).unwrap();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        tree.add_item(ids[0], c).unwrap();

        tree.remove_item(ids[0], c).unwrap();
        assert_eq!(tree.parent(c), None);
        assert_eq!(tree.contacts(ids[0]).count(), 0);

        tree.add_item(other, c).unwrap();
        assert_eq!(tree.parent(c), Some(other));
    }

    #[test]
    fn test_remove_item_from_wrong_folder_fails() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        tree.add_item(ids[0], c).unwrap();
        let before = tree.item(root).unwrap().clone();

        let err = tree.remove_item(root, c).unwrap_err();
        assert!(matches!(err, TreeError::NotOwned { .. }));
        assert_eq!(tree.parent(c), Some(ids[0]));
        assert_eq!(tree.item(root).unwrap(), &before);
    }

    #[test]
    fn test_remove_folder_by_name() {
        let (mut tree, ids) = tree_with(&["a", "b"]);
        let root = tree.root();
        assert!(!tree.remove_folder(root, "missing").unwrap());
        assert!(tree.remove_folder(root, "a").unwrap());
        assert_eq!(tree.items(root).count(), 0);
        // The whole subtree is gone.
        assert!(!tree.contains(ids[0]));
        assert!(!tree.contains(ids[1]));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_contact_removes_all_matches() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        for name in ["Doe", "Smith", "Doe"] {
            let c = tree.new_contact(contact_draft(name)).unwrap();
            tree.add_item(root, c).unwrap();
        }
        assert_eq!(tree.remove_contact(root, "Doe").unwrap(), 2);
        assert_eq!(tree.remove_contact(root, "Doe").unwrap(), 0);
        assert_eq!(tree.contacts(root).count(), 1);
    }

    #[test]
    fn test_clear_drops_children() {
        let (mut tree, ids) = tree_with(&["a", "b", "c"]);
        let root = tree.root();
        tree.clear(root).unwrap();
        assert_eq!(tree.items(root).count(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.item(ids[2]), Err(TreeError::StaleHandle(ids[2].item())));
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        for _ in 0..100 {
            let c = tree.new_contact(contact_draft("Doe")).unwrap();
            tree.add_item(root, c).unwrap();
            assert_eq!(tree.remove_contact(root, "Doe").unwrap(), 1);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.capacity(), 2);
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let old = tree.new_folder("old").unwrap();
        tree.add_item(root, old).unwrap();
        assert!(tree.remove_folder(root, "old").unwrap());

        let new = tree.new_folder("new").unwrap();
        tree.add_item(root, new).unwrap();
        assert_eq!(new.item().index, old.item().index);
        assert_ne!(new, old);

        assert_eq!(tree.item(old), Err(TreeError::StaleHandle(old.item())));
        assert_eq!(tree.rename_folder(old, "x"), Err(TreeError::StaleHandle(old.item())));
        assert_eq!(tree.discard(old), Err(TreeError::StaleHandle(old.item())));
        assert_eq!(tree.name(new).unwrap(), "new");
    }

    #[test]
    fn test_discard_requires_detached_item() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root();
        assert_eq!(
            tree.discard(ids[0]),
            Err(TreeError::AlreadyOwned(ids[0].item()))
        );
        tree.remove_item(root, ids[0]).unwrap();
        tree.discard(ids[0]).unwrap();
        assert!(!tree.contains(ids[0]));
        assert_eq!(tree.discard(root), Err(TreeError::RootNotMovable));
    }

    #[test]
    fn test_get_folder_segments() {
        let (tree, ids) = tree_with(&["a", "b"]);
        let root = tree.root();
        assert_eq!(tree.get_folder(root, ""), Some(root));
        assert_eq!(tree.get_folder(root, "."), Some(root));
        assert_eq!(tree.get_folder(root, ".."), None);
        assert_eq!(tree.get_folder(root, "a/b"), Some(ids[1]));
        assert_eq!(tree.get_folder(root, "a\\b"), Some(ids[1]));
        assert_eq!(tree.get_folder(ids[1], "../.."), Some(root));
        assert_eq!(tree.get_folder(ids[1], "../../a/./b/"), Some(ids[1]));
        assert_eq!(tree.get_folder(root, "a/missing"), None);
        assert_eq!(tree.get_folder(root, "b"), None);
    }

    #[test]
    fn test_get_folder_ignores_contacts() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        tree.add_item(root, c).unwrap();
        assert_eq!(tree.get_folder(root, "Doe"), None);
    }

    #[test]
    fn test_path() {
        let (tree, ids) = tree_with(&["a", "b"]);
        assert_eq!(tree.path(tree.root()), "/");
        assert_eq!(tree.path(ids[0]), "/a");
        assert_eq!(tree.path(ids[1]), "/a/b");
    }

    #[test]
    fn test_root_of_detached_subtree() {
        let mut tree = Tree::new("root").unwrap();
        let outer = tree.new_folder("outer").unwrap();
        let inner = tree.new_folder("inner").unwrap();
        tree.add_item(outer, inner).unwrap();
        assert_eq!(tree.root_of(inner), outer);
        assert_eq!(tree.path(inner), "/inner");
    }

    #[test]
    fn test_rename_folder_checks_siblings() {
        let (mut tree, ids) = tree_with(&["a"]);
        let root = tree.root();
        let b = tree.new_folder("b").unwrap();
        tree.add_item(root, b).unwrap();

        assert_eq!(
            tree.rename_folder(b, "a"),
            Err(TreeError::DuplicateName("a".to_string()))
        );
        tree.rename_folder(b, "b").unwrap();
        tree.rename_folder(b, "c").unwrap();
        assert_eq!(tree.name(b).unwrap(), "c");
        assert!(matches!(
            tree.rename_folder(ids[0], "x/y"),
            Err(TreeError::InvalidNameCharacters(_))
        ));
        assert_eq!(tree.name(ids[0]).unwrap(), "a");
    }

    #[test]
    fn test_rename_root_skips_uniqueness() {
        let mut tree = Tree::new("root").unwrap();
        let root = tree.root();
        tree.rename_folder(root, "home").unwrap();
        assert_eq!(tree.name(root).unwrap(), "home");
        assert_eq!(tree.path(root), "/");
    }

    #[test]
    fn test_contact_setters_validate_before_mutating() {
        let mut tree = Tree::new("root").unwrap();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        let before = tree.item(c).unwrap().clone();

        assert!(tree.set_mail_address(c, "nope").is_err());
        assert!(tree.set_company(c, "").is_err());
        assert!(tree.set_first_name(c, "  ").is_err());
        assert!(tree.rename_contact(c, "").is_err());
        assert_eq!(tree.item(c).unwrap(), &before);

        tree.set_mail_address(c, "jd@example.org").unwrap();
        tree.set_relation(c, Relation::Friend).unwrap();
        let contact = tree.contact(c).unwrap();
        assert_eq!(contact.mail_address(), "jd@example.org");
        assert_eq!(contact.relation(), Relation::Friend);
    }

    #[test]
    fn test_update_contact_is_atomic() {
        let mut tree = Tree::new("root").unwrap();
        let c = tree.new_contact(contact_draft("Doe")).unwrap();
        let before = tree.item(c).unwrap().clone();

        let bad = ContactUpdate::new().name("Smith").mail_address("broken");
        assert!(tree.update_contact(c, bad).is_err());
        assert_eq!(tree.item(c).unwrap(), &before);

        let good = ContactUpdate::new().name("Smith").company("Initech");
        tree.update_contact(c, good).unwrap();
        assert_eq!(tree.name(c).unwrap(), "Smith");
        assert_eq!(tree.contact(c).unwrap().company(), "Initech");
    }

    #[test]
    fn test_invalid_contact_is_never_created() {
        let mut tree = Tree::new("root").unwrap();
        let mut draft = contact_draft("Doe");
        draft.company = String::new();
        assert!(tree.new_contact(draft).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_foreign_handles_are_rejected() {
        let (mut tree, _) = tree_with(&["a"]);
        let (other, other_ids) = tree_with(&["b"]);
        let root = tree.root();

        assert_eq!(
            tree.add_item(root, other_ids[0]),
            Err(TreeError::CrossTreeReference(other_ids[0].item()))
        );
        assert_eq!(tree.get_folder(other.root(), "b"), None);
        assert!(!tree.contains(other.root()));
    }
}
