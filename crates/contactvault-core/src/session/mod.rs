//! The session: one address book, a working folder, and its save file.
//!
//! # Retry lockout
//!
//! Every failed [`Session::load`] that found a save file decrements the try
//! counter. When it reaches zero the save file is deleted. A wrong password
//! and a corrupted file count the same. A successful load or save resets
//! the counter to the configured maximum.
//!
//! # Example
//!
//! ```no_run
//! use contactvault_core::{Session, SessionConfig};
//! use contactvault_core::tree::{ContactDraft, Relation};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(SessionConfig::new("/tmp/book.bin", "jane"))?;
//! session.add_folder("work")?;
//! session.add_contact(ContactDraft::new(
//!     "Doe", "Jane", "Acme", Relation::Colleague, "jane@acme.com",
//! ))?;
//! session.save(Some("correct horse"))?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::crypto::DerivedKey;
use crate::record::{into_tree, to_record};
use crate::store::{EncryptedStore, StoreError};
use crate::tree::path::strip_root;
use crate::tree::{
    ContactDraft, ContactId, ContactUpdate, FolderId, Tree, TreeError, TreeResult, render,
};

/// Why a load did not replace the tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Nothing to load. The try counter is unchanged.
    #[error("No save file at {}", .0.display())]
    NotFound(PathBuf),

    /// Wrong password or unreadable data.
    #[error("Wrong password or corrupted save file ({remaining_tries} tries left)")]
    Rejected { remaining_tries: u32 },

    /// The last try failed and the save file has been deleted.
    #[error("Too many failed attempts, the save file has been deleted")]
    LockedOut,
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Owns the live tree, the current folder and the save file.
#[derive(Debug)]
pub struct Session {
    tree: Tree,
    current: FolderId,
    try_count: u32,
    store: EncryptedStore,
    config: SessionConfig,
}

impl Session {
    /// Start with an empty root folder.
    pub fn new(config: SessionConfig) -> TreeResult<Self> {
        let tree = Tree::new(config.root_name())?;
        let store = EncryptedStore::new(
            config.save_path(),
            config.codec().codec(),
            config.cipher().cipher(),
        )
        .with_iv(config.iv());
        let current = tree.root();

        Ok(Session {
            tree,
            current,
            try_count: config.max_tries(),
            store,
            config,
        })
    }

    // ==================== Accessors ====================

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> FolderId {
        self.tree.root()
    }

    pub fn current(&self) -> FolderId {
        self.current
    }

    /// Absolute path of the current folder.
    pub fn current_path(&self) -> String {
        self.tree.path(self.current)
    }

    /// Failed loads left before the save file is deleted.
    pub fn try_count(&self) -> u32 {
        self.try_count
    }

    pub fn save_path(&self) -> &Path {
        self.store.path()
    }

    pub fn has_save(&self) -> bool {
        self.store.exists()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ==================== Tree operations ====================

    /// Create a folder in the current folder and make it current.
    pub fn add_folder(&mut self, name: impl Into<String>) -> TreeResult<FolderId> {
        let folder = self.tree.new_folder(name)?;
        if let Err(e) = self.tree.add_item(self.current, folder) {
            self.tree.discard(folder)?;
            return Err(e);
        }
        self.current = folder;
        Ok(folder)
    }

    /// Create a contact in the current folder.
    pub fn add_contact(&mut self, draft: ContactDraft) -> TreeResult<ContactId> {
        let contact = self.tree.new_contact(draft)?;
        if let Err(e) = self.tree.add_item(self.current, contact) {
            self.tree.discard(contact)?;
            return Err(e);
        }
        Ok(contact)
    }

    /// Remove the first child folder named `name` from the current folder.
    pub fn remove_folder(&mut self, name: &str) -> bool {
        self.tree.remove_folder(self.current, name).unwrap_or(false)
    }

    /// Remove every contact named `name` from the current folder.
    pub fn remove_contact(&mut self, name: &str) -> bool {
        self.tree
            .remove_contact(self.current, name)
            .is_ok_and(|removed| removed > 0)
    }

    /// Rename the child folder `name` of the current folder.
    ///
    /// Returns `Ok(false)` if there is no such folder.
    pub fn update_folder_name(
        &mut self,
        name: &str,
        new_name: impl Into<String>,
    ) -> TreeResult<bool> {
        let folder = self
            .tree
            .folders(self.current)
            .find(|f| self.tree.name(*f).is_ok_and(|n| n == name));
        let Some(folder) = folder else {
            return Ok(false);
        };
        self.tree.rename_folder(folder, new_name)?;
        Ok(true)
    }

    /// Apply `update` to the first contact named `name` in the current folder.
    ///
    /// Returns `Ok(false)` if there is no such contact.
    pub fn update_contact(&mut self, name: &str, update: ContactUpdate) -> TreeResult<bool> {
        let Some(contact) = self.tree.get_contact(self.current, name) else {
            return Ok(false);
        };
        self.tree.update_contact(contact, update)?;
        Ok(true)
    }

    /// Move the current folder along `path`.
    ///
    /// A leading `/` or `\` resolves from the root, anything else from the
    /// current folder. Returns whether the path resolved; on failure the
    /// current folder is unchanged.
    pub fn change_current(&mut self, path: &str) -> bool {
        let target = match strip_root(path) {
            Some(rest) => self.tree.get_folder(self.tree.root(), rest),
            None => self.tree.get_folder(self.current, path),
        };
        match target {
            Some(folder) => {
                self.current = folder;
                true
            }
            None => false,
        }
    }

    /// Make `folder` current. It must be reachable from this session's root.
    pub fn set_current(&mut self, folder: FolderId) -> TreeResult<()> {
        self.tree.folder(folder)?;
        if self.tree.root_of(folder) != self.tree.root() {
            return Err(TreeError::CrossTreeReference(folder.item()));
        }
        self.current = folder;
        Ok(())
    }

    pub fn set_current_as_root(&mut self) {
        self.current = self.tree.root();
    }

    /// Remove the current folder and move to its parent.
    ///
    /// The root cannot be removed, so for the root this empties it instead.
    pub fn remove_current(&mut self) -> TreeResult<()> {
        let Some(parent) = self.tree.parent(self.current) else {
            return self.tree.clear(self.current);
        };
        self.tree.remove_item(parent, self.current)?;
        self.tree.discard(self.current)?;
        self.current = parent;
        Ok(())
    }

    /// Render the whole tree, or only the current folder's subtree.
    pub fn render(&self, from_current: bool) -> String {
        let start = if from_current {
            self.current
        } else {
            self.tree.root()
        };
        render(&self.tree, start)
    }

    // ==================== Persistence ====================

    fn key_for(&self, password: Option<&str>) -> DerivedKey {
        match password {
            Some(password) if !password.trim().is_empty() => DerivedKey::from_password(password),
            _ => DerivedKey::from_password(self.config.identity()),
        }
    }

    /// Replace the tree with the contents of the save file.
    ///
    /// A blank or absent password falls back to the configured identity.
    #[instrument(level = "debug", skip(self, password), fields(path = %self.store.path().display()))]
    pub fn load(&mut self, password: Option<&str>) -> Result<(), LoadError> {
        let key = self.key_for(password);
        match self.store.read(&key) {
            Ok(record) => {
                self.tree = into_tree(record);
                self.current = self.tree.root();
                self.try_count = self.config.max_tries();
                info!(items = self.tree.len(), "Address book loaded");
                Ok(())
            }
            Err(StoreError::NotFound(path)) => Err(LoadError::NotFound(path)),
            Err(e) => {
                self.try_count = self.try_count.saturating_sub(1);
                if self.try_count > 0 {
                    warn!(error = %e, remaining_tries = self.try_count, "Load rejected");
                    return Err(LoadError::Rejected {
                        remaining_tries: self.try_count,
                    });
                }
                warn!("Retry limit reached, deleting save file");
                if !self.delete_save() {
                    warn!("Save file could not be deleted");
                }
                Err(LoadError::LockedOut)
            }
        }
    }

    /// Write the whole tree to the save file.
    ///
    /// A blank or absent password falls back to the configured identity.
    #[instrument(level = "debug", skip(self, password), fields(path = %self.store.path().display()))]
    pub fn save(&mut self, password: Option<&str>) -> Result<(), SaveError> {
        let key = self.key_for(password);
        let record = to_record(&self.tree, self.tree.root())?;
        self.store.write(&key, &record)?;
        self.try_count = self.config.max_tries();
        info!(items = self.tree.len(), "Address book saved");
        Ok(())
    }

    /// Delete the save file. Returns `false` only if it exists and could not
    /// be removed.
    pub fn delete_save(&self) -> bool {
        match self.store.delete() {
            Ok(removed) => {
                debug!(removed, "Delete save");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete save file");
                false
            }
        }
    }
}
