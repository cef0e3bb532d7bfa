//! The encrypted save file: codec output, encrypted, nothing else.
//!
//! The file carries no header, magic number or version. Reading it back
//! needs the same codec, cipher, IV and password that wrote it.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, trace, warn};
use zeroize::Zeroizing;

use crate::codec::{Codec, CodecError};
use crate::crypto::{Cipher, CipherError, DerivedKey, Iv};
use crate::record::FolderRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    /// There is no save file at the configured path.
    #[error("No save file at {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be turned back into records.
    ///
    /// Wrong password, truncated or corrupted data and codec mismatch all end
    /// up here and cannot be told apart.
    #[error("Save file {} could not be read (wrong password or corrupted data)", .0.display())]
    Unreadable(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode records: {0}")]
    Encode(#[from] CodecError),

    #[error("Failed to encrypt records: {0}")]
    Encrypt(#[from] CipherError),
}

/// Reads and writes one encrypted save file.
pub struct EncryptedStore {
    path: PathBuf,
    codec: Box<dyn Codec>,
    cipher: Box<dyn Cipher>,
    iv: Iv,
}

impl EncryptedStore {
    /// A store at `path` using the fallback IV.
    pub fn new(path: impl Into<PathBuf>, codec: Box<dyn Codec>, cipher: Box<dyn Cipher>) -> Self {
        EncryptedStore {
            path: path.into(),
            codec,
            cipher,
            iv: Iv::fallback(),
        }
    }

    #[must_use]
    pub fn with_iv(mut self, iv: Iv) -> Self {
        self.iv = iv;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Encode, encrypt and atomically replace the save file.
    ///
    /// Parent directories are created as needed. On failure the previous
    /// file, if any, is left untouched.
    #[instrument(level = "debug", skip(self, key, record), fields(path = %self.path.display()))]
    pub fn write(&self, key: &DerivedKey, record: &FolderRecord) -> Result<(), StoreError> {
        let plaintext = Zeroizing::new(self.codec.encode(record)?);
        let ciphertext = self.cipher.encrypt(key, &self.iv, &plaintext)?;
        trace!(
            codec = self.codec.name(),
            cipher = self.cipher.name(),
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "Encrypted records"
        );

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&ciphertext)?;
        temp_file.persist(&self.path).map_err(|e| {
            warn!(error = %e.error, "Failed to persist save file");
            StoreError::Io(e.error)
        })?;

        debug!(bytes = ciphertext.len(), "Save file written");
        Ok(())
    }

    /// Read, decrypt and decode the save file.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the file does not exist
    /// - [`StoreError::Unreadable`] for every other failure
    #[instrument(level = "debug", skip(self, key), fields(path = %self.path.display()))]
    pub fn read(&self, key: &DerivedKey) -> Result<FolderRecord, StoreError> {
        let ciphertext = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No save file");
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => {
                debug!(error = %e, "Failed to open save file");
                return Err(self.unreadable());
            }
        };

        let plaintext = self
            .cipher
            .decrypt(key, &self.iv, &ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| {
                debug!(error = %e, cipher = self.cipher.name(), "Decryption failed");
                self.unreadable()
            })?;

        let record = self.codec.decode(&plaintext).map_err(|e| {
            debug!(error = %e, codec = self.codec.name(), "Decoding failed");
            self.unreadable()
        })?;

        debug!(items = record.descendant_count(), "Save file read");
        Ok(record)
    }

    /// Remove the save file. Returns whether a file was removed.
    pub fn delete(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Save file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn unreadable(&self) -> StoreError {
        StoreError::Unreadable(self.path.clone())
    }
}

impl fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedStore")
            .field("path", &self.path)
            .field("codec", &self.codec.name())
            .field("cipher", &self.cipher.name())
            .finish_non_exhaustive()
    }
}
