//! Key derivation and symmetric encryption of the save file.
//!
//! # Key derivation
//!
//! The key is `SHA-256("Salt#42#" || password)`, 32 bytes, used directly as
//! an AES-256 key. There is no per-file salt and no work factor.
//!
//! # Initialization vector
//!
//! When no IV is configured, [`Iv::fallback`] returns `MD5("iv")`, the same
//! 16 bytes for every file and every password. This is a known weakness:
//! with [`Aes256CtrCipher`] two saves under the same password share a
//! keystream, and with [`Aes256GcmCipher`] they share a nonce. It is kept so
//! that existing save files stay readable.
//!
//! # Authentication
//!
//! [`Aes256CtrCipher`] (the default) does not authenticate. A wrong password
//! produces garbage that only fails later, when the codec tries to parse it.
//! [`Aes256GcmCipher`] rejects a wrong key or tampered data up front.

use std::fmt;

use aes::cipher::{KeyIvInit, StreamCipher};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use ring::digest;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;
use zeroize::Zeroizing;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// IV size in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// GCM nonce size in bytes, taken from the front of the IV.
pub const NONCE_SIZE: usize = 12;

/// Constant prefix hashed in front of the password.
pub const KEY_SALT: &str = "Salt#42#";

/// AES-256-CTR with big-endian 128-bit counter
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid IV length: expected {expected} bytes, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Wrong key or modified ciphertext (authenticated ciphers only).
    #[error("Decryption failed - authentication tag mismatch")]
    Authentication,
}

/// A 256-bit key derived from a password. Wiped on drop.
#[derive(Clone)]
pub struct DerivedKey(Zeroizing<[u8; KEY_SIZE]>);

impl DerivedKey {
    /// Derive the key for `password`.
    pub fn from_password(password: &str) -> Self {
        let mut ctx = digest::Context::new(&digest::SHA256);
        ctx.update(KEY_SALT.as_bytes());
        ctx.update(password.as_bytes());
        let hash = ctx.finish();

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(hash.as_ref());
        DerivedKey(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        DerivedKey(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// A 16-byte initialization vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    pub fn new(bytes: [u8; IV_SIZE]) -> Self {
        Iv(bytes)
    }

    /// The fixed IV used when none is configured: `MD5("iv")`.
    ///
    /// Every file encrypted with it shares the same IV. See the module docs.
    pub fn fallback() -> Self {
        Iv(md5::compute(b"iv").0)
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

impl Default for Iv {
    fn default() -> Self {
        Self::fallback()
    }
}

impl TryFrom<&[u8]> for Iv {
    type Error = CipherError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; IV_SIZE] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidIvLength {
                expected: IV_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Iv(array))
    }
}

/// Symmetric encryption of a whole save file.
pub trait Cipher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    fn decrypt(&self, key: &DerivedKey, iv: &Iv, ciphertext: &[u8])
    -> Result<Vec<u8>, CipherError>;
}

/// Unauthenticated AES-256 in counter mode. Output length equals input length.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256CtrCipher;

impl Aes256CtrCipher {
    fn apply(key: &DerivedKey, iv: &Iv, data: &[u8]) -> Vec<u8> {
        let mut cipher = Aes256Ctr::new(key.as_bytes().into(), iv.as_bytes().into());
        let mut out = data.to_vec();
        cipher.apply_keystream(&mut out);
        out
    }
}

impl Cipher for Aes256CtrCipher {
    fn name(&self) -> &'static str {
        "aes-256-ctr"
    }

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        trace!(len = plaintext.len(), "AES-CTR encrypt");
        Ok(Self::apply(key, iv, plaintext))
    }

    fn decrypt(
        &self,
        key: &DerivedKey,
        iv: &Iv,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        trace!(len = ciphertext.len(), "AES-CTR decrypt");
        Ok(Self::apply(key, iv, ciphertext))
    }
}

/// Authenticated AES-256-GCM. The nonce is the first 12 bytes of the IV and
/// the 16-byte tag is appended to the ciphertext.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

impl Aes256GcmCipher {
    fn cipher(key: &DerivedKey) -> Aes256Gcm {
        let key: &Key<Aes256Gcm> = key.as_bytes().into();
        Aes256Gcm::new(key)
    }
}

impl Cipher for Aes256GcmCipher {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn encrypt(&self, key: &DerivedKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        trace!(len = plaintext.len(), "AES-GCM encrypt");
        let nonce = Nonce::from_slice(&iv.as_bytes()[..NONCE_SIZE]);
        Self::cipher(key)
            .encrypt(nonce, plaintext)
            .map_err(|e| CipherError::Encryption(e.to_string()))
    }

    fn decrypt(
        &self,
        key: &DerivedKey,
        iv: &Iv,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        trace!(len = ciphertext.len(), "AES-GCM decrypt");
        let nonce = Nonce::from_slice(&iv.as_bytes()[..NONCE_SIZE]);
        Self::cipher(key)
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::Authentication)
    }
}

/// Cipher selection, as it appears in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherKind {
    #[default]
    AesCtr,
    AesGcm,
}

impl CipherKind {
    pub fn cipher(self) -> Box<dyn Cipher> {
        match self {
            CipherKind::AesCtr => Box::new(Aes256CtrCipher),
            CipherKind::AesGcm => Box::new(Aes256GcmCipher),
        }
    }
}
