//! Session configuration and the optional settings file.
//!
//! Host-specific values (where the save file lives, which identity stands in
//! for a blank password) are injected through [`SessionConfig`]. The library
//! itself never reads process state except in [`SessionConfig::for_current_user`].
//!
//! # Settings file
//!
//! Stored at `~/.config/contactvault/settings.toml` on Linux (platform
//! equivalent elsewhere). Every key is optional:
//!
//! ```toml
//! save_path = "/home/jane/Documents/address-book.bin"
//! codec = "binary"     # json | binary
//! cipher = "aes-gcm"   # aes-ctr | aes-gcm
//! max_tries = 5
//! root_name = "root"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::CodecKind;
use crate::crypto::{CipherKind, Iv};

/// Failed load attempts allowed before the save file is deleted.
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Name given to a fresh root folder.
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Extension of the default save file.
pub const SAVE_EXTENSION: &str = "bin";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to find config directory")]
    NoConfigDir,

    #[error("Failed to find the user's home directory")]
    NoHomeDir,

    #[error("Failed to determine the current user name (USER / USERNAME unset)")]
    NoUserName,
}

/// Everything a [`Session`](crate::Session) needs from its host.
pub struct SessionConfig {
    save_path: PathBuf,
    identity: SecretString,
    codec: CodecKind,
    cipher: CipherKind,
    iv: Option<Iv>,
    max_tries: u32,
    root_name: String,
}

impl SessionConfig {
    /// Configuration with default codec, cipher and retry limit.
    ///
    /// `identity` is the password used whenever the caller passes a blank one.
    pub fn new(save_path: impl Into<PathBuf>, identity: impl Into<String>) -> Self {
        let identity: String = identity.into();
        SessionConfig {
            save_path: save_path.into(),
            identity: SecretString::from(identity),
            codec: CodecKind::default(),
            cipher: CipherKind::default(),
            iv: None,
            max_tries: DEFAULT_MAX_TRIES,
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    /// Defaults for the logged-in user: `<documents>/<user>.bin`, with the
    /// user name as identity.
    pub fn for_current_user() -> Result<Self, ConfigError> {
        let user = current_user_name().ok_or(ConfigError::NoUserName)?;
        let dirs = directories::UserDirs::new().ok_or(ConfigError::NoHomeDir)?;
        let base = dirs.document_dir().unwrap_or_else(|| dirs.home_dir());
        let save_path = base.join(format!("{user}.{SAVE_EXTENSION}"));
        debug!(path = %save_path.display(), "Using per-user save path");
        Ok(Self::new(save_path, user))
    }

    #[must_use]
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = path.into();
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_cipher(mut self, cipher: CipherKind) -> Self {
        self.cipher = cipher;
        self
    }

    /// Use an explicit IV instead of the fixed fallback.
    #[must_use]
    pub fn with_iv(mut self, iv: Iv) -> Self {
        self.iv = Some(iv);
        self
    }

    /// Retry limit, at least 1.
    #[must_use]
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    #[must_use]
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub(crate) fn identity(&self) -> &str {
        self.identity.expose_secret()
    }

    pub fn codec(&self) -> CodecKind {
        self.codec
    }

    pub fn cipher(&self) -> CipherKind {
        self.cipher
    }

    pub fn iv(&self) -> Iv {
        self.iv.unwrap_or_else(Iv::fallback)
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("save_path", &self.save_path)
            .field("identity", &"[REDACTED]")
            .field("codec", &self.codec)
            .field("cipher", &self.cipher)
            .field("custom_iv", &self.iv.is_some())
            .field("max_tries", &self.max_tries)
            .field("root_name", &self.root_name)
            .finish()
    }
}

fn current_user_name() -> Option<String> {
    ["USER", "USERNAME"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
}

/// Optional overrides read from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub save_path: Option<PathBuf>,
    pub codec: Option<CodecKind>,
    pub cipher: Option<CipherKind>,
    pub max_tries: Option<u32>,
    pub root_name: Option<String>,
}

impl Settings {
    /// Path of the settings file for this platform.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = directories::ProjectDirs::from("com", "contactvault", "contactvault")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("settings.toml"))
    }

    /// Load the settings file from its default location. A missing file
    /// yields empty settings.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Parse the settings file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Overlay every key that is set onto `config`.
    pub fn apply(&self, mut config: SessionConfig) -> SessionConfig {
        if let Some(path) = &self.save_path {
            config = config.with_save_path(path.clone());
        }
        if let Some(codec) = self.codec {
            config = config.with_codec(codec);
        }
        if let Some(cipher) = self.cipher {
            config = config.with_cipher(cipher);
        }
        if let Some(max_tries) = self.max_tries {
            config = config.with_max_tries(max_tries);
        }
        if let Some(name) = &self.root_name {
            config = config.with_root_name(name.clone());
        }
        config
    }
}
