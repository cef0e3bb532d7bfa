use contactvault_core::tree::{ContactDraft, Relation};
use contactvault_core::{CipherKind, CodecKind, Session, SessionConfig};
use tempfile::TempDir;

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "test-password-12345";
#[allow(dead_code)]
pub const TEST_IDENTITY: &str = "S-1-5-21-test-identity";

/// Install a subscriber once so `RUST_LOG=contactvault_core=trace` works in tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds sessions whose save file lives in a private temp directory.
pub struct SessionBuilder {
    dir: TempDir,
    codec: CodecKind,
    cipher: CipherKind,
    max_tries: Option<u32>,
}

#[allow(dead_code)]
impl SessionBuilder {
    pub fn new() -> Self {
        init_tracing();
        SessionBuilder {
            dir: TempDir::new().expect("Failed to create temp dir"),
            codec: CodecKind::default(),
            cipher: CipherKind::default(),
            max_tries: None,
        }
    }

    pub fn codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }

    pub fn cipher(mut self, cipher: CipherKind) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = Some(max_tries);
        self
    }

    pub fn config(&self) -> SessionConfig {
        let config = SessionConfig::new(self.dir.path().join("book.bin"), TEST_IDENTITY)
            .with_codec(self.codec)
            .with_cipher(self.cipher);
        match self.max_tries {
            Some(max_tries) => config.with_max_tries(max_tries),
            None => config,
        }
    }

    /// A fresh session. Call again for a second session on the same file.
    pub fn session(&self) -> Session {
        Session::new(self.config()).expect("Failed to create session")
    }

    /// Keep the temp directory alive alongside the session.
    pub fn build(self) -> (Session, TempDir) {
        let session = self.session();
        (session, self.dir)
    }
}

#[allow(dead_code)]
pub fn contact(name: &str) -> ContactDraft {
    ContactDraft::new(name, "Jane", "Acme", Relation::Colleague, "jane@acme.com")
}

/// `/work/team` with a contact in each folder and one at the root.
#[allow(dead_code)]
pub fn populate(session: &mut Session) {
    session.add_folder("work").unwrap();
    session.add_contact(contact("Doe")).unwrap();
    session.add_folder("team").unwrap();
    session
        .add_contact(ContactDraft::new(
            "Roe",
            "Richard",
            "Initech",
            Relation::Network,
            "richard@initech.example",
        ))
        .unwrap();
    session.set_current_as_root();
    session.add_folder("home").unwrap();
    session.set_current_as_root();
    session
        .add_contact(ContactDraft::new(
            "Poe",
            "Edgar",
            "Self",
            Relation::Friend,
            "edgar@poe.example",
        ))
        .unwrap();
}
