//! Encrypted settings storage.
//!
//! [`SecretStore`] keeps a mapping of setting name to secret value in a single
//! file, sealed as one unit under a [`SecretKey`]. Every update is a full
//! read-decrypt-merge-encrypt-write, and the file is replaced atomically.
//!
//! A blob that cannot be decrypted (wrong or rotated key, corruption) loads as
//! the empty mapping, exactly like a missing file. The condition is logged at
//! `warn` so operators can still notice it.

pub mod cipher;
pub mod mask;

pub use cipher::SecretKey;
pub use mask::{mask_secret, SecretStatus};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Decrypted contents of the settings file.
pub type SecretMap = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    /// No server secret was configured. This is a configuration error, distinct
    /// from "no settings stored yet".
    #[error("secret key is not configured (set COACH_SECRET_KEY)")]
    MissingKey,

    #[error("secrets file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to encrypt settings: {0}")]
    Encrypt(String),

    #[error("secrets write lock poisoned")]
    LockPoisoned,
}

/// What [`SecretStore::inspect`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretsState {
    /// No settings file has been written yet.
    Missing,
    Loaded(SecretMap),
    /// The file exists but does not open under the given key.
    Undecryptable(String),
}

/// File-backed store for the encrypted settings blob.
#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    write_lock: Arc<Mutex<()>>,
}

impl SecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decrypt the whole mapping.
    ///
    /// Missing file and undecryptable content both yield an empty mapping.
    /// Use [`inspect`](Self::inspect) to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::Io`] when the file exists but cannot be read.
    pub fn load(&self, key: &SecretKey) -> Result<SecretMap, SecretsError> {
        match self.inspect(key)? {
            SecretsState::Loaded(map) => Ok(map),
            SecretsState::Missing => Ok(SecretMap::new()),
            SecretsState::Undecryptable(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "secrets file could not be decrypted, treating as empty"
                );
                Ok(SecretMap::new())
            }
        }
    }

    /// Read the file and report what state it is in.
    pub fn inspect(&self, key: &SecretKey) -> Result<SecretsState, SecretsError> {
        let envelope = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no secrets file yet");
                return Ok(SecretsState::Missing);
            }
            Err(source) => {
                return Err(SecretsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let plaintext = match cipher::open(key, &envelope) {
            Ok(bytes) => bytes,
            Err(reason) => return Ok(SecretsState::Undecryptable(reason.to_string())),
        };

        match serde_json::from_slice::<SecretMap>(&plaintext) {
            Ok(map) => Ok(SecretsState::Loaded(map)),
            Err(e) => Ok(SecretsState::Undecryptable(format!(
                "payload is not a settings map: {e}"
            ))),
        }
    }

    /// Encrypt `map` and replace the file with it.
    pub fn save(&self, key: &SecretKey, map: &SecretMap) -> Result<(), SecretsError> {
        let plaintext = serde_json::to_vec(map)?;
        let envelope = cipher::seal(key, &plaintext)?;
        self.write_atomic(envelope.as_bytes())?;
        tracing::debug!(path = %self.path.display(), entries = map.len(), "secrets saved");
        Ok(())
    }

    /// Look up one setting. `None` means absent, which differs from a stored `""`.
    pub fn get(&self, key: &SecretKey, name: &str) -> Result<Option<String>, SecretsError> {
        Ok(self.load(key)?.remove(name))
    }

    /// Store one setting, keeping all others.
    pub fn set(&self, key: &SecretKey, name: &str, value: &str) -> Result<(), SecretsError> {
        self.update(key, |map| {
            map.insert(name.to_string(), value.to_string());
        })
    }

    /// Remove one setting. Returns whether it was present.
    pub fn delete(&self, key: &SecretKey, name: &str) -> Result<bool, SecretsError> {
        let mut removed = false;
        self.update(key, |map| removed = map.remove(name).is_some())?;
        Ok(removed)
    }

    /// Run a full read-modify-write cycle under the store's write lock.
    pub fn update(
        &self,
        key: &SecretKey,
        apply: impl FnOnce(&mut SecretMap),
    ) -> Result<(), SecretsError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SecretsError::LockPoisoned)?;
        let mut map = self.load(key)?;
        apply(&mut map);
        self.save(key, &map)
    }

    /// Write to a uniquely named sibling temp file, then rename over the
    /// target. Concurrent writers never share a temp file.
    fn write_atomic(&self, bytes: &[u8]) -> Result<(), SecretsError> {
        let io_err = |source| SecretsError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        // NamedTempFile is created with mode 0600 on unix
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
