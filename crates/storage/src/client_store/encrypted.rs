use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::ClientStore;
use crate::repository::StorageError;

const COOKIE_SCHEMA_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const KEY_CONTEXT: &[u8] = b"survey-cookie-v1:";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CookieDocument {
    schema_version: u8,
    entries: BTreeMap<String, CookieEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieEntry {
    nonce_b64: String,
    ciphertext_b64: String,
}

struct Jar {
    values: BTreeMap<String, String>,
    dirty: bool,
}

/// File-backed client store whose values are sealed with AES-256-GCM.
///
/// The key is derived from a shared secret password. Entries that cannot be
/// decrypted (wrong password, tampering) are dropped on load and behave as
/// absent.
pub struct EncryptedCookieStore {
    path: PathBuf,
    cipher: Aes256Gcm,
    jar: Mutex<Jar>,
}

impl EncryptedCookieStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Auth` for an empty password and
    /// `StorageError::Io` if an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>, password: &str) -> Result<Self, StorageError> {
        if password.trim().is_empty() {
            return Err(StorageError::Auth("cookie password is empty".into()));
        }
        let path = path.into();
        let cipher = cipher_for(password)?;
        let values = load_values(&path, &cipher)?;
        Ok(Self {
            path,
            cipher,
            jar: Mutex::new(Jar {
                values,
                dirty: false,
            }),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seal(&self, plaintext: &str) -> Result<CookieEntry, StorageError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| StorageError::Crypto)?;
        Ok(CookieEntry {
            nonce_b64: BASE64.encode(nonce),
            ciphertext_b64: BASE64.encode(ciphertext),
        })
    }
}

impl ClientStore for EncryptedCookieStore {
    fn ready(&self) -> bool {
        self.jar.lock().is_ok()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.values.insert(key.to_string(), value.to_string());
        guard.dirty = true;
        Ok(())
    }

    fn save(&self) -> Result<(), StorageError> {
        let mut guard = self
            .jar
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if !guard.dirty {
            return Ok(());
        }

        let mut doc = CookieDocument {
            schema_version: COOKIE_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        };
        for (key, value) in &guard.values {
            doc.entries.insert(key.clone(), self.seal(value)?);
        }
        let bytes =
            serde_json::to_vec_pretty(&doc).map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;

        guard.dirty = false;
        Ok(())
    }
}

fn cipher_for(password: &str) -> Result<Aes256Gcm, StorageError> {
    let mut hasher = Sha256::new();
    hasher.update(KEY_CONTEXT);
    hasher.update(password.as_bytes());
    let key = hasher.finalize();
    Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| StorageError::Crypto)
}

fn load_values(path: &Path, cipher: &Aes256Gcm) -> Result<BTreeMap<String, String>, StorageError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };

    let doc: CookieDocument = match serde_json::from_slice(&raw) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cookie file unreadable, starting empty");
            return Ok(BTreeMap::new());
        }
    };

    let mut values = BTreeMap::new();
    for (key, entry) in doc.entries {
        match open_entry(cipher, &entry) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(_) => warn!(key = %key, "dropping cookie entry that failed to decrypt"),
        }
    }
    Ok(values)
}

fn open_entry(cipher: &Aes256Gcm, entry: &CookieEntry) -> Result<String, StorageError> {
    let nonce_raw = BASE64
        .decode(entry.nonce_b64.as_bytes())
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    if nonce_raw.len() != NONCE_LEN {
        return Err(StorageError::Crypto);
    }
    let ciphertext = BASE64
        .decode(entry.ciphertext_b64.as_bytes())
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_raw), ciphertext.as_ref())
        .map_err(|_| StorageError::Crypto)?;
    String::from_utf8(plaintext).map_err(|_| StorageError::Crypto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen_with_same_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let store = EncryptedCookieStore::open(&path, "s3cret").unwrap();
        assert!(store.ready());
        store.set("respondent", r#"{"name":"Aiko"}"#).unwrap();
        store.save().unwrap();

        let reopened = EncryptedCookieStore::open(&path, "s3cret").unwrap();
        assert_eq!(
            reopened.get("respondent").unwrap().as_deref(),
            Some(r#"{"name":"Aiko"}"#)
        );
    }

    #[test]
    fn file_does_not_contain_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let store = EncryptedCookieStore::open(&path, "s3cret").unwrap();
        store.set("respondent", "visible-name").unwrap();
        store.save().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("visible-name"));
    }

    #[test]
    fn wrong_password_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let store = EncryptedCookieStore::open(&path, "right").unwrap();
        store.set("set_id", "2").unwrap();
        store.save().unwrap();

        let other = EncryptedCookieStore::open(&path, "wrong").unwrap();
        assert_eq!(other.get("set_id").unwrap(), None);
    }

    #[test]
    fn unsaved_values_are_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let store = EncryptedCookieStore::open(&path, "pw").unwrap();
        store.set("set_id", "1").unwrap();
        drop(store);

        let reopened = EncryptedCookieStore::open(&path, "pw").unwrap();
        assert_eq!(reopened.get("set_id").unwrap(), None);
    }

    #[test]
    fn empty_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = EncryptedCookieStore::open(dir.path().join("c.json"), "  ");
        assert!(matches!(result, Err(StorageError::Auth(_))));
    }
}
