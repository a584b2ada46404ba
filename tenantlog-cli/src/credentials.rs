use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Utc};
use dirs::home_dir;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tenantlog_protocol::tenant::{CredentialPair, Tenant};

use crate::client::CliError;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const CREDENTIALS_FILE: &str = "credentials.json";
const KEY_FILE: &str = "credentials.key";
const CREDENTIALS_FILE_VERSION: u8 = 1;

/// Credentials of one registered application as kept on disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredApp {
    pub name: String,
    pub app_id: String,
    pub api_key: String,
    pub registered_at: DateTime<Utc>,
    pub server: String,
}

impl StoredApp {
    pub fn from_tenant(tenant: &Tenant, server: &str) -> Self {
        Self {
            name: tenant.name.clone(),
            app_id: tenant.id.clone(),
            api_key: tenant.api_key.clone(),
            registered_at: Utc::now(),
            server: server.to_string(),
        }
    }

    pub fn credentials(&self) -> CredentialPair {
        CredentialPair::new(&self.api_key, &self.app_id)
    }
}

impl fmt::Debug for StoredApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredApp")
            .field("name", &self.name)
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("registered_at", &self.registered_at)
            .field("server", &self.server)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialData {
    apps: BTreeMap<String, StoredApp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EncryptedCredentialFile {
    version: u8,
    nonce: String,
    ciphertext: String,
}

struct CredentialCrypto {
    key: Key,
}

impl CredentialCrypto {
    fn load_or_create(path: &Path) -> Result<Self, CliError> {
        let key_bytes = load_or_create_key(path)?;
        Ok(Self {
            key: *Key::from_slice(&key_bytes),
        })
    }

    fn encrypt(&self, payload: &[u8]) -> Result<EncryptedCredentialFile, CliError> {
        let cipher = ChaCha20Poly1305::new(&self.key);
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, payload)
            .map_err(|err| CliError::Storage(err.to_string()))?;
        Ok(EncryptedCredentialFile {
            version: CREDENTIALS_FILE_VERSION,
            nonce: URL_SAFE_NO_PAD.encode(nonce_bytes),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        })
    }

    fn decrypt(&self, envelope: &EncryptedCredentialFile) -> Result<Vec<u8>, CliError> {
        if envelope.version != CREDENTIALS_FILE_VERSION {
            return Err(CliError::Storage(format!(
                "unknown credentials file version: {}",
                envelope.version
            )));
        }
        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(envelope.nonce.as_bytes())
            .map_err(|err| CliError::Storage(err.to_string()))?;
        if nonce_bytes.len() != 12 {
            return Err(CliError::Storage("credentials nonce has invalid length".into()));
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(envelope.ciphertext.as_bytes())
            .map_err(|err| CliError::Storage(err.to_string()))?;
        ChaCha20Poly1305::new(&self.key)
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| CliError::Storage("credentials file could not be decrypted".into()))
    }
}

/// Encrypted store of application credentials, `~/.tenantlog` by default.
pub struct CredentialStore {
    path: PathBuf,
    data: CredentialData,
    crypto: CredentialCrypto,
}

impl CredentialStore {
    pub fn load() -> Result<Self, CliError> {
        Self::load_from(default_dir()?)
    }

    /// Opens (or starts) a store in `dir`, creating the key on first use.
    pub fn load_from(dir: impl Into<PathBuf>) -> Result<Self, CliError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let crypto = CredentialCrypto::load_or_create(&dir.join(KEY_FILE))?;
        let path = dir.join(CREDENTIALS_FILE);

        let data = if path.exists() {
            let contents = fs::read(&path)?;
            if contents.is_empty() {
                CredentialData::default()
            } else {
                let envelope: EncryptedCredentialFile = serde_json::from_slice(&contents)
                    .map_err(|err| CliError::Storage(format!("invalid credentials file: {err}")))?;
                let decrypted = crypto.decrypt(&envelope)?;
                serde_json::from_slice(&decrypted)
                    .map_err(|err| CliError::Storage(format!("invalid credentials file: {err}")))?
            }
        } else {
            CredentialData::default()
        };

        Ok(Self { path, data, crypto })
    }

    pub fn save(&self) -> Result<(), CliError> {
        let payload =
            serde_json::to_vec(&self.data).map_err(|err| CliError::Storage(err.to_string()))?;
        let envelope = self.crypto.encrypt(&payload)?;
        let serialized = serde_json::to_string_pretty(&envelope)
            .map_err(|err| CliError::Storage(err.to_string()))?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    pub fn upsert(&mut self, app: StoredApp) {
        self.data.apps.insert(app.name.clone(), app);
    }

    pub fn app(&self, name: &str) -> Result<&StoredApp, CliError> {
        self.data
            .apps
            .get(name)
            .ok_or_else(|| CliError::UnknownApp(name.to_string()))
    }

    /// Stored applications ordered by name.
    pub fn apps(&self) -> impl Iterator<Item = &StoredApp> {
        self.data.apps.values()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_dir() -> Result<PathBuf, CliError> {
    let mut path =
        home_dir().ok_or_else(|| CliError::Storage("could not determine home directory".into()))?;
    path.push(".tenantlog");
    Ok(path)
}

fn load_or_create_key(path: &Path) -> Result<[u8; 32], CliError> {
    if path.exists() {
        let raw = fs::read_to_string(path)?;
        let decoded = URL_SAFE_NO_PAD
            .decode(raw.trim().as_bytes())
            .map_err(|err| CliError::Storage(err.to_string()))?;
        if decoded.len() != 32 {
            return Err(CliError::Storage("credentials key has invalid length".into()));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        Ok(key)
    } else {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        fs::write(path, URL_SAFE_NO_PAD.encode(key))?;
        secure_key_permissions(path)?;
        Ok(key)
    }
}

fn secure_key_permissions(path: &Path) -> Result<(), CliError> {
    #[cfg(unix)]
    {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
