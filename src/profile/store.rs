use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::profile::profile_model::Profile;

pub const PROFILE_KEY: &str = "userProfile";
pub const API_KEY_KEY: &str = "geminiApiKey";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile store I/O error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("profile store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile store is not a JSON object")]
    NotAnObject,

    #[error("unknown profile field '{0}'")]
    UnknownField(String),

    #[error("invalid value '{value}' for profile field '{field}'")]
    InvalidValue { field: String, value: String },
}

// ============================================================================
// ProfileStore: minimal key-value contract
// ============================================================================

pub trait ProfileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, ProfileError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), ProfileError>;
}

/// Volatile store, used by tests and when no profile path is configured.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, ProfileError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), ProfileError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, ProfileError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(ProfileError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(ProfileError::NotAnObject),
        }
    }
}

impl ProfileStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, ProfileError> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), ProfileError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);

        let json = serde_json::to_string_pretty(&Value::Object(all))?;
        std::fs::write(&self.path, json).map_err(|source| ProfileError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

// ============================================================================
// Profile load / save
// ============================================================================

/// Load the profile, returning defaults when absent.
///
/// Any store or decode failure is logged and replaced by the default profile
/// so the assistant stays usable.
pub fn load_profile(store: &dyn ProfileStore) -> Profile {
    match try_load_profile(store) {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            debug!("no stored profile, using defaults");
            Profile::default()
        }
        Err(e) => {
            warn!("error loading user profile: {}", e);
            Profile::default()
        }
    }
}

pub fn try_load_profile(store: &dyn ProfileStore) -> Result<Option<Profile>, ProfileError> {
    match store.get(PROFILE_KEY)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn save_profile(store: &mut dyn ProfileStore, profile: &Profile) -> Result<(), ProfileError> {
    store.set(PROFILE_KEY, serde_json::to_value(profile)?)
}

pub fn load_api_key(store: &dyn ProfileStore) -> Option<String> {
    match store.get(API_KEY_KEY) {
        Ok(Some(Value::String(key))) if !key.is_empty() => Some(key),
        Ok(_) => None,
        Err(e) => {
            warn!("error loading API key: {}", e);
            None
        }
    }
}

pub fn save_api_key(store: &mut dyn ProfileStore, api_key: &str) -> Result<(), ProfileError> {
    store.set(API_KEY_KEY, Value::String(api_key.to_string()))
}
