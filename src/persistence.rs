//! Persistence of the cached bearer token
//!
//! The token is the only state that survives between passes. It is stored as
//! `{"token": "<jwt>"}` and replaced wholesale on every fresh login. A file
//! that cannot be read or parsed counts as "no token" so the next pass simply
//! logs in again.

use crate::error::Result;
use crate::logging::get_logger;
use crate::viessmann::BearerToken;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Storage capability handed to the identity client
pub trait TokenStore: Send + Sync {
    /// Cached token, if any. Corrupt or unreadable storage yields `None`.
    fn load(&self) -> Option<BearerToken>;

    /// Replace the cached token unconditionally
    fn save(&self, token: &BearerToken) -> Result<()>;
}

/// On-disk representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedToken {
    /// Older files may hold `null` after a failed login
    pub token: Option<String>,
}

/// JSON file backed token store
pub struct FileTokenStore {
    path: PathBuf,
    logger: crate::logging::StructuredLogger,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            logger: get_logger("token_store"),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<BearerToken> {
        if !self.path.exists() {
            self.logger.debug("No cached token file found");
            return None;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                self.logger
                    .warn(&format!("Token file unreadable ({}). Requesting new token.", e));
                return None;
            }
        };

        match serde_json::from_str::<PersistedToken>(&contents) {
            Ok(PersistedToken { token: Some(raw) }) if !raw.trim().is_empty() => {
                Some(BearerToken::new(raw))
            }
            Ok(_) => None,
            Err(_) => {
                self.logger
                    .warn("Token file is corrupted. Requesting new token.");
                None
            }
        }
    }

    fn save(&self, token: &BearerToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let record = PersistedToken {
            token: Some(token.as_str().to_string()),
        };
        let contents = serde_json::to_string(&record)?;

        // Write-then-rename so a crash never leaves a half-written file behind
        let tmp = self.temp_path();
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        self.logger.debug("Saved access token to disk");
        Ok(())
    }
}

/// In-memory token store, mainly for tests and embedding
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<BearerToken>>,
    saves: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: BearerToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<BearerToken> {
        self.slot.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, token: &BearerToken) -> Result<()> {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(token.clone());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
