//! Login session and token persistence
//!
//! Access and refresh tokens live in a [`TokenStore`]. The file store keeps
//! them in a small JSON document so a restarted client stays logged in.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Storage key
    pub fn key(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is not a JWT")]
    Malformed,
    #[error("Token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("Token payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Token store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub trait TokenStore: Send + Sync {
    fn get(&self, kind: TokenKind) -> Option<String>;
    fn set(&self, kind: TokenKind, token: &str) -> Result<(), TokenError>;
    fn clear(&self) -> Result<(), TokenError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        self.tokens.read().get(kind.key()).cloned()
    }

    fn set(&self, kind: TokenKind, token: &str) -> Result<(), TokenError> {
        self.tokens
            .write()
            .insert(kind.key().to_string(), token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenError> {
        self.tokens.write().clear();
        Ok(())
    }
}

/// Tokens kept in a JSON file
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TokenError> {
        let path = path.into();
        let tokens = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let tokens: HashMap<String, String> = serde_json::from_str(&contents)?;
            info!("Loaded {} tokens from {}", tokens.len(), path.display());
            tokens
        } else {
            debug!("No token file at {}", path.display());
            HashMap::new()
        };

        Ok(Self {
            path,
            tokens: Mutex::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, tokens: &HashMap<String, String>) -> Result<(), TokenError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(tokens)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        self.tokens.lock().get(kind.key()).cloned()
    }

    fn set(&self, kind: TokenKind, token: &str) -> Result<(), TokenError> {
        let mut tokens = self.tokens.lock();
        tokens.insert(kind.key().to_string(), token.to_string());
        self.write(&tokens)
    }

    /// Forget the tokens; on I/O failure they stay both on disk and in memory
    fn clear(&self) -> Result<(), TokenError> {
        let mut tokens = self.tokens.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        tokens.clear();
        Ok(())
    }
}

/// Login state shared by the API client
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::default()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(TokenKind::Access)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(TokenKind::Refresh)
    }

    pub fn store_pair(&self, access: &str, refresh: &str) -> Result<(), TokenError> {
        self.store.set(TokenKind::Access, access)?;
        self.store.set(TokenKind::Refresh, refresh)
    }

    pub fn store_access(&self, access: &str) -> Result<(), TokenError> {
        self.store.set(TokenKind::Access, access)
    }

    pub fn logout(&self) -> Result<(), TokenError> {
        info!("Logging out");
        self.store.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry time carried in a JWT, None when the token has no `exp` claim
pub fn token_expiry(token: &str) -> Result<Option<DateTime<Utc>>, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;
    Ok(claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)))
}

/// Unreadable tokens count as expired
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Ok(Some(exp)) => exp <= now,
        Ok(None) => false,
        Err(e) => {
            debug!("Treating unreadable token as expired: {}", e);
            true
        }
    }
}

#[cfg(test)]
pub(crate) fn test_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"token_type":"access","exp":{}}}"#, exp));
    format!("{}.{}.signature", header, payload)
}
