use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A stored login session: proof of a successful prior login.
///
/// Either fully present and valid JSON on disk, or absent. Partial or
/// corrupt records are discarded on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub role: String,
    pub token: String,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>, role: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            token: token.into(),
            login_time: Utc::now(),
        }
    }

    /// Token shortened for display (never show the full token on screen).
    /// The token is opaque, so truncate on char boundaries.
    pub fn token_preview(&self) -> String {
        if self.token.chars().count() > 20 {
            let head: String = self.token.chars().take(20).collect();
            format!("{}...", head)
        } else {
            self.token.clone()
        }
    }
}

/// Where sessions are persisted. Injected into the app so state
/// transitions can be tested against an in-memory store.
pub trait SessionStore {
    /// Load the stored session, if any. A record that fails to parse
    /// is deleted and treated as absent.
    fn load(&mut self) -> Option<Session>;

    fn save(&mut self, session: &Session) -> Result<()>;

    /// Remove any stored session. A no-op when none exists.
    fn clear(&mut self) -> Result<()>;
}

/// JSON file in the user config directory, the single well-known
/// location a session lives in (`~/.config/torii/session.json`).
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("torii");

        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(Self {
            path: dir.join("session.json"),
        })
    }

    #[cfg(test)]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileStore {
    fn load(&mut self) -> Option<Session> {
        if !self.path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read session file: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                // Corrupt record: delete it so the next startup is clean
                tracing::warn!("Discarding corrupt session file: {}", e);
                let _ = std::fs::remove_file(&self.path);
                None
            }
        }
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub session: Option<Session>,
}

#[cfg(test)]
impl SessionStore for MemoryStore {
    fn load(&mut self) -> Option<Session> {
        self.session.clone()
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }
}
