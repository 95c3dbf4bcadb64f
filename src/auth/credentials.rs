//! Credential store: username -> bcrypt hash, read-only after load.

use std::collections::HashMap;

use bcrypt::DEFAULT_COST;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no credentials configured: set DBMON_USERS or DBMON_USERS_FILE")]
    NoSource,

    #[error("unreadable credentials file {path}: {source}")]
    UnreadableFile {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed credential entry on line {0}: expected user:hash")]
    MalformedEntry(usize),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Read-only mapping from username to bcrypt password hash.
#[derive(Debug)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Load credentials from the configured source. Inline `users` takes
    /// precedence over `users_file`.
    pub fn from_config(config: &crate::config::SecurityConfig) -> Result<Self, CredentialError> {
        if let Some(inline) = &config.users {
            return Self::parse(inline.split(','));
        }
        if let Some(path) = &config.users_file {
            let contents =
                std::fs::read_to_string(path).map_err(|source| CredentialError::UnreadableFile {
                    path: path.clone(),
                    source,
                })?;
            return Self::parse(contents.lines());
        }
        Err(CredentialError::NoSource)
    }

    /// Parse `user:hash` entries. Blank entries and `#` comments are skipped.
    fn parse<'a>(entries: impl Iterator<Item = &'a str>) -> Result<Self, CredentialError> {
        let mut users = HashMap::new();
        for (idx, raw) in entries.enumerate() {
            let entry = raw.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            // Split on the first colon only; bcrypt hashes contain none
            let (user, hash) = entry
                .split_once(':')
                .ok_or(CredentialError::MalformedEntry(idx + 1))?;
            if user.is_empty() || hash.is_empty() {
                return Err(CredentialError::MalformedEntry(idx + 1));
            }
            users.insert(user.to_string(), hash.to_string());
        }
        Ok(Self { users })
    }

    /// Validate a username/password pair. Unknown users and verification
    /// failures both come back as false; this never errors.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(hash) => bcrypt::verify(password, hash).unwrap_or(false),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Hash a password for storage. Used by the mkhash helper and test setup.
pub fn hash_password(password: &str, cost: Option<u32>) -> Result<String, CredentialError> {
    Ok(bcrypt::hash(password, cost.unwrap_or(DEFAULT_COST))?)
}
