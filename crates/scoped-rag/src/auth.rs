//! Static user directory with HTTP Basic authentication
//!
//! Produces the verified `(username, role)` pair the engine trusts. Passwords
//! are stored as hex SHA-256 digests in the `[users]` config section.

use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::config::UserConfig;
use crate::error::{Error, Result};

/// A user whose credentials were verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    /// Login name
    pub username: String,
    /// Role passed to the engine
    pub role: String,
}

/// Username to credential map
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: BTreeMap<String, UserConfig>,
}

impl UserDirectory {
    /// Create a directory from configured users
    pub fn new(users: BTreeMap<String, UserConfig>) -> Self {
        Self { users }
    }

    /// Number of configured users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are configured
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a username and password
    pub fn verify(&self, username: &str, password: &str) -> Result<AuthenticatedUser> {
        let presented = hash_password(password);

        let Some(user) = self.users.get(username) else {
            tracing::warn!(target: "audit", user = username, "Authentication failure: unknown user");
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        };

        if !digests_match(&presented, &user.password_sha256.to_ascii_lowercase()) {
            tracing::warn!(target: "audit", user = username, "Authentication failure: wrong password");
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        tracing::debug!(target: "audit", user = username, role = %user.role, "Authentication success");
        Ok(AuthenticatedUser {
            username: username.to_string(),
            role: user.role.clone(),
        })
    }

    /// Verify the value of an `Authorization: Basic ...` header
    pub fn authenticate_header(&self, header: &str) -> Result<AuthenticatedUser> {
        let (username, password) = parse_basic(header)?;
        self.verify(&username, &password)
    }
}

/// Hex SHA-256 of a password, the format stored in `password_sha256`
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Split a Basic authorization header into username and password
pub fn parse_basic(header: &str) -> Result<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))
        .ok_or_else(|| Error::Unauthorized("Basic authentication required".to_string()))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::Unauthorized("Malformed credentials".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| Error::Unauthorized("Malformed credentials".to_string()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| Error::Unauthorized("Malformed credentials".to_string()))?;

    Ok((username.to_string(), password.to_string()))
}

/// Compare without exiting at the first differing byte
fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        let mut users = BTreeMap::new();
        users.insert(
            "Sam".to_string(),
            UserConfig {
                role: "finance".to_string(),
                password_sha256: hash_password("financepass"),
            },
        );
        UserDirectory::new(users)
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(credentials))
    }

    #[test]
    fn test_hash_password() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify() {
        let dir = directory();
        let user = dir.verify("Sam", "financepass").unwrap();
        assert_eq!(user.role, "finance");

        assert!(matches!(dir.verify("Sam", "wrong"), Err(Error::Unauthorized(_))));
        assert!(matches!(dir.verify("Nobody", "financepass"), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_basic_header() {
        let dir = directory();
        let user = dir.authenticate_header(&basic("Sam:financepass")).unwrap();
        assert_eq!(user.username, "Sam");

        assert!(dir.authenticate_header("Bearer token").is_err());
        assert!(dir.authenticate_header("Basic !!!").is_err());
        assert!(dir.authenticate_header(&basic("no-colon")).is_err());
    }

    #[test]
    fn test_password_may_contain_colon() {
        let (user, pass) = parse_basic(&basic("Sam:a:b")).unwrap();
        assert_eq!(user, "Sam");
        assert_eq!(pass, "a:b");
    }
}
