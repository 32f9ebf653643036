//! Query request types

use serde::{Deserialize, Serialize};

/// A question asked under a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The question to answer
    pub text: String,
    /// Role supplied by the authentication layer, treated as opaque
    pub role: String,
    /// Requesting user, used for audit logging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Query {
    /// Create a new query
    pub fn new(text: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: role.into(),
            username: None,
        }
    }

    /// Attach the requesting user
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}
