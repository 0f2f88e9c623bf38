use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Session key holding the identity service JWT
pub const USER_JWT_KEY: &str = "userJwt";
/// Session key holding the identity service user id
pub const USER_ID_KEY: &str = "userId";

/// Server-side view of the signed session cookie
///
/// A string-keyed map; only `userJwt` and `userId` are written by this crate.
/// An empty session means nobody is signed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSession {
    values: BTreeMap<String, Value>,
}

impl UserSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for a freshly signed-in user
    #[must_use]
    pub fn for_user(user_id: u64, user_jwt: &str) -> Self {
        let mut session = Self::new();
        session.set(USER_JWT_KEY, user_jwt);
        session.set(USER_ID_KEY, user_id);
        session
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Bearer token, ignoring an empty string
    #[must_use]
    pub fn user_jwt(&self) -> Option<&str> {
        self.get(USER_JWT_KEY)
            .and_then(Value::as_str)
            .filter(|jwt| !jwt.is_empty())
    }

    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.get(USER_ID_KEY).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
