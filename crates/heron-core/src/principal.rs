//! Authenticated identities and raw credentials.
//!
//! A [`Credentials`] value is what an auth filter pulls out of a request; a
//! [`Principal`] is what it hands back once those credentials check out.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attribute key holding the principal's roles.
pub const ROLES_ATTRIBUTE: &str = "roles";

/// An authenticated identity.
///
/// # Example
///
/// ```rust
/// use heron_core::Principal;
///
/// let principal = Principal::new("alice").with_roles(["admin", "ops"]);
/// assert_eq!(principal.name(), "alice");
/// assert!(principal.has_role("ops"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attributes: IndexMap<String, serde_json::Value>,
}

impl Principal {
    /// Creates a principal with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Sets the `roles` attribute.
    #[must_use]
    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<serde_json::Value> = roles
            .into_iter()
            .map(|r| serde_json::Value::String(r.into()))
            .collect();
        self.with_attribute(ROLES_ATTRIBUTE, serde_json::Value::Array(roles))
    }

    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Returns all attributes.
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Returns the roles listed in the `roles` attribute.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.attributes
            .get(ROLES_ATTRIBUTE)
            .and_then(serde_json::Value::as_array)
            .map(|roles| roles.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the `roles` attribute contains `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().contains(&role)
    }
}

/// Raw credentials parsed from an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Basic` scheme with decoded username and password.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// `Bearer` scheme token.
    Bearer(String),
    /// Any other scheme, value left undecoded.
    Other {
        /// Scheme name as sent by the client.
        scheme: String,
        /// Credential value.
        value: String,
    },
}

impl Credentials {
    /// Parses an `Authorization` header value.
    ///
    /// Returns `None` for blank values and for `Basic` values that do not
    /// decode to `user:password`.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, value) = header.split_once(' ')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD.decode(value).ok()?;
            let decoded = String::from_utf8(decoded).ok()?;
            let (username, password) = decoded.split_once(':')?;
            Some(Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            })
        } else if scheme.eq_ignore_ascii_case("bearer") {
            Some(Self::Bearer(value.to_string()))
        } else {
            Some(Self::Other {
                scheme: scheme.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Returns the scheme name in lower case.
    #[must_use]
    pub fn scheme(&self) -> String {
        match self {
            Self::Basic { .. } => "basic".to_string(),
            Self::Bearer(_) => "bearer".to_string(),
            Self::Other { scheme, .. } => scheme.to_ascii_lowercase(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never log secrets
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"***").finish(),
            Self::Other { scheme, .. } => f
                .debug_struct("Other")
                .field("scheme", scheme)
                .field("value", &"***")
                .finish(),
        }
    }
}
