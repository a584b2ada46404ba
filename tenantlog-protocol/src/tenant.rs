use std::fmt;

use serde::{Deserialize, Serialize};

/// A registered application. The api key is only ever handed out once,
/// in the response to its registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "appName")]
    pub name: String,
    #[serde(rename = "appId")]
    pub id: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

impl Tenant {
    pub fn new(name: impl Into<String>, id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            api_key: api_key.into(),
        }
    }

    /// Log namespace owned by this tenant.
    pub fn namespace(&self) -> Namespace {
        Namespace::for_tenant(&self.name, &self.id)
    }

    pub fn credentials(&self) -> CredentialPair {
        CredentialPair::new(&self.api_key, &self.id)
    }

    /// Both halves of the pair must belong to this record.
    pub fn matches(&self, api_key: &str, id: &str) -> bool {
        self.api_key == api_key && self.id == id
    }
}

impl fmt::Debug for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenant")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Key of one tenant's log collection, `name + "_" + id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn for_tenant(name: &str, id: &str) -> Self {
        Namespace(format!("{name}_{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Tenant> for Namespace {
    fn from(tenant: &Tenant) -> Self {
        tenant.namespace()
    }
}

/// The (apiKey, id) combination presented on every authenticated call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "appId")]
    pub id: String,
}

impl CredentialPair {
    pub fn new(api_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            id: id.into(),
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("api_key", &"<redacted>")
            .field("id", &self.id)
            .finish()
    }
}
