use uuid::Uuid;

/// Length of an issued api key.
pub const API_KEY_LEN: usize = 32;

/// Source of tenant identities and secrets.
///
/// Collisions are left to the randomness of the implementation; issued
/// values are not checked against existing tenants.
pub trait CredentialIssuer: Send + Sync {
    fn issue_id(&self) -> String;
    fn issue_api_key(&self) -> String;
}

/// Issues random v4 UUIDs; api keys are the 32 hex digits of a fresh UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIssuer;

impl CredentialIssuer for UuidIssuer {
    fn issue_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn issue_api_key(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
