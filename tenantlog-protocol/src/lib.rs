//! Wire types shared by the tenantlog service, its storage backends and
//! the command-line client.

pub mod log;
pub mod request;
pub mod tenant;

pub mod prelude {
    pub use crate::log::{DateFilter, LogEntry, DEFAULT_LOG_LEVEL};
    pub use crate::request::{ErrorBody, LogsParams, PostLogParams, RegisterParams};
    pub use crate::tenant::{CredentialPair, Namespace, Tenant};
}
