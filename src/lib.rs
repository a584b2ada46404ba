//! tenantlog: a multi-tenant logging service.
//!
//! Applications register under a unique name and receive an application id
//! and a secret api key. With that pair they append log entries to their own
//! namespace and read them back, optionally restricted to one calendar day.
//!
//! The workspace is split into:
//!
//! * `tenantlog-core`: configuration, errors, tracing setup, database pool
//! * `tenantlog-protocol`: wire types shared by server and client
//! * `tenantlog-service`: storage backends, access rules and the HTTP server
//! * `tenantlog-cli`: the `tenantlog` command-line client

pub use tenantlog_core as core;
pub use tenantlog_protocol as protocol;
pub use tenantlog_service as service;

pub use tenantlog_core::TenantLogError;
pub use tenantlog_protocol::prelude::*;
pub use tenantlog_service::access::AccessService;
pub use tenantlog_service::config::ServiceConfig;
pub use tenantlog_service::{start_service, ServiceHandle};

