use std::io;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tenantlog_protocol::log::{DateFilter, LogEntry};
use tenantlog_protocol::request::{ErrorBody, LogsParams, PostLogParams, RegisterParams};
use tenantlog_protocol::tenant::{CredentialPair, Tenant};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("server returned {status}: {message}")]
    Service { status: StatusCode, message: String },
    #[error("credential storage failed: {0}")]
    Storage(String),
    #[error("no stored credentials for '{0}'; run 'tenantlog register --name {0}' first")]
    UnknownApp(String),
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for CliError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

/// HTTP client for the tenantlog service.
pub struct LogServiceClient {
    base_url: Url,
    http: reqwest::Client,
}

impl LogServiceClient {
    pub fn new(base_url: &str) -> Result<Self, CliError> {
        let url = Url::parse(base_url)
            .map_err(|err| CliError::Validation(format!("invalid server URL: {err}")))?;
        Ok(Self {
            base_url: url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> Result<Url, CliError> {
        self.base_url
            .join(path)
            .map_err(|err| CliError::Validation(format!("invalid path: {err}")))
    }

    pub async fn register(&self, app_name: &str) -> Result<Tenant, CliError> {
        let url = self.endpoint("/register")?;
        debug!(%url, app_name, "registering application");
        let params = RegisterParams {
            app_name: app_name.to_string(),
        };
        let response = self.http.post(url).query(&params).send().await?;
        parse_response(response).await
    }

    pub async fn post_log(
        &self,
        credentials: &CredentialPair,
        message: &str,
        log_level: &str,
        class_name: &str,
    ) -> Result<(), CliError> {
        let url = self.endpoint("/postlog")?;
        debug!(%url, app_id = %credentials.id, "posting log entry");
        let params = PostLogParams {
            api_key: credentials.api_key.clone(),
            app_id: credentials.id.clone(),
            message: message.to_string(),
            log_level: log_level.to_string(),
            class_name: class_name.to_string(),
        };
        let response = self.http.put(url).query(&params).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// Fetches entries, optionally for one day. The date is validated
    /// locally before any request is made.
    pub async fn logs(
        &self,
        credentials: &CredentialPair,
        date: Option<&str>,
    ) -> Result<Vec<LogEntry>, CliError> {
        if let Some(raw) = date {
            DateFilter::parse(raw).map_err(|err| CliError::Validation(err.to_string()))?;
        }
        let url = self.endpoint("/logs")?;
        debug!(%url, app_id = %credentials.id, ?date, "fetching log entries");
        let params = LogsParams {
            api_key: credentials.api_key.clone(),
            app_id: credentials.id.clone(),
            date: date.map(str::to_string),
        };
        let response = self.http.get(url).query(&params).send().await?;
        parse_response(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|err| err.error)
        .unwrap_or(body);
    Err(CliError::Service { status, message })
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
    check_status(response)
        .await?
        .json::<T>()
        .await
        .map_err(|err| CliError::Http(err.to_string()))
}
