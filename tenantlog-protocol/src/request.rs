//! Query-string parameters of the HTTP surface, shared by server and client.

use serde::{Deserialize, Serialize};

use crate::log::DEFAULT_LOG_LEVEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterParams {
    #[serde(rename = "appName")]
    pub app_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLogParams {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    pub message: String,
    #[serde(rename = "logLevel", default = "default_log_level")]
    pub log_level: String,
    #[serde(rename = "className")]
    pub class_name: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsParams {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
