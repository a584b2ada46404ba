use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::{Result, TenantLogError};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "full" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Initializes the tracing subscriber used by the tenantlog binaries.
///
/// `RUST_LOG` takes precedence over `level`; ANSI colours are only enabled
/// when stdout is a terminal.
pub fn init_tracing(level: Option<&str>, format: LogFormat) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder
            .with_ansi(atty::is(atty::Stream::Stdout))
            .try_init(),
        LogFormat::Compact => builder
            .compact()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .try_init(),
        LogFormat::Json => builder.json().with_ansi(false).try_init(),
    };

    installed.map_err(|err| TenantLogError::Config(format!("failed to install tracing: {err}")))
}
