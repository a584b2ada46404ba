use clap::{Args, Parser, Subcommand};
use tenantlog_core::logging::{self, LogFormat};
use tenantlog_core::serde_utils;
use tenantlog_protocol::log::DEFAULT_LOG_LEVEL;

mod client;
mod credentials;
mod output;

use client::{CliError, LogServiceClient};
use credentials::{CredentialStore, StoredApp};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "tenantlog")]
#[command(about = "Client for the tenantlog multi-tenant logging service", long_about = None)]
struct Cli {
    /// Base URL of the log service
    #[arg(long, global = true, env = "TENANTLOG_URL")]
    server: Option<String>,
    /// Print request diagnostics to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an application and store its credentials
    Register(RegisterArgs),
    /// Send one log entry for a registered application
    Post(PostArgs),
    /// Fetch the log entries of a registered application
    Logs(LogsArgs),
    /// List applications with stored credentials
    Apps,
    /// Show version information
    Version,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args)]
struct PostArgs {
    #[arg(long)]
    app: String,
    #[arg(short, long)]
    message: String,
    #[arg(short, long, default_value = DEFAULT_LOG_LEVEL)]
    level: String,
    #[arg(long)]
    class_name: String,
}

#[derive(Args)]
struct LogsArgs {
    #[arg(long)]
    app: String,
    /// Only entries of this day (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,
    /// Print raw JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    if cli.verbose {
        if let Err(err) = logging::init_tracing(Some("debug"), LogFormat::Compact) {
            eprintln!("failed to initialise tracing: {err}");
        }
    }

    let explicit = cli.server.as_deref();

    match cli.command {
        Commands::Version => {
            println!("tenantlog v{}", env!("CARGO_PKG_VERSION"));
            println!("Server: {}", resolve_server(explicit, None));
        }
        Commands::Apps => {
            let store = CredentialStore::load()?;
            output::print_apps(store.apps());
        }
        Commands::Register(args) => {
            let client = LogServiceClient::new(&resolve_server(explicit, None))?;
            let mut store = CredentialStore::load()?;
            let tenant = client.register(&args.name).await?;
            store.upsert(StoredApp::from_tenant(&tenant, client.base_url()));
            store.save()?;
            output::print_registered(&tenant, store.path());
        }
        Commands::Post(args) => {
            let store = CredentialStore::load()?;
            let app = store.app(&args.app)?;
            let client = LogServiceClient::new(&resolve_server(explicit, Some(app)))?;
            client
                .post_log(&app.credentials(), &args.message, &args.level, &args.class_name)
                .await?;
            output::print_posted(&app.name, &args.level);
        }
        Commands::Logs(args) => {
            let store = CredentialStore::load()?;
            let app = store.app(&args.app)?;
            let client = LogServiceClient::new(&resolve_server(explicit, Some(app)))?;
            let entries = client
                .logs(&app.credentials(), args.date.as_deref())
                .await?;
            if args.json {
                let rendered = serde_utils::to_pretty_json(&entries)
                    .map_err(|err| CliError::Validation(err.to_string()))?;
                println!("{rendered}");
            } else {
                output::print_entries(&entries);
            }
        }
    }

    Ok(())
}

/// `--server`/`TENANTLOG_URL` first, then the server the app registered with.
fn resolve_server(explicit: Option<&str>, app: Option<&StoredApp>) -> String {
    explicit
        .or_else(|| app.map(|app| app.server.as_str()).filter(|server| !server.is_empty()))
        .unwrap_or(DEFAULT_SERVER)
        .to_string()
}
