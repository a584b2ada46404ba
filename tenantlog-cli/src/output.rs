use colored::*;
use tenantlog_protocol::log::LogEntry;
use tenantlog_protocol::tenant::Tenant;

use crate::credentials::StoredApp;

pub fn print_registered(tenant: &Tenant, credentials_path: &std::path::Path) {
    println!(
        "{} {}",
        "✔ Application registered:".green().bold(),
        tenant.name.bold()
    );
    println!("  App id: {}", tenant.id);
    println!("  Credentials saved to {}", credentials_path.display());
}

pub fn print_posted(app: &str, level: &str) {
    println!("{} {} ({})", "✔ Log entry stored for".green().bold(), app.bold(), level);
}

pub fn print_apps<'a>(apps: impl Iterator<Item = &'a StoredApp>) {
    let mut any = false;
    for app in apps {
        any = true;
        println!(
            "{}  {}  {}  {}",
            app.name.bold(),
            app.app_id,
            app.server.dimmed(),
            app.registered_at.format("%Y-%m-%d %H:%M")
        );
    }
    if !any {
        println!("{}", "No applications registered yet".yellow());
    }
}

pub fn print_entries(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("{}", "No log entries".yellow());
        return;
    }
    for entry in entries {
        println!(
            "{} {} {:<7} {} {}",
            entry.date.dimmed(),
            entry.time.dimmed(),
            colorize_level(&entry.log_level),
            entry.class_name.cyan(),
            entry.message
        );
    }
    println!("{} entries", entries.len());
}

fn colorize_level(level: &str) -> ColoredString {
    match level.to_ascii_lowercase().as_str() {
        "error" | "fatal" => level.red().bold(),
        "warn" | "warning" => level.yellow(),
        "debug" | "trace" => level.dimmed(),
        _ => level.green(),
    }
}
