//! Medirec: symptom-based disease prediction with guidance.
//!
//! Main entry point for the interactive shell.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medirec::adapters::sanitize::SanitizingMakeWriter;
use medirec::application::Services;
use medirec::config::AppConfig;
use medirec::shell;

fn main() -> Result<()> {
    // The shell owns stdout, so logs go to stderr or a file.
    let log_mode = std::env::var("MEDIREC_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, _guard) = if log_mode == "file" {
        let log_file =
            std::env::var("MEDIREC_LOG_FILE").unwrap_or_else(|_| "medirec.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Medirec...");

    let config = AppConfig::from_env();
    let services = Services::start(&config).context("Startup failed")?;

    let stdin = std::io::stdin();
    shell::run(&services, stdin.lock(), std::io::stdout().lock())?;

    tracing::info!("Medirec shutdown complete.");
    Ok(())
}
