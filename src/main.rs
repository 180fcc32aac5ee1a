//! Zentinel SOAP handler chain runner.
//!
//! Run with: `zentinel-soap-handler --config config.yaml --message request.xml`

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;
use zentinel_soap_handler::{HandlerChain, HandlerChainConfig, SoapMessageContext};

/// Runs a SOAP envelope through a configured handler chain.
///
/// Reports the resulting SOAP fault, if any, and exits non-zero when
/// processing fails.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the SOAP envelope to process
    #[arg(short, long)]
    message: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        message = %args.message.display(),
        "Running SOAP request pass"
    );

    let config = load_config(&args.config).await?;

    info!(
        roles = ?config.roles,
        allowed_versions = ?config.settings.allowed_versions,
        must_understand = config.must_understand.enabled,
        understood_headers = config.must_understand.understood_headers.len(),
        allow_fault_suppression = config.settings.allow_fault_suppression,
        "Handler chain configuration loaded"
    );

    let envelope = tokio::fs::read(&args.message)
        .await
        .with_context(|| format!("Failed to read message {}", args.message.display()))?;

    let envelope_len = envelope.len();

    let chain = HandlerChain::from_config(&config);
    let mut ctx = chain.new_context();
    ctx.set_payload(envelope).context("Message rejected")?;

    if let Some(message) = ctx.message() {
        debug!(
            bytes = envelope_len,
            version = ?message.version(),
            header_blocks = message.header_blocks().len(),
            "Envelope accepted"
        );
    }

    match chain.process_request(&mut ctx) {
        Ok(()) => {
            let operation = ctx
                .message()
                .and_then(|m| m.body_element())
                .map(ToString::to_string);
            info!(operation = ?operation, "Request processed");
            Ok(())
        }
        Err(e) => {
            if let Some(fault) = e.as_fault() {
                error!(
                    fault_code = %fault.fault_code(),
                    fault_actor = ?fault.fault_actor(),
                    has_detail = fault.detail().is_some(),
                    "{}",
                    fault.fault_string()
                );
            }
            Err(e).context("Request processing failed")
        }
    }
}

/// Read the chain configuration, falling back to defaults when the file is absent.
async fn load_config(path: &Path) -> Result<HandlerChainConfig> {
    if !path.exists() {
        info!(config = %path.display(), "Config file not found, using defaults");
        return Ok(HandlerChainConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    HandlerChainConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/zentinel-soap.yaml"))
            .await
            .unwrap();
        assert!(config.must_understand.enabled);
        assert!(config.roles.is_empty());
    }
}
