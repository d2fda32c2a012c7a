use anyhow::Result;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/sigma-chat.log";
const LOG_PATH_ENV: &str = "SIGMA_LOG_PATH";
const LOG_FILTER_ENV: &str = "SIGMA_LOG";
const DEFAULT_LOG_FILTER: &str = "sigma_chat=info";

/// Installs the global subscriber. The TUI owns the terminal, so log lines
/// go to a file whenever stderr is interactive.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false);

    let installed = match resolve_log_path() {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    // A subscriber installed earlier (tests, embedding) wins.
    let _ = installed;
    Ok(())
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}
