use env_logger::{Builder, Target};
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Filter string to use: `RUST_LOG` when set, otherwise the configured level
pub fn resolve_filter(env_filter: Option<&str>, configured: &str) -> String {
    match env_filter.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => configured.to_string(),
    }
}

/// Send log output to an append-only file. The terminal belongs to the UI
/// while it runs, so nothing is written to stderr.
pub fn init_file_logger(path: &Path, configured: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env = std::env::var("RUST_LOG").ok();
    Builder::new()
        .parse_filters(&resolve_filter(env.as_deref(), configured))
        .format_timestamp_millis()
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;

    log::info!("FocusFlight starting up, logging to {}", path.display());
    Ok(())
}

/// Logger for the non-interactive modes, which may use stderr
pub fn init_stderr_logger(configured: &str) {
    let env = std::env::var("RUST_LOG").ok();
    let _ = Builder::new()
        .parse_filters(&resolve_filter(env.as_deref(), configured))
        .target(Target::Stderr)
        .try_init();
}
