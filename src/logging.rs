use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub(crate) const DEBUG_LOG_ENV_VAR: &str = "SCBCONF_DEBUG_LOG";
pub(crate) const DEFAULT_DEBUG_LOG_PATH: &str = "/tmp/scbconf-debug.log";
const LOG_LEVEL_ENV_VAR: &str = "LOG_LEVEL";

fn parse_level(value: &str) -> Level {
    match value.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn resolve_level(verbose: bool, debug: bool, env_level: Option<String>) -> Level {
    if verbose || debug {
        return Level::DEBUG;
    }
    env_level.as_deref().map(parse_level).unwrap_or(Level::WARN)
}

fn choose_debug_log_path(path_override: &Option<String>, env_path: Option<String>) -> PathBuf {
    path_override
        .clone()
        .or(env_path)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEBUG_LOG_PATH))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)
}

/// Installs the global subscriber: stderr by default, a truncated file with `--debug`.
pub(crate) fn init_logging(
    verbose: bool,
    debug: bool,
    path_override: &Option<String>,
) -> Result<(), Box<dyn Error>> {
    let level = resolve_level(verbose, debug, std::env::var(LOG_LEVEL_ENV_VAR).ok());

    if !debug {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(());
    }

    let chosen_path = choose_debug_log_path(path_override, std::env::var(DEBUG_LOG_ENV_VAR).ok());
    let (path, file) = match open_log_file(&chosen_path) {
        Ok(file) => (chosen_path, file),
        Err(e) => {
            let fallback = PathBuf::from(DEFAULT_DEBUG_LOG_PATH);
            if fallback == chosen_path {
                return Err(e.into());
            }
            eprintln!(
                "scbconf: Failed to open debug log at {} ({}), falling back to {}",
                chosen_path.display(),
                e,
                fallback.display()
            );
            let file = open_log_file(&fallback)?;
            (fallback, file)
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    eprintln!("scbconf: Debug log enabled at {}", path.display());
    tracing::debug!("debug logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_beats_environment() {
        assert_eq!(resolve_level(true, false, Some("error".into())), Level::DEBUG);
        assert_eq!(resolve_level(false, true, None), Level::DEBUG);
        assert_eq!(resolve_level(false, false, Some("TRACE".into())), Level::TRACE);
        assert_eq!(resolve_level(false, false, Some("loud".into())), Level::WARN);
        assert_eq!(resolve_level(false, false, None), Level::WARN);
    }

    #[test]
    fn debug_log_path_precedence() {
        assert_eq!(
            choose_debug_log_path(&Some("/a.log".into()), Some("/b.log".into())),
            PathBuf::from("/a.log")
        );
        assert_eq!(
            choose_debug_log_path(&None, Some("/b.log".into())),
            PathBuf::from("/b.log")
        );
        assert_eq!(
            choose_debug_log_path(&None, None),
            PathBuf::from(DEFAULT_DEBUG_LOG_PATH)
        );
    }
}
