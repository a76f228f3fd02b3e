use simplelog::{CombinedLogger, Config, LevelFilter, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();

/// `$HOME/.local/share/midiclockrs/logs`
pub fn log_dir() -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("midiclockrs")
        .join("logs"))
}

/// Installs the file logger. Calling it again after a success is a no-op.
pub fn init_logger() -> Result<(), Error> {
    if INIT.is_completed() {
        return Ok(());
    }

    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))?;

    let mut result = Ok(());
    INIT.call_once(|| {
        result = CombinedLogger::init(vec![WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            log_file,
        )])
        .map_err(|e| Error::new(ErrorKind::Other, e));
    });
    result
}

/// Stderr logging driven by `RUST_LOG`, for when the log file is unavailable.
pub fn init_stderr_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}
