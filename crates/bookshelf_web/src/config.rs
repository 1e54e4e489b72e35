//! Server configuration resolved from `BOOKSHELF_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_DB_PATH: &str = "new-books-collection.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind = read("BOOKSHELF_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|err| format!("invalid BOOKSHELF_BIND `{bind}`: {err}"))?;

        let db_path =
            PathBuf::from(read("BOOKSHELF_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));

        let log_level = read("BOOKSHELF_LOG_LEVEL")
            .unwrap_or_else(|| bookshelf_core::default_log_level().to_string());

        let log_dir = match read("BOOKSHELF_LOG_DIR") {
            Some(dir) => absolutize(PathBuf::from(dir))?,
            None => absolutize(PathBuf::from("logs"))?,
        };

        Ok(Self {
            bind_addr,
            db_path,
            log_level,
            log_dir,
        })
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path);
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| format!("cannot resolve working directory: {err}"))
}
