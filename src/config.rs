use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Ordered in-memory map, lost on restart.
    Memory,
    /// RocksDB database under `--data-dir`. Needs the `rocksdb` cargo feature.
    Rocksdb,
}

/// Server configuration, read from flags or `LEVELKV_*` environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "levelkv", version, about)]
pub struct Config {
    /// The address to bind to
    #[arg(long, env = "LEVELKV_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on
    #[arg(short, long, env = "LEVELKV_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Storage backend
    #[arg(long, env = "LEVELKV_STORAGE", value_enum, default_value_t = StorageKind::Memory)]
    pub storage: StorageKind,

    /// Directory used by persistent backends
    #[arg(long, env = "LEVELKV_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Maximum log level
    #[arg(long, env = "LEVELKV_LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            storage: StorageKind::Memory,
            data_dir: PathBuf::from("./data"),
            log_level: Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from([
            "levelkv",
            "--port",
            "7000",
            "--storage",
            "rocksdb",
            "--data-dir",
            "/tmp/levelkv",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.storage, StorageKind::Rocksdb);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/levelkv"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Config::try_parse_from(["levelkv", "--storage", "redis"]).is_err());
    }
}
