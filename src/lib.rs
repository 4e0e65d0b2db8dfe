pub mod codec;
pub mod commands;
pub mod config;
pub mod frame;
pub mod keys;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod store;
pub mod structures;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
