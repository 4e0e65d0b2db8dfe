use clap::Parser;
use levelkv::config::Config;
use levelkv::{server, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    server::run(config).await
}
