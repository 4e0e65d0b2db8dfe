use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::frame::Frame;
use crate::metrics::Metrics;
use crate::storage;
use crate::store::{Store, StoreError};
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let storage = storage::open(config.storage, &config.data_dir)?;
    let metrics = Arc::new(Metrics::new());
    let store = Store::new(storage, metrics.clone());

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        storage = ?config.storage,
        "Redis server listening on {}",
        listener.local_addr()?
    );

    tokio::select! {
        res = serve(listener, store) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            metrics.log_summary();
            Ok(())
        }
    }
}

/// Accepts connections on `listener` until accepting fails, serving each one on its own task.
pub async fn serve(listener: TcpListener, store: Store) -> Result<(), Error> {
    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!("Connection error: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let connection_id = Uuid::new_v4();
    tracing::Span::current()
        .record("connection_id", connection_id.to_string())
        .record("client_address", client_address.to_string());

    let metrics = store.metrics();
    metrics.connection_opened();

    let mut framed = Framed::new(stream, FrameCodec::new());
    let res = process(&mut framed, &store).await;

    metrics.connection_closed();
    info!("Connection closed");
    res
}

async fn process(framed: &mut Framed<TcpStream, FrameCodec>, store: &Store) -> Result<(), Error> {
    while let Some(frame) = framed.next().await {
        let frame = frame?;
        debug!("Received frame from client: {:?}", frame);

        let res = match Command::try_from(frame) {
            Ok(cmd) => {
                store.metrics().record(cmd.category());
                match cmd.exec(store.clone()) {
                    Ok(res) => res,
                    Err(e) => {
                        warn!("Command failed: {}", e);
                        store.metrics().record_error();
                        error_reply(e)
                    }
                }
            }
            Err(e) => {
                warn!("Invalid command: {}", e);
                store.metrics().record_error();
                Frame::Error(format!("ERR {}", e))
            }
        };

        debug!("Sending response to client: {:?}", res);
        framed.send(res).await?;
    }

    Ok(())
}

/// Type errors already carry their Redis error code, everything else is reported as `ERR`.
fn error_reply(e: Error) -> Frame {
    match e.downcast_ref::<StoreError>() {
        Some(err @ StoreError::WrongType) => Frame::Error(err.to_string()),
        _ => Frame::Error(format!("ERR {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::StructureError;

    #[test]
    fn wrong_type_reply_is_verbatim() {
        let reply = error_reply(Box::new(StoreError::WrongType));
        assert_eq!(
            reply,
            Frame::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string()
            )
        );
    }

    #[test]
    fn other_errors_are_prefixed() {
        let reply = error_reply(Box::new(StructureError::NotAnInteger));
        assert_eq!(
            reply,
            Frame::Error("ERR hash value is not an integer".to_string())
        );
    }
}
