use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::Framed;

use levelkv::codec::FrameCodec;
use levelkv::frame::Frame;
use levelkv::server::serve;
use levelkv::store::Store;

/// Returns a channel whose chunks are written verbatim to the peer of the returned stream.
async fn raw_peer() -> Result<(UnboundedSender<Vec<u8>>, TcpStream), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            while let Some(data) = rx.recv().await {
                if socket.write_all(&data).await.is_err() {
                    break;
                }
            }
        }
    });

    let stream = TcpStream::connect(local_addr).await?;

    Ok((tx, stream))
}

async fn server() -> Framed<TcpStream, FrameCodec> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Store::default()));

    let stream = TcpStream::connect(addr).await.unwrap();
    Framed::new(stream, FrameCodec::new())
}

fn request(args: &[&str]) -> Frame {
    Frame::Array(
        args.iter()
            .map(|arg| Frame::Bulk(Bytes::copy_from_slice(arg.as_bytes())))
            .collect(),
    )
}

#[tokio::test]
async fn test_frames_split_across_writes() {
    let (tx, stream) = raw_peer().await.unwrap();
    let mut framed = Framed::new(stream, FrameCodec::new());

    let parts: [&[u8]; 3] = [b"*3\r\n$3\r\nSE", b"T\r\n$5\r\nmyke", b"y\r\n$4\r\na\r\nb\r\n:7\r\n"];

    tokio::spawn(async move {
        for part in parts {
            tx.send(part.to_vec()).unwrap();
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    });

    let first = framed.next().await.unwrap().unwrap();
    assert_eq!(
        first,
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("SET")),
            Frame::Bulk(Bytes::from("mykey")),
            Frame::Bulk(Bytes::from("a\r\nb")),
        ])
    );

    let second = framed.next().await.unwrap().unwrap();
    assert_eq!(second, Frame::Integer(7));
}

#[tokio::test]
async fn test_stream_ends_when_peer_closes() {
    let (tx, stream) = raw_peer().await.unwrap();
    let mut framed = Framed::new(stream, FrameCodec::new());

    tx.send(b"+OK\r\n".to_vec()).unwrap();
    drop(tx);

    assert_eq!(
        framed.next().await.unwrap().unwrap(),
        Frame::Simple("OK".to_string())
    );
    assert!(framed.next().await.is_none());
}

#[tokio::test]
async fn test_pipelined_requests_are_answered_in_order() {
    let mut framed = server().await;

    framed.feed(request(&["RPUSH", "l", "a", "b"])).await.unwrap();
    framed.feed(request(&["LRANGE", "l", "0", "-1"])).await.unwrap();
    framed.feed(request(&["LINDEX", "l", "5"])).await.unwrap();
    framed.send(request(&["PING"])).await.unwrap();

    assert_eq!(framed.next().await.unwrap().unwrap(), Frame::Integer(2));
    assert_eq!(
        framed.next().await.unwrap().unwrap(),
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("a")),
            Frame::Bulk(Bytes::from("b")),
        ])
    );
    assert_eq!(framed.next().await.unwrap().unwrap(), Frame::Null);
    assert_eq!(
        framed.next().await.unwrap().unwrap(),
        Frame::Simple("PONG".to_string())
    );
}

#[tokio::test]
async fn test_binary_values_round_trip_through_server() {
    let mut framed = server().await;

    let value = Bytes::from_static(b"\x00\xff\r\n\x01");
    framed
        .send(Frame::Array(vec![
            Frame::Bulk(Bytes::from("SET")),
            Frame::Bulk(Bytes::from("bin")),
            Frame::Bulk(value.clone()),
        ]))
        .await
        .unwrap();
    assert_eq!(
        framed.next().await.unwrap().unwrap(),
        Frame::Simple("OK".to_string())
    );

    framed.send(request(&["GET", "bin"])).await.unwrap();
    assert_eq!(framed.next().await.unwrap().unwrap(), Frame::Bulk(value));
}
