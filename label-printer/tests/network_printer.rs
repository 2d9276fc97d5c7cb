use label_printer::{
    ImagePlacement, LabelSpec, NetworkPrinter, PrintError, Printer, PrinterEndpoint, encode, send,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn document() -> label_printer::LabelDocument {
    encode(
        &LabelSpec::default(),
        &ImagePlacement::new(50, 50, (0u8..10).collect::<Vec<_>>()),
    )
    .unwrap()
}

fn printer_for(addr: SocketAddr, timeout: Duration) -> NetworkPrinter {
    NetworkPrinter::new(PrinterEndpoint::new(addr.ip().to_string(), addr.port()).unwrap())
        .with_timeout(timeout)
}

/// Reads the whole job, optionally replies, then closes
async fn replying_printer(reply: &'static [u8]) -> (SocketAddr, oneshot::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        if !reply.is_empty() {
            socket.write_all(reply).await.unwrap();
        }
        let _ = tx.send(received);
    });

    (addr, rx)
}

/// Accepts and reads, but never answers or closes
async fn silent_printer() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut sink = Vec::new();
        let _ = socket.read_to_end(&mut sink).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    addr
}

#[tokio::test]
async fn test_document_delivered_and_ack_captured() {
    let (addr, received) = replying_printer(b"OK\r\n").await;
    let printer = printer_for(addr, Duration::from_secs(2));
    let doc = document();

    let ack = printer.send(&doc).await.unwrap();

    assert_eq!(ack.as_bytes(), b"OK\r\n");
    assert_eq!(received.await.unwrap(), doc.as_bytes());
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_close_without_reply_is_empty_ack() {
    let (addr, _received) = replying_printer(b"").await;
    let printer = printer_for(addr, Duration::from_secs(2));

    let ack = printer.send(&document()).await.unwrap();

    assert!(ack.is_empty());
    assert_eq!(printer.open_connections(), 0);
}

/// Reads the whole job, replies, then holds the socket open
async fn lingering_printer(reply: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        socket.write_all(reply).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    addr
}

#[tokio::test]
async fn test_reply_without_close_is_acknowledged() {
    let addr = lingering_printer(b"OK\r\n").await;
    let printer = printer_for(addr, Duration::from_millis(300));

    let ack = printer.send(&document()).await.unwrap();

    assert_eq!(ack.as_bytes(), b"OK\r\n");
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_reset_during_write_is_socket_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        // Abortive close: RST instead of FIN
        socket.set_linger(Some(Duration::ZERO)).unwrap();
        drop(socket);
    });

    let big = encode(
        &LabelSpec::default(),
        &ImagePlacement::new(0, 0, vec![0xAA; 8 * 1024 * 1024]),
    )
    .unwrap();
    let printer = printer_for(addr, Duration::from_secs(5));

    let result = printer.send(&big).await;

    assert!(matches!(result, Err(PrintError::Socket(_))), "{:?}", result);
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_refused_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let printer = printer_for(addr, Duration::from_secs(2));
    let result = printer.send(&document()).await;

    assert!(matches!(result, Err(PrintError::ConnectFailed(_))), "{:?}", result);
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_silent_printer_times_out() {
    let addr = silent_printer().await;
    let printer = printer_for(addr, Duration::from_millis(200));

    let result = printer.send(&document()).await;

    assert!(matches!(result, Err(PrintError::Timeout(_))), "{:?}", result);
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_abandoned_send_releases_socket() {
    let addr = silent_printer().await;
    let printer = printer_for(addr, Duration::from_secs(30));

    let abandoned = tokio::time::timeout(Duration::from_millis(200), printer.send(&document())).await;

    assert!(abandoned.is_err());
    assert_eq!(printer.open_connections(), 0);
}

#[tokio::test]
async fn test_send_function() {
    let (addr, received) = replying_printer(b"").await;
    let endpoint = PrinterEndpoint::new("127.0.0.1", addr.port()).unwrap();
    let doc = document();

    let ack = send(&endpoint, &doc, Duration::from_secs(2)).await.unwrap();

    assert!(ack.is_empty());
    let bytes = received.await.unwrap();
    assert!(bytes.starts_with(b"^XA\n"));
    assert!(bytes.ends_with(b"^XZ\n"));
}

#[tokio::test]
async fn test_is_online() {
    let (addr, _received) = replying_printer(b"").await;
    assert!(printer_for(addr, Duration::from_secs(1)).is_online().await);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);
    assert!(!printer_for(closed, Duration::from_secs(1)).is_online().await);
}
