//! Printer adapters for sending ZPL documents
//!
//! One [`Printer::send`] call is exactly one TCP connection:
//!
//! ```text
//! Idle -> Connecting -> Connected -> Sending -> AwaitingResponse -> Closed
//!            \______________\____________\_____________\-----> Error
//! ```
//!
//! The reply is whatever the printer sends before closing. A printer that
//! answers but keeps the socket open is acknowledged with what it sent once
//! the response timeout expires; only a printer that sends nothing times out.
//!
//! The socket is owned by a [`Connection`] whose lease on the open-connection
//! gauge is released on drop, so every exit path (success, error, timeout or
//! the future being dropped mid-flight) closes it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

use crate::error::{PrintError, PrintResult};
use crate::zpl::LabelDocument;

/// Default raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Printer address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterEndpoint {
    pub host: String,
    pub port: u16,
}

impl PrinterEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> PrintResult<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(PrintError::InvalidConfig("Empty printer host".to_string()));
        }
        if port == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid printer port for {}: 0",
                host
            )));
        }
        Ok(Self { host, port })
    }

    /// Parse `host:port`, defaulting to port 9100 when none is given
    pub fn parse(addr: &str) -> PrintResult<Self> {
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') || host.starts_with('[') => {
                let port = port
                    .parse()
                    .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;
                Self::new(host.trim_start_matches('[').trim_end_matches(']'), port)
            }
            _ => Self::new(addr, DEFAULT_PORT),
        }
    }
}

impl fmt::Display for PrinterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Bytes the printer sent back before closing; may be empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrinterAck(Vec<u8>);

impl PrinterAck {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// Connection lifecycle of a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Connecting,
    Connected,
    Sending,
    AwaitingResponse,
    Closed,
    Error,
}

impl TransportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransportState::Closed | TransportState::Error)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportState::Idle => "IDLE",
            TransportState::Connecting => "CONNECTING",
            TransportState::Connected => "CONNECTED",
            TransportState::Sending => "SENDING",
            TransportState::AwaitingResponse => "AWAITING_RESPONSE",
            TransportState::Closed => "CLOSED",
            TransportState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Trait for printer adapters
#[async_trait]
pub trait Printer: Send + Sync {
    /// Deliver one document and collect the printer's reply
    async fn send(&self, document: &LabelDocument) -> PrintResult<PrinterAck>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP port 9100)
///
/// Most label printers accept raw ZPL on port 9100. Clones share the
/// open-connection gauge.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    endpoint: PrinterEndpoint,
    timeout: Duration,
    open: Arc<AtomicUsize>,
}

impl NetworkPrinter {
    pub fn new(endpoint: PrinterEndpoint) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(5),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        Ok(Self::new(PrinterEndpoint::parse(addr)?))
    }

    /// Timeout applied to the connect phase and to the send/response phase
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &PrinterEndpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of sockets currently held open by this printer
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    async fn connect(&self, session: &mut Session) -> PrintResult<Connection> {
        session.enter(TransportState::Connecting);

        let host = self.endpoint.host.as_str();
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect((host, self.endpoint.port)))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.endpoint)))?
            .map_err(|e| PrintError::ConnectFailed(format!("{}: {}", self.endpoint, e)))?;

        let conn = Connection::new(stream, &self.open);
        session.enter(TransportState::Connected);
        Ok(conn)
    }

    async fn exchange(&self, session: &mut Session, data: &[u8]) -> PrintResult<PrinterAck> {
        let mut conn = self.connect(session).await?;

        session.enter(TransportState::Sending);
        tokio::time::timeout(self.timeout, conn.write_document(data))
            .await
            .map_err(|_| PrintError::Timeout(format!("Write timeout: {}", self.endpoint)))??;

        session.enter(TransportState::AwaitingResponse);
        let mut reply = Vec::new();
        let outcome = tokio::time::timeout(self.timeout, conn.read_reply(&mut reply)).await;
        match outcome {
            Ok(read) => read?,
            // Some printers answer but never close their side
            Err(_) if !reply.is_empty() => {
                debug!(ack_len = reply.len(), "Printer replied but kept the connection open");
            }
            Err(_) => {
                return Err(PrintError::Timeout(format!("No response from {}", self.endpoint)));
            }
        }

        Ok(PrinterAck::new(reply))
    }
}

#[async_trait]
impl Printer for NetworkPrinter {
    #[instrument(skip(self, document), fields(addr = %self.endpoint, data_len = document.len()))]
    async fn send(&self, document: &LabelDocument) -> PrintResult<PrinterAck> {
        let mut session = Session::new();
        info!("Connecting to printer");

        match self.exchange(&mut session, document.as_bytes()).await {
            Ok(ack) => {
                session.enter(TransportState::Closed);
                info!(ack_len = ack.as_bytes().len(), "Print job sent successfully");
                Ok(ack)
            }
            Err(e) => {
                session.enter(TransportState::Error);
                warn!(error = %e, "Print job failed");
                Err(e)
            }
        }
    }

    #[instrument(skip(self), fields(addr = %self.endpoint))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);
        let host = self.endpoint.host.as_str();

        match tokio::time::timeout(check_timeout, TcpStream::connect((host, self.endpoint.port)))
            .await
        {
            Ok(Ok(stream)) => {
                drop(Connection::new(stream, &self.open));
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Send one document to `endpoint` over a fresh connection
pub async fn send(
    endpoint: &PrinterEndpoint,
    document: &LabelDocument,
    timeout: Duration,
) -> PrintResult<PrinterAck> {
    NetworkPrinter::new(endpoint.clone())
        .with_timeout(timeout)
        .send(document)
        .await
}

/// Tracks and logs the state of one send
struct Session {
    state: TransportState,
}

impl Session {
    fn new() -> Self {
        Self {
            state: TransportState::Idle,
        }
    }

    fn enter(&mut self, next: TransportState) {
        debug!(from = %self.state, to = %next, "transport state");
        self.state = next;
    }
}

/// An open socket counted on the printer's gauge until dropped
struct Connection {
    stream: TcpStream,
    open: Arc<AtomicUsize>,
}

impl Connection {
    fn new(stream: TcpStream, open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            stream,
            open: Arc::clone(open),
        }
    }

    /// Write the whole document, then half-close to mark end of job
    async fn write_document(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        self.stream.shutdown().await
    }

    /// Append everything the printer sends to `reply` until it closes its side
    ///
    /// Bytes already appended survive the future being dropped.
    async fn read_reply(&mut self, reply: &mut Vec<u8>) -> std::io::Result<()> {
        let mut chunk = [0u8; 512];
        loop {
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            reply.extend_from_slice(&chunk[..n]);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
        debug!("printer connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new(PrinterEndpoint::new("192.168.1.100", 9100).unwrap());
        assert_eq!(printer.endpoint().port, 9100);
        assert_eq!(printer.open_connections(), 0);
    }

    #[test]
    fn test_network_printer_from_addr() {
        let printer = NetworkPrinter::from_addr("192.168.1.100:9100").unwrap();
        assert_eq!(printer.endpoint().host, "192.168.1.100");
        assert_eq!(printer.endpoint().port, 9100);
    }

    #[test]
    fn test_default_port() {
        let endpoint = PrinterEndpoint::parse("zebra.local").unwrap();
        assert_eq!(endpoint.port, DEFAULT_PORT);
        assert_eq!(endpoint.to_string(), "zebra.local:9100");
    }

    #[test]
    fn test_ipv6_endpoint() {
        let endpoint = PrinterEndpoint::parse("[::1]:6101").unwrap();
        assert_eq!(endpoint.host, "::1");
        assert_eq!(endpoint.to_string(), "[::1]:6101");
    }

    #[test]
    fn test_invalid_addr() {
        assert!(NetworkPrinter::from_addr("printer:notaport").is_err());
        assert!(PrinterEndpoint::new("192.168.1.100", 0).is_err());
        assert!(PrinterEndpoint::new("  ", 9100).is_err());
    }

    #[test]
    fn test_ack_text() {
        let ack = PrinterAck::new(b"OK".to_vec());
        assert_eq!(ack.text(), "OK");
        assert!(PrinterAck::default().is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransportState::Closed.is_terminal());
        assert!(TransportState::Error.is_terminal());
        assert!(!TransportState::AwaitingResponse.is_terminal());
    }
}
