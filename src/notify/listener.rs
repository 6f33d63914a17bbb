//! Inbound diagnostic listener.
//!
//! Accepts TCP connections and logs every chunk of text it receives. It never
//! writes anything back to the peer.

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Default port the listener binds to.
pub const DEFAULT_LISTENER_PORT: u16 = 5000;

const READ_BUFFER_SIZE: usize = 4096;

/// One chunk of text received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub peer: SocketAddr,
    pub text: String,
}

/// Long-lived TCP acceptor that logs whatever it is sent.
pub struct Listener {
    inner: TcpListener,
    tap: Option<mpsc::UnboundedSender<Received>>,
}

impl Listener {
    /// Bind to `addr`.
    pub async fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        Ok(Self { inner, tap: None })
    }

    /// Mirror every logged chunk into `tap` as well.
    pub fn with_tap(mut self, tap: mpsc::UnboundedSender<Received>) -> Self {
        self.tap = Some(tap);
        self
    }

    /// The address actually bound, useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept connections forever.
    ///
    /// Each connection is read on its own task. A failed accept is logged
    /// and the loop moves on to the next one.
    pub async fn run(self) {
        if let Ok(addr) = self.inner.local_addr() {
            info!("TCP listener waiting on {addr}");
        }

        loop {
            match self.inner.accept().await {
                Ok((stream, peer)) => {
                    info!("TCP client connected: {peer}");
                    let tap = self.tap.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, tap).await;
                    });
                }
                Err(e) => {
                    error!("accept error: {e}");
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    tap: Option<mpsc::UnboundedSender<Received>>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("TCP client disconnected: {peer}");
                break;
            }
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                info!(%peer, "received message: {text}");
                if let Some(tap) = &tap {
                    let _ = tap.send(Received { peer, text });
                }
            }
            Err(e) => {
                debug!("read error from {peer}: {e}");
                break;
            }
        }
    }
}
