use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use ipblock::gate::{Handler, Response};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

use super::request::HttpRequest;

/// Maximum size of a request head we are willing to buffer.
const MAX_HEAD_SIZE: usize = 8 * 1024;

/// Time a client gets to send its request head.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Handler behind the gate, answering callers that are not blocked.
#[derive(Debug, Default, Clone, Copy)]
pub struct Welcome;

#[async_trait]
impl Handler<HttpRequest> for Welcome {
    async fn handle(&self, request: HttpRequest) -> anyhow::Result<Response> {
        Ok(Response::ok(format!("Hello, {}!\n", request.real_ip())))
    }
}

pub struct HttpServer<H> {
    listener: TcpListener,
    handler: Arc<H>,
    trust_proxy: bool,
}

impl<H> HttpServer<H>
where
    H: Handler<HttpRequest> + 'static,
{
    pub async fn bind(addr: (&str, u16), handler: H, trust_proxy: bool) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}:{}", addr.0, addr.1))?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
            trust_proxy,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the exit signal fires.
    pub async fn run(self, mut exit_rx: watch::Receiver<()>) -> anyhow::Result<()> {
        info!("Server is listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = exit_rx.changed() => {
                    info!("Server stopped accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!("Failed to accept connection: {}", err);
                            continue;
                        }
                    };
                    let handler = self.handler.clone();
                    let trust_proxy = self.trust_proxy;
                    tokio::spawn(async move {
                        if let Err(err) = serve(stream, peer, handler, trust_proxy).await {
                            debug!("Connection from {} failed: {:#}", peer, err);
                        }
                    });
                }
            }
        }
    }
}

async fn serve<H>(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<H>,
    trust_proxy: bool,
) -> anyhow::Result<()>
where
    H: Handler<HttpRequest>,
{
    let head = timeout(READ_TIMEOUT, read_head(&mut stream))
        .await
        .context("timed out reading request head")??;

    let response = match head {
        Some(head) => respond(&head, peer, handler, trust_proxy).await,
        None => {
            debug!("Request head from {} exceeds {} bytes", peer, MAX_HEAD_SIZE);
            Response::new(431, "Request Header Fields Too Large")
        }
    };

    stream.write_all(response.to_http().as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn respond<H>(head: &str, peer: SocketAddr, handler: Arc<H>, trust_proxy: bool) -> Response
where
    H: Handler<HttpRequest>,
{
    match HttpRequest::parse(peer.ip(), head, trust_proxy) {
        Ok(request) => {
            debug!("{} {} from {}", request.method, request.path, request.real_ip());
            match handler.handle(request).await {
                Ok(response) => response,
                Err(err) => {
                    error!("Handler failed for {}: {:#}", peer, err);
                    Response::new(500, "Internal Server Error")
                }
            }
        }
        Err(reason) => {
            debug!("Malformed request from {}: {}", peer, reason);
            Response::new(400, reason)
        }
    }
}

/// Reads the request head, or `None` when it doesn't fit in `MAX_HEAD_SIZE`.
///
/// The reader is capped one byte past the limit, so a line without a
/// newline can't make us buffer more than that.
async fn read_head(stream: &mut TcpStream) -> anyhow::Result<Option<String>> {
    let limit = MAX_HEAD_SIZE as u64 + 1;
    let mut reader = BufReader::new(stream.take(limit));
    let mut head = String::new();

    loop {
        let read = reader.read_line(&mut head).await?;
        if head.ends_with("\r\n\r\n") || head.ends_with("\n\n") {
            break;
        }
        if head.len() > MAX_HEAD_SIZE {
            return Ok(None);
        }
        if read == 0 {
            break;
        }
    }

    Ok(Some(head))
}
