//! WebSocket endpoints
//!
//! An [`Endpoint`] is a bound listener plus the URI other processes use to
//! reach it. The bind host and the advertised host are separate: a master
//! bound to `0.0.0.0` still hands out a routable address.
//!
//! [`Endpoint::serve`] runs the accept loop on a background task. Each
//! accepted connection is upgraded to a WebSocket and handed to the
//! connection callback on its own task. Connection tasks live in a `JoinSet`
//! owned by the accept loop, so shutting the endpoint down closes them too.
//!
//! [`serve_rpc`] specialises the loop for request/response traffic: every
//! text frame is decoded as a request, passed to a [`RequestHandler`] and
//! answered with one text frame.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;
use url::Url;

use crate::utils::ServerError;

/// Pause after a failed `accept` (for example when out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serves one RPC surface.
pub trait RequestHandler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    fn handle(&self, request: Self::Request) -> impl Future<Output = Self::Response> + Send;

    /// Response sent back for a frame that does not decode as a request.
    fn malformed(&self, reason: String) -> Self::Response;
}

#[derive(Debug)]
pub struct Endpoint {
    listener: TcpListener,
    uri: Url,
}

impl Endpoint {
    /// Bind `host:port` (port `0` picks a free port) and advertise it as
    /// `ws://advertise_host:<bound port>`.
    pub async fn bind(host: &str, port: u16, advertise_host: &str) -> Result<Self, ServerError> {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        let uri = Url::parse(&format!("ws://{}:{}", advertise_host, local_addr.port()))?;

        Ok(Self { listener, uri })
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections in the background until the returned handle is
    /// shut down or dropped.
    pub fn serve<F, Fut>(self, on_connection: F) -> EndpointHandle
    where
        F: Fn(WebSocketStream<TcpStream>, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let uri = self.uri.clone();
        let listener = self.listener;
        let on_connection = Arc::new(on_connection);

        let task = tokio::spawn(async move {
            let mut connections = JoinSet::new();

            loop {
                while connections.try_join_next().is_some() {}

                match listener.accept().await {
                    Ok((stream, peer)) => {
                        let on_connection = on_connection.clone();
                        connections.spawn(async move {
                            let ws_stream = match accept_async(stream).await {
                                Ok(ws) => ws,
                                Err(e) => {
                                    warn!("WebSocket handshake error from {peer}: {e}");
                                    return;
                                }
                            };
                            on_connection(ws_stream, peer).await;
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {e}, retrying in {ACCEPT_BACKOFF:?}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        });

        EndpointHandle { uri, task }
    }
}

/// Running endpoint. Dropping the handle stops it.
#[derive(Debug)]
pub struct EndpointHandle {
    uri: Url,
    task: JoinHandle<()>,
}

impl EndpointHandle {
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for EndpointHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve `handler` on `endpoint`.
pub fn serve_rpc<H: RequestHandler>(endpoint: Endpoint, handler: Arc<H>) -> EndpointHandle {
    endpoint.serve(move |ws_stream, peer| {
        let handler = handler.clone();
        async move { answer_requests(ws_stream, peer, handler).await }
    })
}

async fn answer_requests<H: RequestHandler>(
    ws_stream: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    handler: Arc<H>,
) {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        let response = match serde_json::from_str::<H::Request>(text) {
            Ok(request) => handler.handle(request).await,
            Err(err) => {
                warn!(
                    "Invalid request from {peer}: {err} | {}",
                    text.chars().take(100).collect::<String>()
                );
                handler.malformed(err.to_string())
            }
        };

        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize response for {peer}: {e}");
                break;
            }
        };

        if let Err(e) = ws_sender.send(WsMessage::text(json)).await {
            warn!("Failed to send response to {peer}: {e}");
            break;
        }
    }

    debug!("{peer} disconnected");
}
