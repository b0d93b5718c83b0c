//! WebSocket RPC client
//!
//! `call` opens a connection, sends the request as a text frame, waits for
//! the first text frame in return and closes. The whole exchange is bounded
//! by `timeout`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_tungstenite::connect_async;
use tracing::trace;
use tungstenite::protocol::Message as WsMessage;
use url::Url;

use crate::utils::RpcError;

pub async fn call<Req, Resp>(uri: &Url, request: &Req, timeout: Duration) -> Result<Resp, RpcError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    match tokio::time::timeout(timeout, exchange(uri, request)).await {
        Ok(result) => result,
        Err(_) => Err(RpcError::Timeout(timeout)),
    }
}

async fn exchange<Req, Resp>(uri: &Url, request: &Req) -> Result<Resp, RpcError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let (mut ws_stream, _) = connect_async(uri.as_str()).await?;

    let text = serde_json::to_string(request)?;
    trace!("-> {uri}: {text}");
    ws_stream.send(WsMessage::text(text)).await?;

    while let Some(msg) = ws_stream.next().await {
        let msg = msg?;
        if msg.is_text() {
            let text = msg.to_text()?;
            trace!("<- {uri}: {text}");
            let response: Resp = serde_json::from_str(text)?;
            let _ = ws_stream.close(None).await;
            return Ok(response);
        }
        if msg.is_close() {
            break;
        }
    }

    Err(RpcError::Closed)
}
