use super::message::{DataFrame, MasterRequest, MasterResponse, Message, SlaveRequest, SlaveResponse};
use super::server::{Endpoint, RequestHandler, serve_rpc};
use super::{WEBSOCKET_PROTOCOL, rpc};
use crate::utils::RpcError;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

struct TopicHandler {
    delay: Duration,
}

impl RequestHandler for TopicHandler {
    type Request = SlaveRequest;
    type Response = SlaveResponse;

    async fn handle(&self, request: SlaveRequest) -> SlaveResponse {
        tokio::time::sleep(self.delay).await;
        match request {
            SlaveRequest::RequestTopic { topic, .. } if topic == "/foo" => SlaveResponse::TopicEndpoint {
                protocol: WEBSOCKET_PROTOCOL.to_string(),
                endpoint: Url::parse("ws://127.0.0.1:9999").unwrap(),
            },
            SlaveRequest::RequestTopic { topic, .. } => SlaveResponse::NotPublishing { topic },
            SlaveRequest::PublisherUpdate { .. } => SlaveResponse::Ack,
        }
    }

    fn malformed(&self, reason: String) -> SlaveResponse {
        SlaveResponse::Error { message: reason }
    }
}

async fn start(delay: Duration) -> super::EndpointHandle {
    let endpoint = Endpoint::bind("127.0.0.1", 0, "127.0.0.1").await.unwrap();
    serve_rpc(endpoint, Arc::new(TopicHandler { delay }))
}

#[test]
fn test_master_request_wire_shape() {
    let unit = serde_json::to_value(MasterRequest::PublishedTopics).unwrap();
    assert_eq!(unit, json!({ "type": "published_topics" }));

    let lookup = serde_json::to_value(MasterRequest::LookupPublishers {
        topic: "/foo".to_string(),
    })
    .unwrap();
    assert_eq!(lookup, json!({ "type": "lookup_publishers", "topic": "/foo" }));

    let parsed: MasterResponse =
        serde_json::from_value(json!({ "type": "error", "message": "boom" })).unwrap();
    assert!(matches!(parsed, MasterResponse::Error { message } if message == "boom"));
}

#[test]
fn test_data_frame_message_is_flattened() {
    let frame = DataFrame::Message(Message {
        topic: "/foo".to_string(),
        payload: "Hello, ROS!".to_string(),
        timestamp: 7,
    });
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(
        value,
        json!({ "type": "message", "topic": "/foo", "payload": "Hello, ROS!", "timestamp": 7 })
    );
}

#[test]
fn test_message_new_sets_timestamp() {
    let message = Message::new("/foo", "hi");
    assert_eq!(message.payload, "hi");
    assert!(message.timestamp > 0);
}

#[tokio::test]
async fn test_endpoint_advertises_bound_port() {
    let endpoint = Endpoint::bind("127.0.0.1", 0, "localhost").await.unwrap();
    let port = endpoint.local_addr().unwrap().port();
    assert_eq!(endpoint.uri().host_str(), Some("localhost"));
    assert_eq!(endpoint.uri().port(), Some(port));
    assert_eq!(endpoint.uri().scheme(), "ws");
}

#[tokio::test]
async fn test_rpc_round_trip() {
    let handle = start(Duration::ZERO).await;

    let response: SlaveResponse = rpc::call(
        handle.uri(),
        &SlaveRequest::RequestTopic {
            topic: "/foo".to_string(),
            protocols: vec![WEBSOCKET_PROTOCOL.to_string()],
        },
        Duration::from_secs(1),
    )
    .await
    .unwrap();

    match response {
        SlaveResponse::TopicEndpoint { protocol, endpoint } => {
            assert_eq!(protocol, WEBSOCKET_PROTOCOL);
            assert_eq!(endpoint.port(), Some(9999));
        }
        other => panic!("Expected TopicEndpoint, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_request_gets_error_response() {
    let handle = start(Duration::ZERO).await;
    let (mut ws_stream, _) = tokio_tungstenite::connect_async(handle.uri().as_str())
        .await
        .expect("WebSocket handshake failed");

    ws_stream
        .send(WsMessage::text("{\"type\":\"nonsense\"}"))
        .await
        .unwrap();

    let response = ws_stream.next().await.expect("Did not receive response").unwrap();
    let parsed: SlaveResponse = serde_json::from_str(response.to_text().unwrap()).unwrap();
    assert!(matches!(parsed, SlaveResponse::Error { .. }));
}

#[tokio::test]
async fn test_rpc_times_out() {
    let handle = start(Duration::from_millis(500)).await;

    let result: Result<SlaveResponse, RpcError> = rpc::call(
        handle.uri(),
        &SlaveRequest::PublisherUpdate {
            topic: "/foo".to_string(),
            revision: 1,
            publishers: vec![],
        },
        Duration::from_millis(50),
    )
    .await;

    assert!(matches!(result, Err(RpcError::Timeout(_))));
}

#[tokio::test]
async fn test_rpc_to_closed_port_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let uri = Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap();
    let result: Result<SlaveResponse, RpcError> = rpc::call(
        &uri,
        &SlaveRequest::PublisherUpdate {
            topic: "/foo".to_string(),
            revision: 1,
            publishers: vec![],
        },
        Duration::from_secs(1),
    )
    .await;

    assert!(matches!(result, Err(RpcError::Transport(_))));
}

#[tokio::test]
async fn test_endpoint_shutdown_stops_accepting() {
    let handle = start(Duration::ZERO).await;
    let uri = handle.uri().clone();
    handle.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_running());

    let result: Result<SlaveResponse, RpcError> = rpc::call(
        &uri,
        &SlaveRequest::PublisherUpdate {
            topic: "/foo".to_string(),
            revision: 1,
            publishers: vec![],
        },
        Duration::from_millis(500),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_endpoint_survives_failed_handshake() {
    use tokio::io::AsyncWriteExt;

    let handle = start(Duration::ZERO).await;
    let addr = format!(
        "{}:{}",
        handle.uri().host_str().unwrap(),
        handle.uri().port().unwrap()
    );

    let mut raw = tokio::net::TcpStream::connect(&addr).await.unwrap();
    raw.write_all(b"not an http upgrade\r\n\r\n").await.unwrap();
    drop(raw);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(handle.is_running());
    let response: SlaveResponse = rpc::call(
        handle.uri(),
        &SlaveRequest::RequestTopic {
            topic: "/foo".to_string(),
            protocols: vec![WEBSOCKET_PROTOCOL.to_string()],
        },
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    assert!(matches!(response, SlaveResponse::TopicEndpoint { .. }));
}

#[test]
fn test_publisher_update_revision_defaults_to_zero() {
    let parsed: SlaveRequest = serde_json::from_value(json!({
        "type": "publisher_update",
        "topic": "/foo",
        "publishers": []
    }))
    .unwrap();
    assert!(matches!(parsed, SlaveRequest::PublisherUpdate { revision: 0, .. }));
}
