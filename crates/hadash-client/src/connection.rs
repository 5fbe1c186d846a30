//! WebSocket connection to the remote home-automation server
//!
//! Runs the auth handshake, then multiplexes id-correlated
//! request/response commands and the entity push subscription over one
//! socket. A reader task routes `result` frames to their waiting caller
//! and `event` frames to the registered entity subscriber.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use hadash_core::{Device, EntityMap, RegistryEntry};

use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type Pending = DashMap<u64, oneshot::Sender<Result<Value, ClientError>>>;

/// Callback invoked with the full entity map on every push
pub type EntityHandler = Arc<dyn Fn(EntityMap) + Send + Sync>;

/// An authenticated websocket connection
pub struct Connection {
    writer: Mutex<WsSink>,
    pending: Arc<Pending>,
    subscriptions: Arc<DashMap<u64, EntityHandler>>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Establish the websocket and run the auth handshake
    /// (`auth_required` → `auth` → `auth_ok` | `auth_invalid`).
    pub async fn connect(url: &str, token: &str) -> Result<Arc<Self>, ClientError> {
        let ws_url = ws_url(url);
        info!(url = %ws_url, "Connecting to server");

        let (ws_stream, _) = connect_async(&ws_url).await?;
        let (mut write, mut read) = ws_stream.split();

        let first = recv_json(&mut read).await?;
        if first.get("type").and_then(Value::as_str) != Some("auth_required") {
            return Err(ClientError::Protocol(format!(
                "expected auth_required, got {first}"
            )));
        }

        let auth_msg = json!({"type": "auth", "access_token": token});
        write.send(Message::Text(auth_msg.to_string())).await?;

        let reply = recv_json(&mut read).await?;
        match reply.get("type").and_then(Value::as_str) {
            Some("auth_ok") => debug!("Authenticated"),
            Some("auth_invalid") => {
                let message = reply
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("invalid access token")
                    .to_string();
                return Err(ClientError::AuthFailed(message));
            }
            _ => {
                return Err(ClientError::Protocol(format!(
                    "unexpected auth reply: {reply}"
                )))
            }
        }

        let pending: Arc<Pending> = Arc::new(DashMap::new());
        let subscriptions: Arc<DashMap<u64, EntityHandler>> = Arc::new(DashMap::new());
        let reader = tokio::spawn(read_loop(
            read,
            Arc::clone(&pending),
            Arc::clone(&subscriptions),
        ));

        Ok(Arc::new(Self {
            writer: Mutex::new(write),
            pending,
            subscriptions,
            next_id: AtomicU64::new(1),
            reader,
        }))
    }

    /// Send a command and await its `result` frame.
    ///
    /// The command id is assigned here; the payload only needs its
    /// `type` and any command-specific fields.
    pub async fn send_command(&self, mut payload: Value) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("id".into(), json!(id));
        }

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        {
            let mut writer = self.writer.lock().await;
            if let Err(err) = writer.send(Message::Text(payload.to_string())).await {
                self.pending.remove(&id);
                return Err(err.into());
            }
        }

        rx.await.map_err(|_| ClientError::ConnectionClosed)?
    }

    /// List the device registry
    pub async fn list_devices(&self) -> Result<Vec<Device>, ClientError> {
        let result = self
            .send_command(json!({"type": "config/device_registry/list"}))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// List the entity registry
    pub async fn list_entities(&self) -> Result<Vec<RegistryEntry>, ClientError> {
        let result = self
            .send_command(json!({"type": "config/entity_registry/list"}))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Subscribe to the entity push feed.
    ///
    /// The handler receives the full entity map on every push; it stays
    /// registered for the life of the connection.
    pub async fn subscribe_entities(&self, handler: EntityHandler) -> Result<(), ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions.insert(id, handler);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let payload = json!({"id": id, "type": "subscribe_entities"});
        {
            let mut writer = self.writer.lock().await;
            if let Err(err) = writer.send(Message::Text(payload.to_string())).await {
                self.pending.remove(&id);
                self.subscriptions.remove(&id);
                return Err(err.into());
            }
        }

        match rx.await.map_err(|_| ClientError::ConnectionClosed)? {
            Ok(_) => {
                debug!(subscription = id, "Subscribed to entity feed");
                Ok(())
            }
            Err(err) => {
                self.subscriptions.remove(&id);
                Err(err)
            }
        }
    }

    /// Invoke a service against a domain with a single target entity
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
    ) -> Result<Value, ClientError> {
        self.send_command(json!({
            "type": "call_service",
            "domain": domain,
            "service": service,
            "service_data": {"entity_id": entity_id}
        }))
        .await
    }

    /// Send a close frame to the server
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(err) = writer.send(Message::Close(None)).await {
            debug!(error = %err, "Close frame not delivered");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Derive the websocket endpoint from the configured base URL
fn ws_url(base_url: &str) -> String {
    let url = base_url
        .trim_end_matches('/')
        .replace("http://", "ws://")
        .replace("https://", "wss://");
    format!("{}/api/websocket", url)
}

/// Receive the next JSON text frame, skipping ping/pong
async fn recv_json(read: &mut WsSource) -> Result<Value, ClientError> {
    loop {
        let msg = read.next().await.ok_or(ClientError::ConnectionClosed)??;
        match msg {
            Message::Text(text) => return Ok(serde_json::from_str(&text)?),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return Err(ClientError::ConnectionClosed),
            other => {
                return Err(ClientError::Protocol(format!(
                    "unexpected frame: {other:?}"
                )))
            }
        }
    }
}

/// Route incoming frames until the socket closes, then fail anything
/// still waiting for a reply.
async fn read_loop(
    mut read: WsSource,
    pending: Arc<Pending>,
    subscriptions: Arc<DashMap<u64, EntityHandler>>,
) {
    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!(error = %err, "WebSocket read failed");
                break;
            }
        };

        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Discarding unparsable frame");
                continue;
            }
        };

        let id = value.get("id").and_then(Value::as_u64);
        match value.get("type").and_then(Value::as_str) {
            Some("result") => {
                if let Some(tx) = id.and_then(|id| pending.remove(&id).map(|(_, tx)| tx)) {
                    let _ = tx.send(command_result(&value));
                }
            }
            Some("event") => {
                let handler =
                    id.and_then(|id| subscriptions.get(&id).map(|h| Arc::clone(h.value())));
                if let Some(handler) = handler {
                    match parse_entities(&value) {
                        Ok(entities) => handler(entities),
                        Err(err) => warn!(error = %err, "Discarding unparsable entity push"),
                    }
                }
            }
            Some("pong") | None => {}
            Some(other) => debug!(message_type = other, "Ignoring message"),
        }
    }

    debug!("Connection reader finished");
    let waiting: Vec<u64> = pending.iter().map(|r| *r.key()).collect();
    for id in waiting {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(ClientError::ConnectionClosed));
        }
    }
}

/// Unpack a `result` frame into the command's outcome
fn command_result(value: &Value) -> Result<Value, ClientError> {
    if value.get("success").and_then(Value::as_bool).unwrap_or(false) {
        Ok(value.get("result").cloned().unwrap_or(Value::Null))
    } else {
        let code = value
            .pointer("/error/code")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let message = value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("command failed")
            .to_string();
        Err(ClientError::Command { code, message })
    }
}

/// Extract the full entity map from an `event` frame
fn parse_entities(value: &Value) -> Result<EntityMap, serde_json::Error> {
    let entities = value
        .pointer("/event/entities")
        .cloned()
        .unwrap_or(Value::Null);
    serde_json::from_value(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url() {
        assert_eq!(
            ws_url("http://hass.local:8123"),
            "ws://hass.local:8123/api/websocket"
        );
        assert_eq!(
            ws_url("https://hass.example.org/"),
            "wss://hass.example.org/api/websocket"
        );
    }

    #[test]
    fn test_command_result_success() {
        let frame = json!({"id": 1, "type": "result", "success": true, "result": [1, 2]});
        assert_eq!(command_result(&frame).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_command_result_failure() {
        let frame = json!({
            "id": 1,
            "type": "result",
            "success": false,
            "error": {"code": "not_found", "message": "no such service"}
        });
        match command_result(&frame) {
            Err(ClientError::Command { code, message }) => {
                assert_eq!(code, "not_found");
                assert_eq!(message, "no such service");
            }
            other => panic!("expected command error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_entities_from_event() {
        let frame = json!({
            "id": 2,
            "type": "event",
            "event": {"entities": {
                "light.lamp": {"entity_id": "light.lamp", "state": "on"}
            }}
        });
        let entities = parse_entities(&frame).unwrap();
        assert_eq!(entities["light.lamp"].state, "on");
    }
}
