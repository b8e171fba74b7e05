use crate::state::{PositionRecord, Subscription};
use crate::subscription::protocol::{ClientMessage, ErrorMessage, PositionUpdateMessage};
use axum::extract::ws::{Message, WebSocket};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Manages a single WebSocket connection fed by one hub subscription
pub struct ConnectionManager {
    /// Object ids this connection asked for; empty means everything
    filter: HashSet<i64>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            filter: HashSet::new(),
        }
    }

    /// Handle WebSocket connection lifecycle.
    ///
    /// Sends `snapshot` first, then streams the subscription until either side
    /// closes. The subscription is dropped on return, which unregisters it.
    pub async fn handle(
        mut self,
        mut socket: WebSocket,
        mut subscription: Subscription,
        snapshot: Vec<PositionRecord>,
    ) {
        let id = subscription.id();
        info!(subscription = %id, snapshot = snapshot.len(), "WebSocket connection established");

        for position in snapshot {
            if self.should_forward(&position) {
                if let Err(e) = send_position(&mut socket, position).await {
                    warn!(subscription = %id, error = %e, "Failed to send snapshot");
                    return;
                }
            }
        }

        loop {
            tokio::select! {
                msg = socket.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.apply_client_message(&text) {
                                warn!(subscription = %id, error = %e, "Invalid client message");
                                let reply = ErrorMessage::new(e.to_string());
                                if let Err(e) = send_json(&mut socket, &reply).await {
                                    error!(error = %e, "Failed to send error message");
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(subscription = %id, "WebSocket client disconnected");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, pong messages
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                position = subscription.recv() => {
                    match position {
                        Some(position) => {
                            if self.should_forward(&position) {
                                if let Err(e) = send_position(&mut socket, position).await {
                                    error!(error = %e, "Failed to send position update");
                                    break;
                                }
                            }
                        }
                        None => {
                            info!(subscription = %id, "Hub closed subscription");
                            let _ = socket.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        }

        info!(subscription = %id, "WebSocket connection closed");
    }

    /// Apply a subscribe/unsubscribe filter message
    pub fn apply_client_message(&mut self, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = serde_json::from_str(text)?;

        match msg {
            ClientMessage::Subscribe { object_id } => {
                info!(object_id = object_id, "Client subscribed to object");
                self.filter.insert(object_id);
            }
            ClientMessage::Unsubscribe { object_id } => {
                info!(object_id = object_id, "Client unsubscribed from object");
                self.filter.remove(&object_id);
            }
        }

        Ok(())
    }

    /// Check if a record should be forwarded to this connection
    pub fn should_forward(&self, position: &PositionRecord) -> bool {
        self.filter.is_empty() || self.filter.contains(&position.object_id)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn send_position(socket: &mut WebSocket, position: PositionRecord) -> anyhow::Result<()> {
    send_json(socket, &PositionUpdateMessage::from(position)).await
}

async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, msg: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
