//! WebSocket push transport.
//!
//! `GET /api/v1/ws/:group_id?role=owner&token=...` or
//! `?role=participant&deviceId=...` upgrades to a socket that receives every
//! event the role may see. The server pings every heartbeat interval and
//! drops the connection after two missed pongs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use chrono::Utc;
use domain::models::realtime::{ClientFrame, ServerFrame};
use domain::models::Role;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{Credentials, UserAuth};
use crate::realtime::bus::{EventBus, Frame, Subscription};
use crate::services::access::{authorize, Relation};

const MAX_MISSED_PONGS: u8 = 2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub role: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<ConnectQuery>,
    header_creds: Credentials,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let role: Role = query.role.parse().map_err(ApiError::validation)?;

    // Browsers cannot set headers on a WebSocket handshake, so the query wins.
    let user = match query.token.as_deref() {
        Some(token) => UserAuth::validate(&state.jwt, token).ok(),
        None => header_creds.user,
    };
    let creds = Credentials::new(user, query.device_id.or(header_creds.device_id));

    let relation = match role {
        Role::Owner => Relation::Owner,
        Role::Participant => Relation::Participant,
    };
    authorize(&state, &creds, group_id, relation).await?;

    let bus = state.bus.clone();
    let heartbeat = Duration::from_secs(state.config.realtime.heartbeat_secs.max(1));
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, bus, group_id, role, heartbeat)))
}

fn encode(frame: &ServerFrame) -> Option<Frame> {
    serde_json::to_string(frame).ok().map(Frame::from)
}

async fn handle_socket(
    socket: WebSocket,
    bus: EventBus,
    group_id: Uuid,
    role: Role,
    heartbeat_every: Duration,
) {
    let (mut sender, mut receiver) = socket.split();
    let Subscription { conn_id, mut rx } = bus.register(group_id, role).await;
    info!(%group_id, %conn_id, role = %role, "Realtime client connected");

    let connected = encode(&ServerFrame::Connected {
        group_id,
        role,
        timestamp: Utc::now(),
    });
    let greeted = match connected {
        Some(frame) => sender.send(Message::Text(frame.to_string())).await.is_ok(),
        None => false,
    };
    if !greeted {
        bus.deregister(conn_id).await;
        return;
    }

    // Replies produced by the receive loop go out through the send task.
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Frame>();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();

    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_every);
        heartbeat.tick().await;
        let mut missed: u8 = 0;

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    // `None` means the group was closed.
                    let Some(frame) = frame else { break };
                    if sender.send(Message::Text(frame.to_string())).await.is_err() {
                        break;
                    }
                }
                reply = reply_rx.recv() => {
                    let Some(reply) = reply else { break };
                    if sender.send(Message::Text(reply.to_string())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::AcqRel) {
                        missed = 0;
                    } else {
                        missed += 1;
                        if missed >= MAX_MISSED_PONGS {
                            warn!(%conn_id, "Heartbeat timeout, dropping realtime client");
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(ClientFrame::Ping) => {
                        let pong = encode(&ServerFrame::Pong {
                            timestamp: Utc::now(),
                        });
                        if let Some(pong) = pong {
                            if reply_tx.send(pong).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(ClientFrame::Unknown) | Err(_) => {
                        debug!(%conn_id, "Ignoring client frame");
                    }
                },
                Message::Pong(_) => pong_received.store(true, Ordering::Release),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    bus.deregister(conn_id).await;
    info!(%group_id, %conn_id, "Realtime client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_query_shape() {
        let q: ConnectQuery =
            serde_json::from_value(serde_json::json!({"role": "student", "deviceId": "tab-1"}))
                .unwrap();
        assert_eq!(q.role.parse::<Role>().unwrap(), Role::Participant);
        assert_eq!(q.device_id.as_deref(), Some("tab-1"));
        assert!(q.token.is_none());
    }

    #[test]
    fn test_pong_frame_encoding() {
        let frame = encode(&ServerFrame::Pong {
            timestamp: Utc::now(),
        })
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "pong");
    }
}
