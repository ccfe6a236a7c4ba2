use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::models::snapshot::{OfflineBanner, OrderSnapshot};
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFrame<'a> {
    sequence: u64,
    #[serde(flatten)]
    snapshot: &'a OrderSnapshot,
    offline_banner: Option<OfflineBanner>,
}

/// Tracks what a client has already received so identical snapshots are not resent.
/// The first snapshot is always delivered so a new client starts with the full list.
#[derive(Default)]
pub(crate) struct SnapshotFeed {
    last_sent: Option<Arc<OrderSnapshot>>,
    sequence: u64,
}

impl SnapshotFeed {
    pub(crate) fn frame_for(
        &mut self,
        snapshot: Arc<OrderSnapshot>,
    ) -> Result<Option<String>, serde_json::Error> {
        if self.last_sent.as_deref() == Some(snapshot.as_ref()) {
            return Ok(None);
        }

        let json = serde_json::to_string(&SnapshotFrame {
            sequence: self.sequence + 1,
            snapshot: &snapshot,
            offline_banner: snapshot.offline_banner(),
        })?;

        self.sequence += 1;
        self.last_sent = Some(snapshot);
        Ok(Some(json))
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = WatchStream::new(state.repository.watch());

    info!("websocket client connected");

    let send_task = tokio::spawn(async move {
        let mut feed = SnapshotFeed::default();

        while let Some(snapshot) = snapshots.next().await {
            let json = match feed.frame_for(snapshot) {
                Ok(Some(json)) => json,
                Ok(None) => {
                    debug!("snapshot unchanged; nothing sent");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "failed to serialize order snapshot for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket client disconnected");
}
