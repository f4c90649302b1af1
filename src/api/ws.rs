use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::{controller::AppState, simulation::SimulationResult};

#[derive(Debug, Serialize)]
pub struct SunEvent<'a> {
    pub event: &'a str,
    pub data: SimulationResult,
}

impl SunEvent<'_> {
    pub fn update(data: SimulationResult) -> Self {
        SunEvent { event: "sunUpdate", data }
    }
}

/// GET /ws - live sun updates, one message per scheduler tick
pub async fn sun_socket(ws: WebSocketUpgrade, State(st): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_updates(socket, st))
}

async fn stream_updates(socket: WebSocket, st: AppState) {
    let mut updates = st.live.subscribe();
    let (mut sender, mut receiver) = socket.split();
    debug!(subscribers = st.live.subscriber_count(), "sun socket connected");

    // New subscribers get the cached value straight away
    if let Some(latest) = st.scheduler.latest() {
        if send(&mut sender, latest).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(result) => {
                    if send(&mut sender, result).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "sun socket lagging, dropped updates");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("sun socket closed");
}

async fn send(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    result: SimulationResult,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(&SunEvent::update(result)) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to encode sun update");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}
