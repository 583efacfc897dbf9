// src/server.rs
//! HTTP ingest endpoint and WebSocket subscriber endpoint

use crate::{
    config::RelayConfig,
    error::{RelayError, Result},
    gps::{gate, Fix, Payload, SentenceDecoder},
    relay::Relay,
    store::{FixStore, RECENT_LIMIT},
};
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info, warn};
use std::{future::IntoFuture, time::Duration};
use tokio::{net::TcpListener, time::timeout};

pub const NO_DATA_MESSAGE: &str = "No NMEA data received";
pub const NO_FIX_MESSAGE: &str = "No valid GPS data found";

/// Longest a single WebSocket write may take before the subscriber is dropped
pub const SUBSCRIBER_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of pushing one payload through decode, gate and relay
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted(Fix),
    NoData,
    NoFix,
}

/// Shared state behind the HTTP routes
#[derive(Debug, Clone)]
pub struct AppState {
    pub decoder: SentenceDecoder,
    pub relay: Relay,
    pub store: Option<FixStore>,
}

impl AppState {
    pub fn new(decoder: SentenceDecoder, relay: Relay, store: Option<FixStore>) -> Self {
        Self {
            decoder,
            relay,
            store,
        }
    }

    /// Decode a payload and, if it holds a usable fix, persist and broadcast it.
    ///
    /// Must run inside a tokio runtime when a store is configured, since the
    /// insert is spawned rather than awaited.
    pub fn ingest(&self, payload: Payload) -> IngestOutcome {
        let text = match payload {
            Payload::Text(text) if text.trim().is_empty() => {
                warn!("Rejected empty NMEA payload");
                return IngestOutcome::NoData;
            }
            Payload::Text(text) => text,
            Payload::Unparseable => {
                error!("Rejected NMEA payload that is not valid UTF-8 text");
                return IngestOutcome::NoData;
            }
        };

        let fix = match gate::accept(self.decoder.decode(&text)) {
            Some(fix) => fix,
            None => {
                warn!("No valid GPS data in payload of {} bytes", text.len());
                return IngestOutcome::NoFix;
            }
        };

        info!(
            "Received {} fix at {} ({:?}, {:?})",
            fix.kind().tag(),
            fix.time,
            fix.latitude,
            fix.longitude
        );

        if let Some(store) = &self.store {
            let store = store.clone();
            let stored = fix.clone();
            tokio::spawn(async move {
                if let Err(e) = store.insert(&stored).await {
                    error!("Failed to persist {} fix: {}", stored.kind().tag(), e);
                }
            });
        }

        match self.relay.broadcast(&fix) {
            Ok(delivered) => debug!("Fix delivered to {} subscribers", delivered),
            Err(e) => error!("Failed to broadcast fix: {}", e),
        }

        IngestOutcome::Accepted(fix)
    }
}

/// Routes served on the HTTP port
pub fn http_router(state: AppState) -> Router {
    Router::new()
        .route("/nmea", post(ingest))
        .route("/locations", get(recent_locations))
        .route("/health", get(health))
        .with_state(state)
}

/// Routes served on the WebSocket port
pub fn ws_router(relay: Relay) -> Router {
    Router::new().route("/", get(subscribe)).with_state(relay)
}

async fn ingest(State(state): State<AppState>, body: Bytes) -> Response {
    match state.ingest(Payload::from_bytes(&body)) {
        IngestOutcome::Accepted(fix) => (StatusCode::OK, Json(fix)).into_response(),
        IngestOutcome::NoData => (StatusCode::BAD_REQUEST, NO_DATA_MESSAGE).into_response(),
        IngestOutcome::NoFix => (StatusCode::BAD_REQUEST, NO_FIX_MESSAGE).into_response(),
    }
}

async fn recent_locations(State(state): State<AppState>) -> Response {
    let Some(store) = &state.store else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Persistence is not configured").into_response();
    };

    match store.recent(RECENT_LIMIT).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            error!("Failed to load recent locations: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load locations").into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "subscribers": state.relay.subscriber_count(),
    }))
    .into_response()
}

async fn subscribe(ws: WebSocketUpgrade, State(relay): State<Relay>) -> Response {
    ws.on_upgrade(move |socket| serve_subscriber(socket, relay))
}

/// Pump relay frames to one WebSocket until either side goes away
async fn serve_subscriber(mut socket: WebSocket, relay: Relay) {
    let mut subscription = relay.connect();
    let id = subscription.id();

    loop {
        tokio::select! {
            frame = subscription.recv() => match frame {
                Some(frame) => {
                    match timeout(SUBSCRIBER_SEND_TIMEOUT, socket.send(Message::Text(frame.to_string()))).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            warn!("Send to subscriber {} failed: {}", id, e);
                            break;
                        }
                        Err(_) => {
                            warn!("Send to subscriber {} timed out after {:?}", id, SUBSCRIBER_SEND_TIMEOUT);
                            break;
                        }
                    }
                }
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(message)) => debug!("Ignoring message from subscriber {}: {:?}", id, message),
                Some(Err(e)) => {
                    debug!("Subscriber {} read error: {}", id, e);
                    break;
                }
            },
        }
    }

    relay.disconnect(id);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| RelayError::Other(format!("Failed to bind {}: {}", addr, e)))
}

/// Open the store (if configured), bind both listeners and serve until Ctrl+C
pub async fn run(config: RelayConfig) -> Result<()> {
    let store = match &config.database_url {
        Some(url) => {
            let store = FixStore::connect(url, config.database_max_connections).await?;
            info!("Persisting fixes to {}", url);
            Some(store)
        }
        None => {
            info!("No database configured, running broadcast-only");
            None
        }
    };

    let relay = Relay::with_capacity(config.subscriber_queue_capacity);
    let state = AppState::new(SentenceDecoder::new(config.utc_offset_hours), relay.clone(), store);

    let http_listener = bind(&config.http_addr()).await?;
    let ws_listener = bind(&config.ws_addr()).await?;

    info!("HTTP ingest listening on http://{}", http_listener.local_addr()?);
    info!("WebSocket relay listening on ws://{}", ws_listener.local_addr()?);

    let http = axum::serve(http_listener, http_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let ws = axum::serve(ws_listener, ws_router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::try_join!(http, ws)?;
    Ok(())
}
