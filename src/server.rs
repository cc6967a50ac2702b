use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{
        Path as UrlPath, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use std::{
    net::SocketAddr,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    clock::PlaybackClock,
    config::Config,
    pages::Pages,
    protocol::{ClientCommand, ServerEvent},
    session::{ClockHandle, spawn_clock},
    timeline::Timeline,
};

#[derive(Clone)]
pub struct AppState {
    pages: Arc<Pages>,
    clock: ClockHandle,
    static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(pages: Pages, clock: ClockHandle, static_dir: PathBuf) -> Self {
        Self {
            pages: Arc::new(pages),
            clock,
            static_dir: Arc::new(static_dir),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/watch", get(watch))
        .route("/control", get(control))
        .route("/timeline.json", get(timeline_json))
        .route("/ws", get(ws_handler))
        .route("/*path", get(static_file))
        .with_state(state)
}

pub async fn run_serve(timeline: Timeline, cfg: &Config) -> Result<()> {
    let pages = Pages::render(&timeline)?;
    let clock = PlaybackClock::new(cfg.clock.initial_offset_ms);
    let (handle, clock_task) = spawn_clock(clock, &cfg.clock);

    let state = AppState::new(pages, handle, PathBuf::from(&cfg.server.static_dir));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .context("failed to parse listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local listener address")?;

    tracing::info!(address = %actual_addr, entries = timeline.len(), "server running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    // Upgraded sockets may still hold clock handles, so the owner is not
    // waited on.
    clock_task.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn root(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.root.clone())
}

async fn watch(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.watch.clone())
}

async fn control(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.control.clone())
}

async fn timeline_json(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.pages.timeline_json.clone(),
    )
        .into_response()
}

async fn static_file(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    let Some(file) = resolve_static(&state.static_dir, &path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read(&file).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response(),
        Err(err) => {
            tracing::debug!(path = %file.display(), error = %err, "static file not served");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Joins a request path onto the static root, refusing anything that could
/// climb out of it.
fn resolve_static(root: &Path, request: &str) -> Option<PathBuf> {
    let relative = Path::new(request.trim_start_matches('/'));
    let mut out = root.to_path_buf();
    let mut any = false;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                any = true;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    any.then_some(out)
}

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "js" => "text/javascript",
        "css" => "text/css",
        "html" => "text/html; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

async fn ws_handler(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    upgrade.on_upgrade(move |ws| handle_socket(state.clock, ws))
}

async fn handle_socket(clock: ClockHandle, socket: WebSocket) {
    tracing::info!("client connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = clock.subscribe();

    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            let payload = match event.to_json() {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize clock event");
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        if !forward_frame(&clock, message).await {
            break;
        }
    }

    send_task.abort();
    tracing::info!("client disconnected");
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameAction {
    Command(ClientCommand),
    Skip,
    Close,
}

fn decode_frame(message: Message) -> FrameAction {
    match message {
        Message::Text(text) => match ClientCommand::from_json(&text) {
            Ok(command) => FrameAction::Command(command),
            Err(err) => {
                tracing::warn!(payload = %text, error = %err, "ignoring malformed client frame");
                FrameAction::Skip
            }
        },
        Message::Binary(_) => {
            tracing::warn!("unexpected binary frame received");
            FrameAction::Skip
        }
        Message::Ping(_) | Message::Pong(_) => FrameAction::Skip,
        Message::Close(_) => FrameAction::Close,
    }
}

/// Hands a decoded command to the clock owner. Returns `false` once the
/// connection should stop reading.
async fn forward_frame(clock: &ClockHandle, message: Message) -> bool {
    match decode_frame(message) {
        FrameAction::Command(command) => clock.send(command).await.is_ok(),
        FrameAction::Skip => true,
        FrameAction::Close => false,
    }
}

// A lagging subscriber jumps to the oldest event still retained.
async fn next_event(events: &mut broadcast::Receiver<ServerEvent>) -> Option<ServerEvent> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "client lagging behind clock broadcasts");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_paths_stay_under_root() {
        let root = Path::new("dist");
        assert_eq!(resolve_static(root, "watch.js"), Some(PathBuf::from("dist/watch.js")));
        assert_eq!(
            resolve_static(root, "/js/./control.js"),
            Some(PathBuf::from("dist/js/control.js"))
        );
        assert_eq!(resolve_static(root, "../secret"), None);
        assert_eq!(resolve_static(root, "a/../../b"), None);
        assert_eq!(resolve_static(root, ""), None);
    }

    #[test]
    fn frames_decode_to_actions() {
        assert_eq!(
            decode_frame(Message::Text(r#"{"event":"Seek","payload":-1500}"#.into())),
            FrameAction::Command(ClientCommand::Seek(-1500))
        );
        assert_eq!(
            decode_frame(Message::Text(r#"{"event":"Toggle"}"#.into())),
            FrameAction::Command(ClientCommand::Toggle)
        );
        assert_eq!(decode_frame(Message::Text("{not json".into())), FrameAction::Skip);
        assert_eq!(
            decode_frame(Message::Text(r#"{"event":"Rewind"}"#.into())),
            FrameAction::Skip
        );
        assert_eq!(decode_frame(Message::Binary(vec![1, 2, 3])), FrameAction::Skip);
        assert_eq!(decode_frame(Message::Ping(Vec::new())), FrameAction::Skip);
        assert_eq!(decode_frame(Message::Close(None)), FrameAction::Close);
    }

    #[tokio::test]
    async fn lagging_subscriber_resumes_at_the_oldest_retained_event() {
        let (tx, mut rx) = broadcast::channel(2);
        for ms in 1..=4 {
            tx.send(ServerEvent::SetTime(ms)).unwrap();
        }
        assert_eq!(next_event(&mut rx).await, Some(ServerEvent::SetTime(3)));
        assert_eq!(next_event(&mut rx).await, Some(ServerEvent::SetTime(4)));
        drop(tx);
        assert_eq!(next_event(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn forwarded_frames_drive_the_clock() {
        let settings = crate::config::Clock::default();
        let (handle, _task) = spawn_clock(PlaybackClock::new(settings.initial_offset_ms), &settings);
        let mut events = handle.subscribe();

        let seek = Message::Text(r#"{"event":"Seek","payload":42}"#.into());
        assert!(forward_frame(&handle, seek).await);
        assert_eq!(next_event(&mut events).await, Some(ServerEvent::SetTime(42)));

        assert!(forward_frame(&handle, Message::Text("garbage".into())).await);
        assert!(forward_frame(&handle, Message::Binary(vec![0])).await);
        assert_eq!(next_event(&mut events).await, Some(ServerEvent::SetTime(42)));

        assert!(forward_frame(&handle, Message::Text(r#"{"event":"Play"}"#.into())).await);
        assert_eq!(next_event(&mut events).await, Some(ServerEvent::SetTime(42)));
        assert_eq!(next_event(&mut events).await, Some(ServerEvent::SetTime(142)));

        assert!(!forward_frame(&handle, Message::Close(None)).await);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("dist/watch.js")), "text/javascript");
        assert_eq!(content_type(Path::new("dist/x.CSS")), "text/css");
        assert_eq!(content_type(Path::new("dist/blob")), "application/octet-stream");
    }
}
