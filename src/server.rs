use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::api::{ApiAccountQuery, ApiError, ApiScoreRequest, ApiScoreResponse};
use slop_score::analysis::{AnalysisError, AnalysisReport, AnalysisService, AnalysisStage};
use slop_score::config::{LeaderboardConfig, ServerConfig};
use slop_score::leaderboard::{query_leaderboard, LeaderboardPage, LeaderboardQuery};
use slop_score::score_account;

#[derive(Clone)]
struct AppState {
    service: Arc<AnalysisService>,
    leaderboard: LeaderboardConfig,
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>,
}

#[derive(Clone, Serialize)]
struct StreamEvent {
    event: String,
    message: String,
    timestamp_ms: u128,
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    request_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub async fn serve(
    config: ServerConfig,
    service: Arc<AnalysisService>,
    leaderboard: LeaderboardConfig,
) -> Result<(), String> {
    let state = AppState {
        service,
        leaderboard,
        channels: Arc::new(Mutex::new(HashMap::new())),
    };

    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/score", post(score_handler))
        .route("/api/accounts/:username", get(account_handler))
        .route("/api/leaderboard", get(leaderboard_handler))
        .route("/api/analyze/stream", get(stream_handler));

    if let Some(web_root) = config.web_root {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
        app = app.nest_service("/", static_service);
    }
    let app = app.with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    info!(%addr, "listening");
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn score_handler(
    State(state): State<AppState>,
    payload: Result<Json<ApiScoreRequest>, JsonRejection>,
) -> ApiResult<ApiScoreResponse> {
    let Json(request) = payload.map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::message(format!("invalid posts payload: {}", err.body_text()))),
        )
    })?;

    let details = request.details.unwrap_or(false);
    let population_top = match request.top_score {
        Some(top_score) => top_score,
        None => state.service.store().top_score().await,
    };
    let score = score_account(&request.posts);
    Ok(Json(ApiScoreResponse::from_score(score, population_top, details)))
}

async fn account_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ApiAccountQuery>,
) -> ApiResult<AnalysisReport> {
    let force_refresh = query.refresh.unwrap_or(false);
    let channel = match query.request_id.as_deref() {
        Some(request_id) => Some((
            request_id.to_string(),
            get_or_create_channel(&state, request_id).await,
        )),
        None => None,
    };

    if let Some((_, sender)) = channel.as_ref() {
        send_event(sender, "start", &format!("Analyzing @{}", username));
    }
    let progress = |stage: AnalysisStage| {
        if let Some((_, sender)) = channel.as_ref() {
            send_event(sender, stage.event(), &stage.message());
        }
    };

    let result = state
        .service
        .analyze_with_progress(&username, force_refresh, &progress)
        .await;

    if let Some((request_id, sender)) = channel.as_ref() {
        match &result {
            Ok(_) => send_event(sender, "done", "Analysis complete"),
            Err(err) => send_event(sender, "error", &err.to_string()),
        }
        schedule_cleanup(state.channels.clone(), request_id.clone());
    }

    result.map(Json).map_err(|err| {
        let status = status_for(&err);
        if status.is_server_error() {
            warn!(%username, error = %err, "analysis failed");
        }
        (status, Json(ApiError::from(&err)))
    })
}

async fn leaderboard_handler(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardPage> {
    let page = query_leaderboard(state.service.store(), &query, &state.leaderboard).await;
    Json(page)
}

async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>, StatusCode>
{
    let sender = get_or_create_channel(&state, &query.request_id).await;
    let receiver = sender.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data)))
        }
        Err(_) => None,
    });

    send_event(&sender, "connected", "Streaming analysis progress");
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(8))))
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
        AnalysisError::RefreshCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
        AnalysisError::Provider(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_or_create_channel(
    state: &AppState,
    request_id: &str,
) -> broadcast::Sender<StreamEvent> {
    let mut guard = state.channels.lock().await;
    if let Some(sender) = guard.get(request_id) {
        return sender.clone();
    }
    let (sender, _) = broadcast::channel(32);
    guard.insert(request_id.to_string(), sender.clone());
    sender
}

fn send_event(sender: &broadcast::Sender<StreamEvent>, event: &str, message: &str) {
    let _ = sender.send(StreamEvent {
        event: event.to_string(),
        message: message.to_string(),
        timestamp_ms: now_ms(),
    });
}

fn schedule_cleanup(
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<StreamEvent>>>>,
    request_id: String,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let mut guard = channels.lock().await;
        guard.remove(&request_id);
    });
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}
