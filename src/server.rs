// http server mode - one isolated history per session

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{Classification, Reply, ResponseRouter, Session};
use crate::Error;

struct AppState {
    router: Arc<ResponseRouter>,
    // each session locks on its own, so one slow reply never blocks another user
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl AppState {
    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(id))
    }
}

#[derive(Deserialize)]
struct MessageRequest {
    message: String,
}

impl MessageRequest {
    fn validate(self) -> Result<String, ApiError> {
        if self.message.trim().is_empty() {
            return Err(ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "message must not be empty".to_string(),
            });
        }
        Ok(self.message)
    }
}

#[derive(Serialize)]
struct SessionCreated {
    id: Uuid,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("no session {id}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub struct Server;

impl Server {
    pub async fn run(router: ResponseRouter, host: &str, port: u16) -> Result<(), Error> {
        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!(%addr, rules = router.rules().len(), "server running");

        axum::serve(listener, app(Arc::new(router)))
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

/// Builds the http routes around a shared router.
pub fn app(router: Arc<ResponseRouter>) -> Router {
    let state = Arc::new(AppState {
        router,
        sessions: RwLock::new(HashMap::new()),
    });

    Router::new()
        .route("/health", get(health))
        .route("/classify", post(classify))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/sessions/{id}/messages", post(send_message))
        .route("/sessions/{id}/stream", post(stream_message))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn classify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MessageRequest>,
) -> Json<Classification> {
    Json(state.router.classify(&req.message))
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionCreated>) {
    let session = Session::new();
    let id = session.id;
    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(session)));

    info!(%id, "session created");
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await.clone();
    Ok(Json(session))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::not_found(id))?;

    info!(%id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.session(id).await?;
    session.lock().await.reset();

    info!(%id, "session reset");
    Ok(StatusCode::NO_CONTENT)
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Reply>, ApiError> {
    let message = req.validate()?;
    let session = state.session(id).await?;

    let mut session = session.lock().await;
    let reply = state.router.route(&mut session.history, &message).await;
    Ok(Json(reply))
}

// sse: a "partial" event per fragment with the text so far, then one "done"
async fn stream_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let message = req.validate()?;
    let session = state.session(id).await?;
    let router = state.router.clone();

    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut session = session.lock().await;
        let partials = tx.clone();

        let reply = router
            .route_with(&mut session.history, &message, move |text| {
                // sse fields can't carry carriage returns
                let text = text.replace('\r', "");
                let _ = partials.send(Event::default().event("partial").data(text));
            })
            .await;

        match Event::default().event("done").json_data(&reply) {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => warn!(error = %e, "could not encode final reply"),
        }
    });

    let events = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
