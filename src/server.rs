use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::AdvisorService;
use crate::catalog::CatalogListing;
use crate::error::AdvisorError;
use crate::models::{ChatMessage, RecommendationSet};
use crate::profile::{Profile, ProfileForm};
use crate::render;
use crate::session::SessionView;

type AppState = Arc<AdvisorService>;

/// Error body returned by every route.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

pub struct ApiError(AdvisorError);

impl From<AdvisorError> for ApiError {
    fn from(e: AdvisorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AdvisorError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AdvisorError::Service(_) | AdvisorError::Parse(_) => StatusCode::BAD_GATEWAY,
            AdvisorError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AdvisorError::SessionBusy => StatusCode::CONFLICT,
            AdvisorError::Config(_) | AdvisorError::Io(_) | AdvisorError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self.0 {
            AdvisorError::Validation { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), "{message}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.kind(),
                message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

pub fn router(service: AppState, bearer_token: Option<String>) -> Router {
    let mut router = Router::new()
        .route("/catalog", get(catalog))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(end_session))
        .route("/sessions/:id/profile", put(update_profile))
        .route("/sessions/:id/recommendations", post(recommend))
        .route("/sessions/:id/chat", post(ask))
        .route("/sessions/:id/report", get(report))
        .with_state(service);

    if let Some(expected) = bearer_token {
        router = router.layer(middleware::from_fn_with_state(
            Arc::new(expected),
            require_bearer,
        ));
    }

    router.route("/health", get(|| async { "ok" }))
}

/// Decodes a JSON request body, reporting failures in the common error shape.
fn parse_body<T: DeserializeOwned>(field: &str, body: &Bytes) -> Result<T, AdvisorError> {
    serde_json::from_slice(body).map_err(|e| AdvisorError::validation(field, e.to_string()))
}

async fn catalog() -> Json<CatalogListing> {
    Json(CatalogListing::build())
}

async fn create_session(
    State(svc): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SessionCreated>)> {
    let form = if body.iter().all(u8::is_ascii_whitespace) {
        ProfileForm::default()
    } else {
        parse_body("profile", &body)?
    };
    let session_id = svc.sessions.create(form).await;
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

async fn get_session(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = svc.sessions.acquire(id).await?;
    Ok(Json(session.view()))
}

async fn end_session(State(svc): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    svc.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_profile(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<Profile>> {
    let form: ProfileForm = parse_body("profile", &body)?;
    let mut session = svc.sessions.acquire(id).await?;
    session.set_form(form);
    Ok(Json(session.profile()))
}

async fn recommend(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RecommendationSet>> {
    let mut session = svc.sessions.acquire(id).await?;
    let set = session
        .request_recommendations(svc.recommender.as_ref())
        .await?;
    Ok(Json(set))
}

async fn ask(
    State(svc): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<ChatMessage>> {
    let req: AskRequest = parse_body("question", &body)?;
    let mut session = svc.sessions.acquire(id).await?;
    let reply = session.ask(svc.chat.as_ref(), &req.question).await?;
    Ok(Json(reply))
}

async fn report(State(svc): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let session = svc.sessions.acquire(id).await?;
    let body = render::markdown_report(session.recommendations(), session.chat_history());
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    )
        .into_response())
}

async fn require_bearer(
    State(expected): State<Arc<String>>,
    req: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    if req.uri().path().eq("/health") {
        return next.run(req).await;
    }
    let headers: &HeaderMap = req.headers();
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", expected.as_str()))
        // Fallback for clients that cannot set headers
        || Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .ok()
            .and_then(|Query(params)| params.get("access_token").cloned())
            .is_some_and(|token| token == *expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(req).await
}
