use crate::config::Config;
use crate::data::{
    Exam, ExamId, GenerateRequest, GenerationId, RawStudent, Room, RoomSpec, SeatAssignment,
    SeatingPlan, Student,
};
use crate::engine::audit::AdjacencyConflict;
use crate::engine::cancel::CancellationToken;
use crate::error::SeatingError;
use crate::query::ExportLayout;
use crate::roster::LoadMode;
use crate::service::{SeatingService, Summary};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SeatingService>,
    pub generation_timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum ApiError {
    Seating(SeatingError),
    Internal(String),
}

impl From<SeatingError> for ApiError {
    fn from(err: SeatingError) -> Self {
        ApiError::Seating(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    detail: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Seating(err) => {
                let status = match &err {
                    SeatingError::Validation(_)
                    | SeatingError::Roster(_)
                    | SeatingError::RosterBatch(_) => StatusCode::BAD_REQUEST,
                    SeatingError::DuplicateRoom { .. } => StatusCode::CONFLICT,
                    SeatingError::NotFound(_) => StatusCode::NOT_FOUND,
                    SeatingError::InsufficientCapacity { .. }
                    | SeatingError::UnsatisfiableConstraint(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    SeatingError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
                };
                let body = ErrorBody {
                    kind: err.kind(),
                    message: err.to_string(),
                    detail: err.detail(),
                };
                (status, body)
            }
            ApiError::Internal(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        kind: "InternalError",
                        message,
                        detail: serde_json::Value::Null,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRosterRequest {
    #[serde(default)]
    pub mode: LoadMode,
    pub rows: Vec<RawStudent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRosterResponse {
    pub loaded: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerationQuery {
    pub generation: Option<GenerationId>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

// Cancels the run if the request future is dropped before it finishes.
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

async fn load_students_handler(
    State(state): State<AppState>,
    Json(input): Json<LoadRosterRequest>,
) -> ApiResult<LoadRosterResponse> {
    let loaded = state.service.load_roster(&input.rows, input.mode)?;
    Ok(Json(LoadRosterResponse { loaded }))
}

async fn list_students_handler(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(state.service.students())
}

async fn register_room_handler(
    State(state): State<AppState>,
    Json(spec): Json<RoomSpec>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room_id = state.service.register_room(spec)?;
    let room = state
        .service
        .rooms()
        .into_iter()
        .find(|r| r.room_id == room_id)
        .ok_or_else(|| SeatingError::NotFound(format!("room {room_id}")))?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn list_rooms_handler(State(state): State<AppState>) -> Json<Vec<Room>> {
    Json(state.service.rooms())
}

async fn remove_room_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> ApiResult<Room> {
    Ok(Json(state.service.remove_room(&room_id)?))
}

async fn register_exam_handler(
    State(state): State<AppState>,
    Json(exam): Json<Exam>,
) -> Result<(StatusCode, Json<Exam>), ApiError> {
    let exam_id = state.service.register_exam(exam)?;
    Ok((StatusCode::CREATED, Json(state.service.exam(&exam_id)?)))
}

async fn list_exams_handler(State(state): State<AppState>) -> Json<Vec<Exam>> {
    Json(state.service.exams())
}

async fn get_exam_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
) -> ApiResult<Exam> {
    Ok(Json(state.service.exam(&exam_id)?))
}

async fn generate_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<Arc<SeatingPlan>>), ApiError> {
    let cancel = match state.generation_timeout {
        Some(timeout) => CancellationToken::with_timeout(timeout),
        None => CancellationToken::new(),
    };
    let _on_drop = CancelOnDrop(cancel.clone());
    let service = state.service.clone();

    let plan = tokio::task::spawn_blocking(move || service.generate(&exam_id, &request, &cancel))
        .await
        .map_err(|e| ApiError::Internal(format!("generation task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
    Query(query): Query<GenerationQuery>,
) -> ApiResult<Arc<SeatingPlan>> {
    Ok(Json(state.service.plan(&exam_id, query.generation)?))
}

async fn generations_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
) -> ApiResult<Vec<GenerationId>> {
    Ok(Json(state.service.generations(&exam_id)?))
}

async fn find_student_handler(
    State(state): State<AppState>,
    Path((exam_id, roll_number)): Path<(ExamId, String)>,
) -> ApiResult<SeatAssignment> {
    Ok(Json(
        state
            .service
            .queries()
            .find_by_student(&exam_id, &roll_number)?,
    ))
}

async fn find_room_handler(
    State(state): State<AppState>,
    Path((exam_id, room_id)): Path<(ExamId, String)>,
) -> ApiResult<Vec<SeatAssignment>> {
    Ok(Json(state.service.queries().find_by_room(&exam_id, &room_id)?))
}

async fn search_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<SeatAssignment>> {
    Ok(Json(state.service.queries().search(&exam_id, &query.q)?))
}

async fn export_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
    Query(query): Query<GenerationQuery>,
) -> ApiResult<ExportLayout> {
    Ok(Json(state.service.queries().export(&exam_id, query.generation)?))
}

async fn conflicts_handler(
    State(state): State<AppState>,
    Path(exam_id): Path<ExamId>,
    Query(query): Query<GenerationQuery>,
) -> ApiResult<Vec<AdjacencyConflict>> {
    Ok(Json(
        state.service.queries().conflicts(&exam_id, query.generation)?,
    ))
}

async fn summary_handler(State(state): State<AppState>) -> Json<Summary> {
    Json(state.service.summary())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/students",
            post(load_students_handler).get(list_students_handler),
        )
        .route("/v1/rooms", post(register_room_handler).get(list_rooms_handler))
        .route("/v1/rooms/:room_id", axum::routing::delete(remove_room_handler))
        .route("/v1/exams", post(register_exam_handler).get(list_exams_handler))
        .route("/v1/exams/:exam_id", get(get_exam_handler))
        .route(
            "/v1/exams/:exam_id/seating",
            post(generate_handler).get(get_plan_handler),
        )
        .route(
            "/v1/exams/:exam_id/seating/generations",
            get(generations_handler),
        )
        .route(
            "/v1/exams/:exam_id/seating/students/:roll_number",
            get(find_student_handler),
        )
        .route(
            "/v1/exams/:exam_id/seating/rooms/:room_id",
            get(find_room_handler),
        )
        .route("/v1/exams/:exam_id/seating/search", get(search_handler))
        .route("/v1/exams/:exam_id/seating/export", get(export_handler))
        .route(
            "/v1/exams/:exam_id/seating/conflicts",
            get(conflicts_handler),
        )
        .route("/v1/summary", get(summary_handler))
        .with_state(state)
}

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let state = AppState {
        service: Arc::new(SeatingService::new(config.engine)),
        generation_timeout: config.generation_timeout,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
