//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the record and image endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::{auth, state::AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};
use cardio_core::domain::{MeasurementUpdate, NewCardioRecord};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        home_handler,
        health_handler,
        get_image_handler,
        get_record_handler,
        update_record_handler,
        insert_record_handler,
        edit_redirect_handler,
        edit_page_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::session_handler,
    ),
    components(
        schemas(
            ImageResponse,
            SuccessResponse,
            InsertResponse,
            HealthResponse,
            NewRecordRequest,
            UpdateMeasurementsRequest,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::LogoutResponse,
            auth::SessionResponse,
        )
    ),
    tags(
        (name = "Cardio API", description = "Cardio records, image lookup and user sessions.")
    )
)]
pub struct ApiDoc;

/// The document served under `/api-docs/openapi.json` and exported by the
/// `openapi` binary.
pub fn openapi_document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "Cardio API".to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ImageResponse {
    image_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    success: String,
}

/// The response payload sent after a record is stored.
#[derive(Serialize, ToSchema)]
pub struct InsertResponse {
    success: String,
    /// Store-generated identifier of the new record.
    user_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the store is unreachable.
    status: String,
}

/// A new cardio record. Every field except `path` is required; other fields
/// are dropped.
#[derive(ToSchema)]
pub struct NewRecordRequest {
    /// Caller-supplied record id, not necessarily unique.
    pub id: i64,
    pub age: i64,
    pub gender: i64,
    pub height: i64,
    pub weight: f64,
    pub ap_hi: i64,
    pub ap_lo: i64,
    pub cholesterol: i64,
    pub gluc: i64,
    pub smoke: i64,
    pub alco: i64,
    pub active: i64,
    pub cardio: i64,
    pub url: String,
    pub qrcode_filename: String,
    /// Asset-host path of the record's image.
    pub path: Option<String>,
}

/// New measurements for a record. Numeric strings are accepted.
#[derive(ToSchema)]
pub struct UpdateMeasurementsRequest {
    pub height: i64,
    pub weight: f64,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET / - Greeting
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Greeting", body = String, content_type = "text/plain"))
)]
pub async fn home_handler() -> &'static str {
    "Welcome to the Cardio API!"
}

/// Resolve the delivery URL of a record's image.
#[utoipa::path(
    get,
    path = "/image/{id}",
    params(("id" = i64, Path, description = "Caller-supplied record id")),
    responses(
        (status = 200, description = "Image URL", body = ImageResponse),
        (status = 404, description = "Record missing or has no image path")
    )
)]
pub async fn get_image_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    info!(handler = "get_image", id, "Handler: GET /image/{id}");

    let image_url = state.images.resolve(id).await?;
    Ok(Json(ImageResponse { image_url }))
}

/// Fetch a full cardio record.
#[utoipa::path(
    get,
    path = "/userdata/{id}",
    params(("id" = i64, Path, description = "Caller-supplied record id")),
    responses(
        (status = 200, description = "The stored record, including `_id`"),
        (status = 404, description = "No record with this id")
    )
)]
pub async fn get_record_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    info!(handler = "get_record", id, "Handler: GET /userdata/{id}");

    let record = state.records.find_by_id(id).await?;
    Ok(Json(record.to_json()))
}

/// Update a record's height and weight.
#[utoipa::path(
    put,
    path = "/user/{id}",
    params(("id" = i64, Path, description = "Caller-supplied record id")),
    request_body = UpdateMeasurementsRequest,
    responses(
        (status = 200, description = "Record updated", body = SuccessResponse),
        (status = 400, description = "Missing or non-numeric height/weight"),
        (status = 404, description = "No record with this id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_record_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    info!(handler = "update_record", id, "Handler: PUT /user/{id}");

    // Unknown ids are a 404 before the body is read.
    state.records.find_by_id(id).await?;

    let Json(body) = payload?;
    let update = MeasurementUpdate::from_json(id, &body)?;
    debug!(id, height = update.height, weight = update.weight, "Parsed measurements");

    state.records.update_fields(id, update).await?;
    Ok(Json(SuccessResponse {
        success: format!("User {} updated successfully", id),
    }))
}

/// Store a new cardio record.
#[utoipa::path(
    post,
    path = "/user",
    request_body = NewRecordRequest,
    responses(
        (status = 201, description = "Record stored", body = InsertResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn insert_record_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let record = NewCardioRecord::from_json(&body)?;
    info!(handler = "insert_record", id = record.id, "Handler: POST /user");

    let user_id = state.records.insert(record).await?;
    info!(%user_id, "Inserted cardio record");

    Ok((
        StatusCode::CREATED,
        Json(InsertResponse {
            success: "User inserted successfully".to_string(),
            user_id,
        }),
    ))
}

/// GET /edit/{id} - Redirect to the edit page
#[utoipa::path(
    get,
    path = "/edit/{id}",
    params(("id" = i64, Path, description = "Caller-supplied record id")),
    responses((status = 303, description = "Redirect to /edit-page/{id}"))
)]
pub async fn edit_redirect_handler(
    id: Result<Path<i64>, PathRejection>,
) -> Result<Redirect, ApiError> {
    let Path(id) = id?;
    Ok(Redirect::to(&format!("/edit-page/{}", id)))
}

/// GET /edit-page/{id}
#[utoipa::path(
    get,
    path = "/edit-page/{id}",
    params(("id" = i64, Path, description = "Caller-supplied record id")),
    responses((status = 200, description = "Edit page placeholder", body = String, content_type = "text/plain"))
)]
pub async fn edit_page_handler(
    id: Result<Path<i64>, PathRejection>,
) -> Result<String, ApiError> {
    let Path(id) = id?;
    Ok(format!("Edit Page for User ID: {}", id))
}

/// GET /health - Store round-trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (code, status) = match state.records.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };
    (code, Json(HealthResponse { status: status.to_string() }))
}
