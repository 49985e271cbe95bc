use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::book::{search, ContactForm, Customer, Photo, PhotoError, ShareFormat, Sharer, StoreError};
use crate::location::{Coordinate, ResolutionOutcome, ResolutionRequest, ResolutionStatus};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::DuplicateMobile => StatusCode::CONFLICT,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Io { .. } | StoreError::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, e.to_string())
    }
}

impl From<PhotoError> for ApiError {
    fn from(e: PhotoError) -> Self {
        let status = match e {
            PhotoError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PhotoError::NotImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PhotoError::NotFound(_) => StatusCode::NOT_FOUND,
            PhotoError::TooMany | PhotoError::MalformedDataUrl(_) => StatusCode::BAD_REQUEST,
        };
        api_error(status, e.to_string())
    }
}

fn lock_book(state: &AppState) -> Result<std::sync::MutexGuard<'_, crate::book::CustomerBook>, ApiError> {
    state
        .book
        .lock()
        .map_err(|_| api_error(StatusCode::INTERNAL_SERVER_ERROR, "customer book unavailable"))
}

// ─── Resolution responses ────────────────────────────────────────

#[derive(Serialize)]
pub struct ResolveResponse {
    pub status: ResolutionStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

impl From<ResolutionOutcome> for ResolveResponse {
    fn from(o: ResolutionOutcome) -> Self {
        Self {
            status: o.status,
            message: o.status_message().to_string(),
            coordinates: o.coordinate.map(|c| c.to_string()),
            lat: o.coordinate.map(|c| c.lat),
            lon: o.coordinate.map(|c| c.lon),
            map_url: o.coordinate.map(|c| c.map_url()),
            address: o.address,
        }
    }
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub url: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let url = params.url.as_deref().unwrap_or("").trim();
    if url.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'url' parameter"));
    }

    let outcome = state
        .pipeline
        .resolve(&ResolutionRequest::Url(url.to_string()))
        .await;

    tracing::info!(
        url,
        status = %outcome.status,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );

    Ok(Json(outcome.into()))
}

// ─── GET /api/locate ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LocateQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn locate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let coord = match (params.lat, params.lon) {
        (Some(lat), Some(lon)) => Coordinate::rounded(lat, lon)
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Coordinates must be finite numbers"))?,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lon' parameters")),
    };

    let outcome = state
        .pipeline
        .resolve(&ResolutionRequest::DeviceLocation(coord))
        .await;

    tracing::info!(
        %coord,
        status = %outcome.status,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/locate"
    );

    Ok(Json(outcome.into()))
}

// ─── /api/customers ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    /// Wrap matches in `<mark>` tags.
    #[serde(default)]
    pub highlight: bool,
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CustomerQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let book = lock_book(&state)?;
    let term = params.q.as_deref().unwrap_or("");
    let found = book.search(term).into_iter();
    let customers: Vec<Customer> = if params.highlight {
        found.map(|c| search::highlighted(c, term)).collect()
    } else {
        found.cloned().collect()
    };
    Ok(Json(customers))
}

pub async fn add_customer(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let mut book = lock_book(&state)?;
    let customer = book.add(form)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Full replacement of a customer's editable fields.
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(form): Json<ContactForm>,
) -> Result<Json<Customer>, ApiError> {
    let mut book = lock_book(&state)?;
    Ok(Json(book.update(id, form)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpload {
    pub name: String,
    /// `data:image/...;base64,...`
    pub data_url: String,
}

pub async fn add_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(upload): Json<PhotoUpload>,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    let mut book = lock_book(&state)?;
    let customer = book
        .get(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("No customer with id {}", id)))?;
    let mut form = ContactForm::from_customer(customer);
    let photo = form.attach_data_url(&upload.name, &upload.data_url)?.clone();
    book.update(id, form)?;
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Path((id, photo_id)): Path<(i64, i64)>,
) -> Result<Json<Photo>, ApiError> {
    let mut book = lock_book(&state)?;
    let customer = book
        .get(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("No customer with id {}", id)))?;
    let mut form = ContactForm::from_customer(customer);
    let removed = form.remove_photo(photo_id)?;
    book.update(id, form)?;
    Ok(Json(removed))
}

pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let mut book = lock_book(&state)?;
    Ok(Json(book.delete(id)?))
}

#[derive(Deserialize)]
pub struct ShareQuery {
    pub format: Option<String>,
}

#[derive(Serialize)]
pub struct ShareResponse {
    pub format: String,
    pub content: String,
}

pub async fn share_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ShareQuery>,
) -> Result<Json<ShareResponse>, ApiError> {
    let format: ShareFormat = params
        .format
        .as_deref()
        .unwrap_or("text")
        .parse()
        .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;

    let book = lock_book(&state)?;
    let customer = book.get(id).ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("No customer with id {}", id)))?;
    let content = Sharer::new(&state.phone_prefix)
        .render(customer, format)
        .ok_or_else(|| api_error(StatusCode::UNPROCESSABLE_ENTITY, "No coordinates available for mapping"))?;

    Ok(Json(ShareResponse {
        format: format.to_string(),
        content,
    }))
}
