use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use super::batch::CancellationFlag;
use super::config::ConfigId;
use super::error::RatingError;
use super::service::{CalculationRequest, ConfigDraft, RatingService, RatingServiceError};
use super::signals::SignalSource;
use super::store::{ConfigStore, StoreError};

/// Router exposing calculation and configuration administration endpoints.
pub fn rating_router<S, D>(service: Arc<RatingService<S, D>>) -> Router
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/final-rating/calculate",
            post(calculate_handler::<S, D>),
        )
        .route(
            "/api/v1/final-rating/configs",
            get(list_configs_handler::<S, D>).post(create_config_handler::<S, D>),
        )
        .route(
            "/api/v1/final-rating/configs/default",
            get(default_config_handler::<S, D>),
        )
        .route(
            "/api/v1/final-rating/configs/active",
            get(active_config_handler::<S, D>),
        )
        .route(
            "/api/v1/final-rating/configs/:config_id",
            get(get_config_handler::<S, D>)
                .put(update_config_handler::<S, D>)
                .delete(delete_config_handler::<S, D>),
        )
        .route(
            "/api/v1/final-rating/configs/:config_id/activate",
            post(activate_config_handler::<S, D>),
        )
        .with_state(service)
}

/// HTTP status for a service failure.
pub fn status_for(error: &RatingServiceError) -> StatusCode {
    match error {
        RatingServiceError::Rating(RatingError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        RatingServiceError::Rating(RatingError::InvalidConfig(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RatingServiceError::Rating(RatingError::ConfigNotFound(_))
        | RatingServiceError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        RatingServiceError::Store(StoreError::ActiveConfig(_))
        | RatingServiceError::Store(StoreError::DuplicateName(_)) => StatusCode::CONFLICT,
        RatingServiceError::Rating(RatingError::Cancelled { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RatingServiceError::Rating(RatingError::Signal(_))
        | RatingServiceError::Store(StoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: RatingServiceError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        error!(error = %error, "final rating request failed");
    }

    let payload = match &error {
        RatingServiceError::Rating(RatingError::InvalidConfig(invalid)) => json!({
            "error": error.to_string(),
            "violations": invalid.violations,
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}

/// Malformed or incomplete JSON bodies get the same `{"error": ...}` shape.
fn rejected_body(rejection: JsonRejection) -> Response {
    error_response(RatingError::InvalidRequest(rejection.body_text()).into())
}

/// Cancels the batch when the request future is dropped before completion.
struct CancelOnDrop(CancellationFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub(crate) async fn calculate_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    body: Result<axum::Json<CalculationRequest>, JsonRejection>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    let axum::Json(request) = match body {
        Ok(request) => request,
        Err(rejection) => return rejected_body(rejection),
    };
    let cancellation = CancellationFlag::new();
    let _guard = CancelOnDrop(cancellation.clone());

    let outcome =
        tokio::task::spawn_blocking(move || service.calculate(request, &cancellation)).await;

    match outcome {
        Ok(Ok(response)) => (StatusCode::OK, axum::Json(response)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            error!(error = %join_error, "calculation worker failed");
            let payload = json!({
                "error": "calculation worker failed",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_configs_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    match service.list_configs() {
        Ok(configs) => (StatusCode::OK, axum::Json(configs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    body: Result<axum::Json<ConfigDraft>, JsonRejection>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    let axum::Json(draft) = match body {
        Ok(draft) => draft,
        Err(rejection) => return rejected_body(rejection),
    };
    match service.create_config(draft) {
        Ok(saved) => (StatusCode::CREATED, axum::Json(saved)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn default_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    (StatusCode::OK, axum::Json(service.default_structure())).into_response()
}

pub(crate) async fn active_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    match service.active_config() {
        Ok(config) => (StatusCode::OK, axum::Json(config)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    Path(config_id): Path<u64>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    match service.get_config(ConfigId(config_id)) {
        Ok(config) => (StatusCode::OK, axum::Json(config)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    Path(config_id): Path<u64>,
    body: Result<axum::Json<ConfigDraft>, JsonRejection>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    let axum::Json(draft) = match body {
        Ok(draft) => draft,
        Err(rejection) => return rejected_body(rejection),
    };
    match service.update_config(ConfigId(config_id), draft) {
        Ok(saved) => (StatusCode::OK, axum::Json(saved)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    Path(config_id): Path<u64>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    match service.delete_config(ConfigId(config_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activate_config_handler<S, D>(
    State(service): State<Arc<RatingService<S, D>>>,
    Path(config_id): Path<u64>,
) -> Response
where
    S: ConfigStore + 'static,
    D: SignalSource + 'static,
{
    match service.activate_config(ConfigId(config_id)) {
        Ok(config) => (StatusCode::OK, axum::Json(config)).into_response(),
        Err(error) => error_response(error),
    }
}
