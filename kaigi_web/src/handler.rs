use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Form, Json,
};
use kaigi::domain::core::{
    Reservation, ReservationRegistry, ReservationRepository, ReservationRequest,
};

use crate::error::{ApiError, ApiResult};

/// GET /api/reservations
pub async fn list<R: ReservationRepository>(
    State(registry): State<Arc<ReservationRegistry<R>>>,
) -> Json<Vec<Reservation>> {
    Json(registry.list_all().await)
}

/// POST /api/reservations
pub async fn create<R: ReservationRepository>(
    State(registry): State<Arc<ReservationRegistry<R>>>,
    query: Result<Query<ReservationRequest>, QueryRejection>,
    form: Result<Form<ReservationRequest>, FormRejection>,
) -> ApiResult<Json<Reservation>> {
    let request = params(query, form)?;
    Ok(Json(registry.create(request).await?))
}

/// PUT /api/reservations/:id
pub async fn update<R: ReservationRepository>(
    State(registry): State<Arc<ReservationRegistry<R>>>,
    Path(id): Path<String>,
    query: Result<Query<ReservationRequest>, QueryRejection>,
    form: Result<Form<ReservationRequest>, FormRejection>,
) -> ApiResult<Json<Reservation>> {
    let request = params(query, form)?;
    Ok(Json(registry.update(&id, request).await?))
}

/// DELETE /api/reservations/:id
pub async fn delete<R: ReservationRepository>(
    State(registry): State<Arc<ReservationRegistry<R>>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    registry.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// フォームのボディを優先し、なければクエリ文字列から読む
fn params(
    query: Result<Query<ReservationRequest>, QueryRejection>,
    form: Result<Form<ReservationRequest>, FormRejection>,
) -> ApiResult<ReservationRequest> {
    match (form, query) {
        (Ok(Form(request)), _) => Ok(request),
        (Err(_), Ok(Query(request))) => Ok(request),
        (Err(FormRejection::InvalidFormContentType(_)), Err(rejection)) => {
            Err(ApiError::InvalidParams(rejection.body_text()))
        }
        (Err(rejection), Err(_)) => Err(ApiError::InvalidParams(rejection.body_text())),
    }
}
