use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kaigi::domain::core::ReservationError;
use serde::Serialize;
use tracing::debug;

/// エラー時のレスポンスボディ `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Reservation(#[from] ReservationError),
    /// パラメータが欠けている、または読み取れない (400)
    #[error("Missing or invalid parameters: {0}")]
    InvalidParams(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Reservation(e) => match e {
                ReservationError::InvalidRoom(_)
                | ReservationError::MalformedInput
                | ReservationError::InvalidTimeWindow
                | ReservationError::MalformedId(_) => StatusCode::BAD_REQUEST,
                ReservationError::NotFound(_) => StatusCode::NOT_FOUND,
                ReservationError::RoomConflict(_) => StatusCode::CONFLICT,
                ReservationError::IdExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidParams(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!("リクエストを拒否しました ({}): {}", status, self);
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
