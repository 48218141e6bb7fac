use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leaderboard_core::RankingError;
use thiserror::Error;
use tracing::error;

use crate::output::ErrorBody;
use crate::supabase::FetchError;

/// Failures of the rankings endpoint. Only two are visible to clients:
/// "no data" (404) and everything else (500).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No active students found")]
    NoData,

    #[error("{0}")]
    ParticipantFetch(#[from] FetchError),

    #[error("Internal server error")]
    Internal(String),
}

impl From<RankingError> for AppError {
    fn from(e: RankingError) -> Self {
        match e {
            RankingError::NoData => AppError::NoData,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoData => StatusCode::NOT_FOUND,
            AppError::ParticipantFetch(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NoData => {}
            AppError::ParticipantFetch(e) => error!("Error fetching students: {e}"),
            AppError::Internal(detail) => error!("Unexpected error: {detail}"),
        }

        let body = ErrorBody::new(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}
