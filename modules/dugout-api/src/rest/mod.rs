pub mod cron;
pub mod forum;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use dugout_common::error::DugoutError;

pub(crate) fn error_response(err: DugoutError) -> Response {
    let status = match &err {
        DugoutError::Validation(_) => StatusCode::BAD_REQUEST,
        DugoutError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = error_response(DugoutError::Validation("title is required".into()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = error_response(DugoutError::NotFound("post".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn everything_else_is_500() {
        let resp = error_response(DugoutError::Anyhow(anyhow::anyhow!("pool exhausted")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
