pub mod repos;
pub mod search;

use axum::http::StatusCode;

use crate::error::EngineError;

/// Map an engine error to the status and message returned to the client.
pub fn error_response(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        e if e.is_request_error() => StatusCode::BAD_REQUEST,
        EngineError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        EngineError::NoIndexableContent => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("{err:#}");
    } else {
        tracing::info!("Rejected request: {err}");
    }
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EngineError::InvalidQuery("k".into()), StatusCode::BAD_REQUEST),
            (EngineError::InvalidRepository("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::SourceUnavailable("x".into()), StatusCode::BAD_GATEWAY),
            (EngineError::NoIndexableContent, StatusCode::UNPROCESSABLE_ENTITY),
            (EngineError::NothingIndexed, StatusCode::BAD_REQUEST),
            (EngineError::EmbeddingFailure("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(error_response(err).0, expected);
        }
    }
}
