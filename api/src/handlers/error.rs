//! Domain error to HTTP response mapping.
//!
//! One mapping for the whole surface. Handlers never build error bodies by
//! hand; they forward the `DomainError` here so codes and payload shape stay
//! consistent across endpoints.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use std::collections::HashMap;
use validator::ValidationErrors;

use ch_core::errors::{DomainError, IssuanceError, VerifyError};
use ch_shared::types::response::{ApiResponse, ErrorBody};

/// HTTP status for each domain error
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Issuance(e) => match e {
            IssuanceError::Validation { .. } => StatusCode::BAD_REQUEST,
            IssuanceError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            IssuanceError::AlreadyRegistered => StatusCode::CONFLICT,
            IssuanceError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            IssuanceError::AllChannelsFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        },
        DomainError::Verify(e) => match e {
            VerifyError::NotFound => StatusCode::NOT_FOUND,
            VerifyError::AlreadyVerified => StatusCode::CONFLICT,
            VerifyError::Expired => StatusCode::GONE,
            VerifyError::Exhausted => StatusCode::TOO_MANY_REQUESTS,
            VerifyError::InvalidCode { .. } => StatusCode::BAD_REQUEST,
        },
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the standard error response for a domain error
pub fn to_response(err: &DomainError, request_id: &str) -> HttpResponse {
    let body = ErrorBody::from(err);
    let response: ApiResponse<()> = ApiResponse::error(body).with_request_id(request_id);
    HttpResponse::build(status_for(err)).json(response)
}

/// Build a 400 response from validator field errors
pub fn validation_response(errors: &ValidationErrors, request_id: &str) -> HttpResponse {
    let mut fields: HashMap<String, serde_json::Value> = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        fields.insert(field.to_string(), serde_json::json!(messages));
    }

    let mut body = ErrorBody::new("VALIDATION_ERROR", "Invalid request data");
    for (field, messages) in fields {
        body = body.with_detail(field, messages);
    }
    let response: ApiResponse<()> = ApiResponse::error(body).with_request_id(request_id);
    HttpResponse::BadRequest().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let throttled: DomainError = IssuanceError::Throttled { retry_after_secs: 30 }.into();
        assert_eq!(status_for(&throttled), StatusCode::TOO_MANY_REQUESTS);

        let expired: DomainError = VerifyError::Expired.into();
        assert_eq!(status_for(&expired), StatusCode::GONE);

        let internal = DomainError::Internal {
            message: "store fault".to_string(),
        };
        assert_eq!(status_for(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
