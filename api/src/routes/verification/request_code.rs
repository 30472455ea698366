//! Handler for POST /api/v1/verification/request-code

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use ch_core::domain::Identity;
use ch_core::repositories::{AccountDirectory, RecordStore};
use ch_core::services::issuance::DeliveryOutcome;
use ch_shared::types::response::ApiResponse;

use crate::dto::{RequestCodeRequest, RequestCodeResponse};
use crate::handlers::error::{to_response, validation_response};

use super::AppState;

/// Issue a verification code for an identity.
///
/// The response carries the record handle and delivery metadata; the code
/// itself travels only over the provider channel.
pub async fn request_code<R, A>(
    state: web::Data<AppState<R, A>>,
    request: web::Json<RequestCodeRequest>,
) -> HttpResponse
where
    R: RecordStore + 'static,
    A: AccountDirectory + 'static,
{
    let request_id = Uuid::new_v4().to_string();
    let request = request.into_inner();

    if let Err(errors) = request.validate() {
        warn!(
            request_id = %request_id,
            event = "request_code_validation_failed",
            "Request body failed validation"
        );
        return validation_response(&errors, &request_id);
    }

    let identity = if request.user_type.is_phone_based() {
        Identity::Phone(request.identity.clone())
    } else {
        Identity::Email(request.identity.clone())
    };

    info!(
        request_id = %request_id,
        identity = %identity.masked(),
        user_type = %request.user_type,
        event = "request_code_received",
        "Processing code issuance request"
    );

    let result = state
        .issuance
        .request_code(
            identity,
            request.user_type,
            request.preferred_channel,
            request.display_name.as_deref(),
        )
        .await;

    match result {
        Ok(issued) => {
            let expires_in_secs = issued
                .expires_at
                .signed_duration_since(Utc::now())
                .num_seconds()
                .max(0);
            let provider_correlation_id = match &issued.outcome {
                DeliveryOutcome::Sms { correlation_id, .. } => correlation_id.clone(),
                _ => None,
            };
            let response = RequestCodeResponse {
                otp_id: issued.otp_id,
                method: issued.outcome.method(),
                expires_in_secs,
                provider_correlation_id,
                fallback_used: issued.outcome.fallback_used(),
            };
            HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id))
        }
        Err(error) => {
            warn!(
                request_id = %request_id,
                code = error.code(),
                event = "request_code_failed",
                "Code issuance failed"
            );
            to_response(&error, &request_id)
        }
    }
}
