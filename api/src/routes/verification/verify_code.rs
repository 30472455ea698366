//! Handler for POST /api/v1/verification/verify-code

use actix_web::{web, HttpResponse};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use ch_core::repositories::{AccountDirectory, RecordStore};
use ch_shared::types::response::ApiResponse;

use crate::dto::{VerifiedUser, VerifyCodeRequest, VerifyCodeResponse};
use crate::handlers::error::{to_response, validation_response};

use super::AppState;

/// Verify a submitted code against its record.
///
/// Verification outcome and session hand-off are deliberately decoupled: a
/// hand-off fault after a successful verification still reports the identity
/// as verified, without a credential.
pub async fn verify_code<R, A>(
    state: web::Data<AppState<R, A>>,
    request: web::Json<VerifyCodeRequest>,
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
            otp_id = %request.otp_id,
            event = "verify_code_validation_failed",
            "Request body failed validation"
        );
        return validation_response(&errors, &request_id);
    }

    match state.engine.verify(request.otp_id, &request.code).await {
        Ok(verified) => {
            let (token, user_id) = if request.auto_login {
                match state.handoff.on_verified(&verified).await {
                    Ok(Some(outcome)) => (Some(outcome.token), Some(outcome.user_id)),
                    Ok(None) => (None, None),
                    Err(error) => {
                        // Verification already committed; report it without a
                        // credential rather than failing the whole call.
                        warn!(
                            request_id = %request_id,
                            otp_id = %request.otp_id,
                            code = error.code(),
                            event = "session_handoff_failed",
                            "Session hand-off failed after successful verification"
                        );
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            info!(
                request_id = %request_id,
                otp_id = %request.otp_id,
                identity = %verified.identity.masked(),
                user_type = %verified.user_type,
                auto_login = request.auto_login,
                event = "verify_code_succeeded",
                "Verification completed"
            );

            let response = VerifyCodeResponse {
                verified: true,
                message: "Verification successful".to_string(),
                user: Some(VerifiedUser {
                    identity: verified.identity.as_str().to_string(),
                    user_type: verified.user_type,
                    verified_at: verified.verified_at,
                }),
                token,
                user_id,
            };
            HttpResponse::Ok().json(ApiResponse::success(response).with_request_id(request_id))
        }
        Err(error) => {
            warn!(
                request_id = %request_id,
                otp_id = %request.otp_id,
                code = error.code(),
                event = "verify_code_failed",
                "Verification attempt rejected"
            );
            to_response(&error, &request_id)
        }
    }
}
