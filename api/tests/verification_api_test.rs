//! End-to-end tests of the verification HTTP surface, with mock providers
//! and the in-memory store behind the real handlers.

use std::sync::Arc;

use actix_web::{test, web};
use serde_json::json;

use ch_api::app::create_app;
use ch_api::dto::{RequestCodeResponse, VerifyCodeResponse};
use ch_api::routes::verification::AppState;
use ch_core::domain::{Channel, Identity};
use ch_core::repositories::InMemoryAccountDirectory;
use ch_core::services::handoff::NoOpSessionHandoff;
use ch_core::services::issuance::IssuanceService;
use ch_core::services::verification::VerificationEngine;
use ch_infra::providers::MockProvider;
use ch_infra::store::MemoryRecordStore;
use ch_shared::config::VerificationPolicy;
use ch_shared::types::response::ApiResponse;

struct TestHarness {
    state: web::Data<AppState<MemoryRecordStore, InMemoryAccountDirectory>>,
    chat: Arc<MockProvider>,
    accounts: Arc<InMemoryAccountDirectory>,
}

fn harness() -> TestHarness {
    let store = Arc::new(MemoryRecordStore::new());
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    let chat = Arc::new(MockProvider::new(Channel::ChatWebhook));
    let sms = Arc::new(MockProvider::new(Channel::Sms));
    let email = Arc::new(MockProvider::new(Channel::Email));

    let issuance = Arc::new(IssuanceService::new(
        store.clone(),
        accounts.clone(),
        chat.clone(),
        sms,
        email,
        VerificationPolicy::default(),
    ));
    let engine = Arc::new(VerificationEngine::new(store));

    TestHarness {
        state: web::Data::new(AppState {
            issuance,
            engine,
            handoff: Arc::new(NoOpSessionHandoff),
        }),
        chat,
        accounts,
    }
}

#[actix_web::test]
async fn test_request_then_verify_round_trip() {
    let harness = harness();
    let app = test::init_service(create_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/request-code")
        .set_json(json!({
            "identity": "+919876543210",
            "user_type": "student"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: ApiResponse<RequestCodeResponse> = test::read_body_json(resp).await;
    assert!(body.success);
    let issued = body.data.expect("success payload");
    assert_eq!(issued.method, Channel::ChatWebhook);
    assert!(!issued.fallback_used);
    assert!(issued.expires_in_secs > 0);

    let code = harness
        .chat
        .last_code(&Identity::Phone("+919876543210".to_string()))
        .expect("mock provider captured the code");

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/verify-code")
        .set_json(json!({
            "otp_id": issued.otp_id,
            "code": code
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: ApiResponse<VerifyCodeResponse> = test::read_body_json(resp).await;
    let verified = body.data.expect("success payload");
    assert!(verified.verified);
    let user = verified.user.expect("verified identity echoed");
    assert_eq!(user.identity, "+919876543210");
    assert!(verified.token.is_none());
}

#[actix_web::test]
async fn test_registered_identity_is_rejected_with_conflict() {
    let harness = harness();
    harness
        .accounts
        .register(Identity::Phone("+919876543210".to_string()))
        .await;
    let app = test::init_service(create_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/request-code")
        .set_json(json!({
            "identity": "+919876543210",
            "user_type": "student"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let body: ApiResponse<RequestCodeResponse> = test::read_body_json(resp).await;
    assert!(!body.success);
    assert_eq!(body.error.unwrap().code, "ALREADY_REGISTERED");
}

#[actix_web::test]
async fn test_wrong_code_reports_remaining_attempts() {
    let harness = harness();
    let app = test::init_service(create_app(harness.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/request-code")
        .set_json(json!({
            "identity": "+919876543210",
            "user_type": "student"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: ApiResponse<RequestCodeResponse> = test::read_body_json(resp).await;
    let issued = body.data.unwrap();

    let real_code = harness
        .chat
        .last_code(&Identity::Phone("+919876543210".to_string()))
        .unwrap();
    let wrong_code = if real_code == "000000" { "111111" } else { "000000" };

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/verify-code")
        .set_json(json!({
            "otp_id": issued.otp_id,
            "code": wrong_code
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: ApiResponse<VerifyCodeResponse> = test::read_body_json(resp).await;
    let error = body.error.unwrap();
    assert_eq!(error.code, "INVALID_CODE");
    assert_eq!(error.details.unwrap()["remaining_attempts"], 2);
}

#[actix_web::test]
async fn test_unknown_record_is_not_found() {
    let harness = harness();
    let app = test::init_service(create_app(harness.state)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/verification/verify-code")
        .set_json(json!({
            "otp_id": uuid::Uuid::new_v4(),
            "code": "123456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_health_endpoint() {
    let harness = harness();
    let app = test::init_service(create_app(harness.state)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}
