//! Application factory.

use actix_web::{web, App, HttpResponse};
use tracing_actix_web::TracingLogger;

use ch_core::repositories::{AccountDirectory, RecordStore};
use ch_shared::types::response::{ApiResponse, ErrorBody};

use crate::middleware::cors::create_cors;
use crate::routes::verification::{request_code::request_code, verify_code::verify_code, AppState};

/// Build the application with all routes and middleware attached
pub fn create_app<R, A>(
    app_state: web::Data<AppState<R, A>>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    R: RecordStore + 'static,
    A: AccountDirectory + 'static,
{
    App::new()
        .app_data(app_state)
        .wrap(TracingLogger::default())
        .wrap(create_cors())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/verification")
                    .route("/request-code", web::post().to(request_code::<R, A>))
                    .route("/verify-code", web::post().to(verify_code::<R, A>)),
            ),
        )
        .default_service(web::route().to(not_found))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "campushire-verification",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> HttpResponse {
    let body = ErrorBody::new("NOT_FOUND", "The requested resource was not found");
    HttpResponse::NotFound().json(ApiResponse::<()>::error(body))
}
