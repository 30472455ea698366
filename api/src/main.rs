//! CampusHire verification service entry point.
//!
//! Wires providers, the record store and the domain services together, then
//! serves the HTTP surface. Set `PROVIDER_MODE=live` to use the real
//! gateways; anything else runs with in-process mock providers, which is
//! enough for local development and smoke tests.

use std::env;
use std::io;
use std::sync::Arc;

use actix_web::{web, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ch_api::app::create_app;
use ch_api::routes::verification::AppState;
use ch_core::domain::Channel;
use ch_core::repositories::InMemoryAccountDirectory;
use ch_core::services::delivery::{CodeSender, Notifier, RemoteCodeVerifier};
use ch_core::services::handoff::{NoOpSessionHandoff, SessionHandoff};
use ch_core::services::issuance::IssuanceService;
use ch_core::services::retention::{RetentionSweeper, SweepConfig};
use ch_core::services::verification::VerificationEngine;
use ch_infra::providers::{ChatWebhookProvider, EmailApiProvider, MockProvider, SmsGatewayProvider};
use ch_infra::store::MemoryRecordStore;
use ch_shared::config::{Environment, VerificationPolicy};

struct Providers {
    chat: Arc<dyn CodeSender>,
    sms: Arc<dyn CodeSender>,
    email: Arc<dyn CodeSender>,
    remote: Arc<dyn RemoteCodeVerifier>,
    notifier: Arc<dyn Notifier>,
}

fn config_error(err: ch_infra::InfrastructureError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

fn build_providers() -> io::Result<Providers> {
    let mode = env::var("PROVIDER_MODE").unwrap_or_else(|_| "mock".to_string());

    if mode == "live" {
        let chat = Arc::new(ChatWebhookProvider::from_env().map_err(config_error)?);
        let sms = Arc::new(SmsGatewayProvider::from_env().map_err(config_error)?);
        let email = Arc::new(EmailApiProvider::from_env().map_err(config_error)?);

        info!(event = "providers_wired", mode = "live");
        Ok(Providers {
            chat: chat.clone(),
            sms: sms.clone(),
            email,
            remote: sms,
            notifier: chat,
        })
    } else {
        let chat = Arc::new(MockProvider::new(Channel::ChatWebhook));
        let sms = Arc::new(MockProvider::new(Channel::Sms));
        let email = Arc::new(MockProvider::new(Channel::Email));

        info!(event = "providers_wired", mode = "mock");
        Ok(Providers {
            chat: chat.clone(),
            sms: sms.clone(),
            email,
            remote: sms,
            notifier: chat,
        })
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let environment = Environment::from_env();
    // Environment-specific file first, then the shared .env; earlier files
    // win for duplicate keys.
    dotenvy::from_filename(environment.env_file()).ok();
    dotenvy::dotenv().ok();

    let default_filter = if environment.is_debug() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!(
        event = "startup",
        environment = %environment,
        "Starting CampusHire verification service"
    );

    let policy = VerificationPolicy::from_env();
    let providers = build_providers()?;

    let store = Arc::new(MemoryRecordStore::new());
    let accounts = Arc::new(InMemoryAccountDirectory::new());

    let issuance = Arc::new(
        IssuanceService::new(
            store.clone(),
            accounts,
            providers.chat,
            providers.sms,
            providers.email,
            policy.clone(),
        )
        .with_notifier(providers.notifier),
    );
    let engine =
        Arc::new(VerificationEngine::new(store.clone()).with_remote_verifier(providers.remote));
    let handoff: Arc<dyn SessionHandoff> = Arc::new(NoOpSessionHandoff);

    // Detached storage reclaim; expiry itself is enforced at verification
    // time, not here.
    RetentionSweeper::new(
        store.clone(),
        SweepConfig {
            retention_hours: policy.retention_hours,
            ..SweepConfig::default()
        },
    )
    .spawn();

    let app_state = web::Data::new(AppState {
        issuance,
        engine,
        handoff,
    });

    let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    let bind_address = format!("{}:{}", host, port);

    info!(event = "server_bind", address = %bind_address);

    HttpServer::new(move || create_app(app_state.clone()))
        .bind(&bind_address)?
        .run()
        .await
}
