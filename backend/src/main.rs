mod analysis;
mod auth;
mod config;
mod connection_string;
mod docs;
mod error;
mod predictor;
mod routes;
mod storage;
mod telemetry;
#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use analysis::AnalysisService;
use config::Settings;
use predictor::{CommandPredictor, Predictor};
use routes::configure_routes;
use std::sync::Arc;
use storage::S3BlobStore;
use telemetry::{TelemetryClient, TelemetryLogger, TelemetryMiddleware, TracedBlobStore};

fn cors_policy(settings: &Settings) -> Cors {
    settings
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = Settings::global();

    // Initialize telemetry and logging
    let telemetry = TelemetryClient::start(&settings.applicationinsights_connection_string)
        .map_err(|e| std::io::Error::other(format!("Telemetry setup failed: {}", e)))?;
    TelemetryLogger::init(telemetry.clone()).map_err(std::io::Error::other)?;

    log::info!(
        "Starting {} ({} mode)",
        settings.app_name,
        settings.environment
    );
    if !telemetry.is_enabled() {
        log::warn!("No Application Insights instrumentation key configured; telemetry export is disabled");
    }

    // Load model and class names
    let predictor = CommandPredictor::load_model(
        &settings.predictor_command,
        &settings.model_path,
        &settings.class_names_path,
        settings.predictor_timeout,
    )
    .map_err(|e| {
        log::error!("Failed to load model at startup: {}", e);
        std::io::Error::other(format!("Model loading failed: {}", e))
    })?;
    log::info!(
        "Loaded model {} with classes {:?}",
        settings.model_path.display(),
        predictor.class_names().names()
    );

    // Create blob storage client
    let storage = S3BlobStore::from_settings(settings).await.map_err(|e| {
        log::error!("Failed to configure blob storage: {}", e);
        std::io::Error::other(e)
    })?;
    let storage = TracedBlobStore::new(storage, telemetry.clone());

    // Create services
    let analysis = web::Data::new(AnalysisService::new(Arc::new(storage), Arc::new(predictor)));
    let settings_data = web::Data::new(settings.clone());
    let development = settings.is_development();
    if !development {
        log::info!("Interactive API documentation disabled outside development");
    }

    // Bind HTTP server
    let bind_address = format!("0.0.0.0:{}", settings.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(TelemetryMiddleware::new(telemetry.clone()))
            .wrap(cors_policy(&settings_data))
            .app_data(settings_data.clone())
            .app_data(analysis.clone())
            .configure(|cfg| configure_routes(cfg, development))
    })
    .bind(&bind_address)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::{HttpResponse, test};

    #[actix_web::test]
    async fn cors_allows_only_the_configured_origins() {
        let settings = Settings::default();
        let app = test::init_service(
            App::new()
                .wrap(cors_policy(&settings))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://kodesiana.com"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://kodesiana.com"
        );
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://evil.example"))
            .to_request();
        let res = test::try_call_service(&app, req).await;
        let allowed = res
            .ok()
            .and_then(|r| r.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).cloned());
        assert!(allowed.is_none());
    }
}
