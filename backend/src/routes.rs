use actix_web::{HttpResponse, web};
use actix_web_httpauth::extractors::basic::BasicAuth;
use shared::ImageAnalysisRequest;

use crate::analysis::AnalysisService;
use crate::auth;
use crate::config::Settings;
use crate::docs;
use crate::error::ApiError;

pub const WELCOME_MESSAGE: &str =
    "Welcome to Project Smart Economy API! Please contact the developers to get access to this API.";

pub fn configure_routes(cfg: &mut web::ServiceConfig, development: bool) {
    cfg.route("/", web::get().to(root)).service(
        web::scope("/analysis")
            .app_data(json_config())
            .route("/image", web::post().to(analyze_image)),
    );

    if development {
        cfg.route("/openapi.json", web::get().to(docs::openapi_json))
            .route("/docs", web::get().to(docs::swagger_ui));
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(WELCOME_MESSAGE)
}

// Body first, then credentials: a malformed body is a 422 whatever the auth header says.
async fn analyze_image(
    body: web::Json<ImageAnalysisRequest>,
    credentials: Option<BasicAuth>,
    settings: web::Data<Settings>,
    analysis: web::Data<AnalysisService>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let username = auth::authenticate(credentials.as_ref(), &settings)?;
    log::info!(
        "Analysis requested by {} for {}/{}",
        username,
        request.user_id,
        request.prediction_id
    );

    let response = analysis.analyze(&request).await.map_err(|e| {
        log::error!(
            "Analysis of {}/{}/{} failed: {}",
            request.user_id,
            request.prediction_id,
            request.original_filename,
            e
        );
        e
    })?;

    log::info!(
        "Analysis of {}/{} predicted {}",
        request.user_id,
        request.prediction_id,
        response.predicted_class
    );
    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBlobStore, StubPredictor};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn basic(username: &str, password: &str) -> (header::HeaderName, String) {
        let token = STANDARD.encode(format!("{}:{}", username, password));
        (header::AUTHORIZATION, format!("Basic {}", token))
    }

    fn valid_body() -> Value {
        json!({
            "user_id": "user-1",
            "prediction_id": "pred-9",
            "original_filename": "leaf.png"
        })
    }

    fn settings(environment: &str) -> Settings {
        Settings {
            environment: environment.to_string(),
            ..Settings::default()
        }
    }

    macro_rules! app {
        ($settings:expr, $storage:expr) => {{
            let settings: Settings = $settings;
            let development = settings.is_development();
            let predictor = Arc::new(StubPredictor::new(&["blast", "healthy"], &[0.12345, 0.87655]));
            let analysis = AnalysisService::new($storage, predictor);
            test::init_service(
                App::new()
                    .app_data(web::Data::new(settings))
                    .app_data(web::Data::new(analysis))
                    .configure(|cfg| configure_routes(cfg, development)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn root_ignores_credentials() {
        let app = app!(settings("production"), Arc::new(MemoryBlobStore::default()));

        for req in [
            test::TestRequest::get().uri("/"),
            test::TestRequest::get().uri("/").insert_header(basic("fahmi", "wrong")),
        ] {
            let res = test::call_service(&app, req.to_request()).await;
            assert_eq!(res.status(), StatusCode::OK);
            let body: String = test::read_body_json(res).await;
            assert_eq!(body, WELCOME_MESSAGE);
        }
    }

    #[actix_web::test]
    async fn analysis_returns_probabilities_and_urls() {
        let storage = Arc::new(MemoryBlobStore::with_blob("user-1/pred-9/leaf.png", b"raw image"));
        let app = app!(settings("production"), storage.clone());

        let req = test::TestRequest::post()
            .uri("/analysis/image")
            .insert_header(basic("fahmi", "fahmi"))
            .set_json(valid_body())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["predicted_class"], "healthy");
        assert_eq!(body["class_probabilities"], json!({ "blast": 0.1235, "healthy": 0.8766 }));
        assert_eq!(body["heatmap"], "https://blobs.test/padi/user-1/pred-9/heatmap.png");
        assert_eq!(body["superimposed"], "https://blobs.test/padi/user-1/pred-9/superimposed.png");
        assert_eq!(body["masked"], "https://blobs.test/padi/user-1/pred-9/masked.png");
        assert_eq!(storage.downloads(), ["user-1/pred-9/leaf.png"]);
    }

    #[actix_web::test]
    async fn wrong_credentials_get_a_basic_challenge() {
        let storage = Arc::new(MemoryBlobStore::with_blob("user-1/pred-9/leaf.png", b"raw image"));
        let app = app!(settings("production"), storage.clone());

        for auth in [Some(basic("fahmx", "fahmi")), Some(basic("fahmi", "fahmo")), None] {
            let mut req = test::TestRequest::post().uri("/analysis/image").set_json(valid_body());
            if let Some(auth) = auth {
                req = req.insert_header(auth);
            }
            let res = test::call_service(&app, req.to_request()).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Basic");
        }
        assert!(storage.downloads().is_empty());
    }

    #[actix_web::test]
    async fn malformed_body_is_rejected_before_storage() {
        let storage = Arc::new(MemoryBlobStore::with_blob("user-1/pred-9/leaf.png", b"raw image"));
        let app = app!(settings("production"), storage.clone());

        let req = test::TestRequest::post()
            .uri("/analysis/image")
            .insert_header(basic("fahmi", "fahmi"))
            .set_json(json!({ "prediction_id": "pred-9", "original_filename": "leaf.png" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(res).await;
        assert!(body["detail"].as_str().unwrap().contains("user_id"));
        assert!(storage.downloads().is_empty());
    }

    #[actix_web::test]
    async fn storage_failures_surface_as_bad_gateway() {
        let app = app!(settings("production"), Arc::new(MemoryBlobStore::default()));

        let req = test::TestRequest::post()
            .uri("/analysis/image")
            .insert_header(basic("fahmi", "fahmi"))
            .set_json(valid_body())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "storage_error");
    }

    #[actix_web::test]
    async fn docs_only_in_development() {
        let dev = app!(settings("development"), Arc::new(MemoryBlobStore::default()));
        let res = test::call_service(&dev, test::TestRequest::get().uri("/docs").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = test::call_service(&dev, test::TestRequest::get().uri("/openapi.json").to_request()).await;
        let document: Value = test::read_body_json(res).await;
        assert!(document["paths"]["/analysis/image"]["post"].is_object());

        let prod = app!(settings("production"), Arc::new(MemoryBlobStore::default()));
        for uri in ["/docs", "/openapi.json"] {
            let res = test::call_service(&prod, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        }
    }
}
