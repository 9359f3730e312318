use actix_web::{HttpResponse, web};
use serde_json::{Value, json};

use crate::config::Settings;

pub fn openapi_document(settings: &Settings) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": settings.app_name, "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/": {
                "get": {
                    "summary": "Root",
                    "responses": { "200": { "description": "Welcome message" } }
                }
            },
            "/analysis/image": { "post": analysis_operation() }
        },
        "components": {
            "securitySchemes": { "HTTPBasic": { "type": "http", "scheme": "basic" } },
            "schemas": {
                "ImageAnalysisRequest": request_schema(),
                "AnalysisResponse": response_schema()
            }
        }
    })
}

fn analysis_operation() -> Value {
    let responses = json!({
        "200": {
            "description": "Prediction and artifact URLs",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AnalysisResponse" } } }
        },
        "401": { "description": "Incorrect credentials" },
        "404": { "description": "Not found" },
        "422": { "description": "Validation error" },
        "500": { "description": "Predictor failure" },
        "502": { "description": "Blob storage failure" }
    });

    json!({
        "tags": ["Image Analysis"],
        "summary": "Analyse a stored image",
        "security": [{ "HTTPBasic": [] }],
        "requestBody": {
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ImageAnalysisRequest" } } }
        },
        "responses": responses
    })
}

fn request_schema() -> Value {
    json!({
        "type": "object",
        "required": ["user_id", "prediction_id", "original_filename"],
        "properties": {
            "user_id": { "type": "string" },
            "prediction_id": { "type": "string" },
            "original_filename": { "type": "string" }
        }
    })
}

fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "predicted_class": { "type": "string" },
            "class_probabilities": { "type": "object", "additionalProperties": { "type": "number" } },
            "heatmap": { "type": "string", "format": "uri" },
            "superimposed": { "type": "string", "format": "uri" },
            "masked": { "type": "string", "format": "uri" }
        }
    })
}

pub async fn openapi_json(settings: web::Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(openapi_document(&settings))
}

pub async fn swagger_ui(settings: web::Data<Settings>) -> HttpResponse {
    let page = format!(
        r##"<!DOCTYPE html>
<html>
<head>
<title>{title} - Swagger UI</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>SwaggerUIBundle({{ url: "/openapi.json", dom_id: "#swagger-ui" }});</script>
</body>
</html>"##,
        title = escape_html(&settings.app_name)
    );
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
