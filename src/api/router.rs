//! HTTP router.
//!
//! Returns a composable `Router`: the landing page, the health check, the
//! report endpoint and a static asset mount, wrapped in request tracing and
//! permissive CORS.

use std::path::Path;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

pub fn api_router(ctx: ApiContext, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(endpoints::landing::index))
        .route("/health", get(endpoints::health::check))
        .route("/explain-report", post(endpoints::explain::explain_report))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::generation::mock::ScriptedProvider;
    use crate::pipeline::prompt::EXTRACTION_SYSTEM_PROMPT;
    use crate::pipeline::{KnowledgeBase, ReportPipeline, DISCLAIMER};

    fn app_with(provider: ScriptedProvider, static_dir: &Path) -> Router {
        let pipeline = ReportPipeline::new(
            Arc::new(provider),
            Arc::new(KnowledgeBase::builtin()),
            Duration::from_secs(2),
        );
        api_router(ApiContext::new(pipeline), static_dir)
    }

    fn app(provider: ScriptedProvider) -> Router {
        app_with(provider, Path::new("frontend"))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn cbc_provider() -> ScriptedProvider {
        ScriptedProvider::from_fn(|req| {
            if req.system == Some(EXTRACTION_SYSTEM_PROMPT) {
                Ok(r#"{"test_type":"CBC","body_part_or_panel":"Blood","findings":["Hemoglobin 9.1 g/dL","WBC 12.4"],"impression":"Mild anemia","critical_values":[]}"#.to_string())
            } else {
                Ok("explanation".to_string())
            }
        })
    }

    #[tokio::test]
    async fn explain_report_returns_analysis() {
        let response = app(cbc_provider())
            .oneshot(post_json(
                "/explain-report",
                r#"{"report_text":"CBC: Hemoglobin 9.1 g/dL (L), WBC 12.4 (H)"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["patient_explanation"], "explanation");
        assert_eq!(json["clinician_explanation"], "explanation");
        assert_eq!(json["disclaimer"], DISCLAIMER);
        let citations: Vec<&str> = json["citations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            citations,
            vec![
                "https://www.mayoclinic.org/tests-procedures/hemoglobin-test/about/pac-20385075",
                "https://medlineplus.gov/wbc.html",
            ]
        );
    }

    #[tokio::test]
    async fn whitespace_report_is_rejected() {
        let response = app(cbc_provider())
            .oneshot(post_json("/explain-report", r#"{"report_text":"   \n "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["message"], "Empty report content");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = app(cbc_provider())
            .oneshot(post_json("/explain-report", r#"{"text":"wrong field"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn failing_backend_still_returns_200() {
        let response = app(ScriptedProvider::failing())
            .oneshot(post_json("/explain-report", r#"{"report_text":"CT head: no bleed."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert!(json["patient_explanation"]
            .as_str()
            .unwrap()
            .starts_with("Error generating patient explanation:"));
        assert_eq!(json["citations"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn crashed_pipeline_returns_500_with_cause() {
        let provider = ScriptedProvider::from_fn(|req| {
            if req.system == Some(EXTRACTION_SYSTEM_PROMPT) {
                Ok("{}".to_string())
            } else {
                panic!("summary worker crashed")
            }
        });
        let response = app(provider)
            .oneshot(post_json("/explain-report", r#"{"report_text":"CT head: no bleed."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("AI Processing Failed:"));
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let response = app(cbc_provider())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "scripted");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn landing_page_served() {
        let response = app(cbc_provider())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8_lossy(&bytes);
        assert!(html.contains("/explain-report"));
    }

    #[tokio::test]
    async fn static_assets_served_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();

        let response = app_with(cbc_provider(), dir.path())
            .oneshot(
                Request::builder()
                    .uri("/static/style.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"body { color: red; }");
    }
}
