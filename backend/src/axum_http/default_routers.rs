use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::axum_http::views::PageContext;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

pub async fn not_found(page: PageContext) -> impl IntoResponse {
    info!("router: not_found handler invoked");
    page.error_page(StatusCode::NOT_FOUND)
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axum_http::views::test_support::with_page_extensions;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_version_and_utc_timestamp() {
        let response = Router::new()
            .route("/health", get(health_check))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn unknown_path_renders_not_found_page() {
        let app = with_page_extensions(Router::new().fallback(not_found));

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
