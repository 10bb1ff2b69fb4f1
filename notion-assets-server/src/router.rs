use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};

use notion_assets_core::{build_file_router, AppState};

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/version", get(version_info));

    // File router carries its own TraceLayer and is already Router<()>.
    public_routes.merge(build_file_router(state))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use notion_assets_types::ShimConfig;

    fn server() -> TestServer {
        let state = AppState::from_config(&ShimConfig::default()).unwrap();
        TestServer::new(build_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let server = server();
        for path in ["/health", "/healthz"] {
            let response = server.get(path).await;
            response.assert_status_ok();
            response.assert_json(&serde_json::json!({"status": "ok"}));
        }
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let response = server().get("/version").await;

        response.assert_status_ok();
        let json: serde_json::Value = response.json();
        assert_eq!(json["cargo_version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_file_routes_mounted() {
        let response = server().get("/api/notion-file").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
