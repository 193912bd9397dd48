pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assembler::handlers as assembler;
use crate::revision::handlers as revision;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout Assembler
        .route("/api/v1/catalog", get(assembler::handle_list_catalog))
        .route("/api/v1/layouts/search", post(assembler::handle_search))
        // Revision Engine (stateless)
        .route("/api/v1/layouts/analyze", post(revision::handle_analyze))
        .route("/api/v1/commands/interpret", post(revision::handle_interpret))
        // Revision Engine (sessions)
        .route("/api/v1/sessions", post(revision::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(revision::handle_get_session).delete(revision::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/commands",
            post(revision::handle_session_command),
        )
        .route(
            "/api/v1/sessions/:id/transforms",
            post(revision::handle_session_transforms),
        )
        .route("/api/v1/sessions/:id/undo", post(revision::handle_undo))
        .route("/api/v1/sessions/:id/redo", post(revision::handle_redo))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Config {
            port: 0,
            rust_log: "info".to_string(),
            catalog_path: None,
            beam_width: 5,
            max_depth: 7,
            history_cap: 50,
            session_ttl_secs: 3600,
        };
        build_router(AppState::new(&config, Catalog::builtin().unwrap()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn scenario_content() -> Value {
        json!({
            "hero": {"headline": "Ship pages faster", "subheadline": "From content to layout"},
            "features": {"items": ["Fast", "Safe", "Typed"]},
            "cta": {"headline": "Start now", "primaryAction": {"label": "Sign up", "href": "/signup"}}
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "pagewright");
    }

    #[tokio::test]
    async fn test_catalog_lists_templates() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.as_array().map(Vec::len),
            Some(Catalog::builtin().unwrap().len())
        );
    }

    #[tokio::test]
    async fn test_search_returns_primary_layout() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": scenario_content(), "tone": "bold"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let sections = body["primary"]["sections"].as_array().unwrap();
        assert_eq!(sections[0]["kind"], "hero");
        assert_eq!(body["alternates"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_search_missing_kind_is_422() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": {}, "required_kinds": ["hero", "gallery"]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "MISSING_KIND");
    }

    #[tokio::test]
    async fn test_search_rejects_empty_required_kinds() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": {}, "required_kinds": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_interpret_previews_without_applying() {
        let app = app();
        let (_, search) = send(
            &app,
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": scenario_content(), "tone": "bold"})),
        )
        .await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/commands/interpret",
            Some(json!({"text": "make the hero more dramatic", "layout": search["primary"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transforms"], json!([{"op": "dramatize-hero"}]));
        assert_eq!(body["warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let app = app();
        let (_, search) = send(
            &app,
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": scenario_content(), "tone": "bold"})),
        )
        .await;
        let initial = search["primary"].clone();

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"layout": initial})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, outcome) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/commands"),
            Some(json!({"text": "add urgency banner"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["session"]["layout"]["sections"][0]["kind"], "cta");
        assert_eq!(outcome["session"]["can_undo"], true);

        let (status, undo) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/undo"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(undo["layout"], initial);

        let (_, boundary) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/undo"), None).await;
        assert_eq!(boundary["layout"], Value::Null);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/transforms"),
            Some(json!({"transforms": [{"op": "reorder", "from": 0, "to": 1}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let app = app();
        let (_, search) = send(
            &app,
            Method::POST,
            "/api/v1/layouts/search",
            Some(json!({"content": scenario_content()})),
        )
        .await;
        let primary = search["primary"].clone();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/layouts/analyze",
            Some(json!({"before": primary, "after": primary})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], json!(["No changes"]));
    }

    #[tokio::test]
    async fn test_duplicate_block_ids_are_rejected() {
        let block = |kind: &str, template: &str, variant: &str| {
            json!({
                "id": "a",
                "template_id": template,
                "kind": kind,
                "variant": variant,
                "tone": "bold"
            })
        };
        let layout = json!({"sections": [
            block("hero", "hero-split-bold", "split-bold"),
            block("cta", "cta-banner-bold", "banner-bold")
        ]});
        let app = app();

        let requests = [
            ("/api/v1/layouts/analyze", json!({"before": layout, "after": layout})),
            (
                "/api/v1/commands/interpret",
                json!({"text": "increase contrast", "layout": layout}),
            ),
            ("/api/v1/sessions", json!({"layout": layout})),
        ];
        for (uri, body) in requests {
            let (status, body) = send(&app, Method::POST, uri, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
            assert!(
                body["error"]["message"]
                    .as_str()
                    .unwrap()
                    .contains("Duplicate block id 'a'"),
                "{uri}"
            );
        }

        let (_, health) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(health["sessions"], 0);
    }
}
