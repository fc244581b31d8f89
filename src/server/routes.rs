use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::Error;
use crate::edge::Edge;
use crate::module::{ModuleNode, NodeSummary};
use crate::pipeline::IngestReport;
use crate::query::{Explanation, QueryEngine};
use crate::server::AppState;
use crate::storage::{ModuleDetail, MAX_LISTED_EDGES, MAX_LISTED_NODES};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    pub project_name: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl ToString) -> ApiError {
    (status, Json(ErrorResponse { error: message.to_string() }))
}

/// Store failures are 500, summarizer failures 502
fn from_error(e: Error) -> ApiError {
    let status = if e.is_upstream() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::error!("Request failed: {}", e);
    api_error(status, e)
}

fn not_found(id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Module not found: {}", id))
}

pub async fn upload_project(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> ApiResult<IngestReport> {
    let project = params
        .project_name
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "projectName is required"))?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        data = Some(bytes);
        break;
    }
    let data = data.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No file uploaded"))?;

    tracing::info!("Upload for project {}: {} bytes", project, data.len());

    let worker = state.clone();
    let report = tokio::task::spawn_blocking(move || {
        worker.pipeline.ingest_archive(worker.store.as_ref(), &project, &data)
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
    .map_err(|e| match e {
        Error::Archive(e) => api_error(StatusCode::BAD_REQUEST, format!("Invalid ZIP file: {}", e)),
        other => from_error(other),
    })?;

    Ok(Json(report))
}

pub async fn get_nodes(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ModuleNode>> {
    let engine = QueryEngine::new(state.store.as_ref());
    engine.nodes(MAX_LISTED_NODES).map(Json).map_err(from_error)
}

pub async fn get_edges(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Edge>> {
    let engine = QueryEngine::new(state.store.as_ref());
    engine.edges(MAX_LISTED_EDGES).map(Json).map_err(from_error)
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<NodeSummary>> {
    let engine = QueryEngine::new(state.store.as_ref());
    engine.search(&params.q, params.limit).map(Json).map_err(from_error)
}

pub async fn get_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ModuleDetail> {
    let engine = QueryEngine::new(state.store.as_ref());
    engine
        .module_detail(&id)
        .map_err(from_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn explain_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Explanation> {
    let engine = QueryEngine::new(state.store.as_ref());
    engine
        .explain(&id, &state.explainer)
        .await
        .map_err(from_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", service: "api" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::query::{Explainer, Summarizer};
    use crate::server::router;
    use crate::storage::{GraphStore, MemoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "tracelens-test-boundary";

    fn app_with(explainer: Explainer) -> axum::Router {
        let store = Arc::new(MemoryStore::new());
        store.ensure_schema().unwrap();
        router(Arc::new(AppState::new(store, explainer)))
    }

    fn app() -> axum::Router {
        app_with(Explainer::disabled())
    }

    fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", file_name).as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/zip\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(query: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/projects/upload{}", query))
            .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn scenario_upload() -> Request<Body> {
        let zip = zip_bytes(&[
            ("src/X.cs", "using A.B.C;\nnamespace A.B { class X {} }"),
            ("src/Y.cs", "namespace A.B.C { class Y {} }"),
        ]);
        upload_request("?projectName=proj", multipart_body("proj.zip", &zip))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"status": "ok", "service": "api"}));
    }

    #[tokio::test]
    async fn test_upload_then_query() {
        let app = app();

        let (status, json) = send(&app, scenario_upload()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({
            "ok": true, "project": "proj", "nodes": 2, "edges": 1, "packages": 0
        }));

        let (_, nodes) = send(&app, get("/graph/nodes")).await;
        assert_eq!(nodes.as_array().unwrap().len(), 2);
        assert!(nodes[0].get("filePath").is_some());

        let (_, edges) = send(&app, get("/graph/edges")).await;
        assert_eq!(edges, serde_json::json!([
            {"source": "proj:A.B.X", "target": "proj:A.B.C.Y", "type": "IMPORTS"}
        ]));

        let (_, hits) = send(&app, get("/graph/search?q=x")).await;
        assert_eq!(hits, serde_json::json!([
            {"id": "proj:A.B.X", "name": "X", "namespace": "A.B", "kind": "Class"}
        ]));

        let (status, detail) = send(&app, get("/graph/module/proj:A.B.X")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["outgoing"][0]["targetName"], "Y");
        assert_eq!(detail["imports"], serde_json::json!(["Y"]));
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let app = app();
        let zip = zip_bytes(&[("A.cs", "class A {}")]);

        let (status, _) = send(&app, upload_request("", multipart_body("a.zip", &zip))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&app, upload_request("?projectName=p", multipart_body("a.zip", b"not a zip"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid ZIP file"));

        let empty = format!("--{}--\r\n", BOUNDARY).into_bytes();
        let (status, json) = send(&app, upload_request("?projectName=p", empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_unknown_module_is_404() {
        let app = app();
        let (status, _) = send(&app, get("/graph/module/proj:Nope.Missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("POST")
            .uri("/explain/module/proj:Nope.Missing")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_explain_fallback() {
        let app = app();
        send(&app, scenario_upload()).await;

        let request = Request::builder()
            .method("POST")
            .uri("/explain/module/proj:A.B.X")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], "proj:A.B.X");
        assert!(json["explanation"].as_str().unwrap().contains("- Dependencies: Y"));
    }

    struct FailingSummarizer;

    #[async_trait::async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _prompt: &str) -> crate::Result<String> {
            Err(Error::Summarizer("upstream unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_502() {
        let app = app_with(Explainer::with_summarizer(Arc::new(FailingSummarizer)));
        send(&app, scenario_upload()).await;

        let request = Request::builder()
            .method("POST")
            .uri("/explain/module/proj:A.B.X")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("upstream unavailable"));
    }
}
