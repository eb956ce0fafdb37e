use crate::document::{CorpusEntry, Document};
use crate::engine::{BuildReport, SearchEngine, SearchOptions};
use crate::error::SearchError;
use crate::format::{format_results, FormattedResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    /// Comma-separated field names
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub prefix: Option<bool>,
    #[serde(default)]
    pub snippet: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<FormattedResult>,
    pub total: usize,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

// ========== Error Handling ==========

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<SearchError>() {
            Some(SearchError::NotBuilt) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = format!("{:#}", self.0);
        tracing::error!("API error: {}", message);

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK"))
}

async fn search_documents(
    State(engine): State<Arc<SearchEngine>>,
    Query(req): Query<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let options = SearchOptions {
        fields: req.fields.as_deref().map(|f| {
            f.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        }),
        limit: req.limit,
        prefix_match: req.prefix.unwrap_or(false),
        ..SearchOptions::default()
    };

    let snapshot = engine.snapshot()?;
    let result = snapshot.search(&req.q, &options);

    let response = SearchResponse {
        results: format_results(&result.hits, snapshot.store(), req.snippet),
        total: result.total_candidates,
        truncated: result.truncated,
        query: req.q,
    };

    Ok(Json(ApiResponse::success(response)))
}

async fn get_document(
    State(engine): State<Arc<SearchEngine>>,
    Query(req): Query<DocumentRequest>,
) -> Result<Response, AppError> {
    let response = match engine.get_document(&req.url)? {
        Some(doc) => Json(ApiResponse::<Document>::success(doc)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!("Document with url '{}' not found", req.url))),
        )
            .into_response(),
    };
    Ok(response)
}

async fn replace_corpus(
    State(engine): State<Arc<SearchEngine>>,
    Json(records): Json<Vec<CorpusEntry>>,
) -> Result<impl IntoResponse, AppError> {
    // Indexing is CPU-bound; keep it off the async workers
    let report: BuildReport = tokio::task::spawn_blocking(move || engine.build(records)).await??;
    Ok(Json(ApiResponse::success(report)))
}

async fn get_stats(State(engine): State<Arc<SearchEngine>>) -> Result<impl IntoResponse, AppError> {
    let stats = engine.stats()?;
    Ok(Json(ApiResponse::success(stats)))
}

// ========== Router ==========

pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search_documents))
        .route("/documents", get(get_document))
        .route("/corpus", put(replace_corpus))
        .route("/stats", get(get_stats))
        .with_state(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawRecord;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(router: Router, request: Request<Body>) -> anyhow::Result<(StatusCode, serde_json::Value)> {
        let response = router.oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn built_engine() -> Arc<SearchEngine> {
        let engine = SearchEngine::default();
        engine
            .build(vec![
                RawRecord::new("https://example.com/gradle")
                    .with_title("Getting Started with Gradle")
                    .with_excerpt("Gradle is a build tool with a long and rich excerpt")
                    .with_tags(["Gradle", "Java"]),
                RawRecord::new("https://example.com/maven")
                    .with_title("Working with Maven")
                    .with_excerpt("Compared to Gradle, Maven is declarative")
                    .with_tags(["Maven", "Java"]),
            ])
            .unwrap();
        Arc::new(engine)
    }

    #[tokio::test]
    async fn test_search_endpoint() -> anyhow::Result<()> {
        let router = create_router(built_engine());
        let (status, body) = call(router, get_request("/search?q=gradle&snippet=10")).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total"], 2);
        let results = body["data"]["results"].as_array().unwrap();
        assert_eq!(results[0]["url"], "https://example.com/gradle");
        assert_eq!(results[0]["excerpt"], "Gradle is…");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_endpoint_with_fields() -> anyhow::Result<()> {
        let router = create_router(built_engine());
        let (_, body) = call(router, get_request("/search?q=gradle&fields=title,%20nope")).await?;

        let results = body["data"]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["url"], "https://example.com/gradle");
        Ok(())
    }

    #[tokio::test]
    async fn test_not_built_is_unavailable() -> anyhow::Result<()> {
        let router = create_router(Arc::new(SearchEngine::default()));
        let (status, body) = call(router, get_request("/search?q=gradle")).await?;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_document_lookup() -> anyhow::Result<()> {
        let engine = built_engine();
        let (status, body) = call(
            create_router(engine.clone()),
            get_request("/documents?url=https://example.com/maven"),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Working with Maven");

        let (status, _) = call(create_router(engine), get_request("/documents?url=https://example.com/none")).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_corpus() -> anyhow::Result<()> {
        let engine = built_engine();
        let request = Request::builder()
            .method("PUT")
            .uri("/corpus")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"[{"url": "https://example.com/lambda", "title": "AWS Lambda"}, {"title": "orphan"},
                    {"url": "https://example.com/typo", "tags": "AWS"}]"#,
            ))?;

        let (status, body) = call(create_router(engine.clone()), request).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["indexed"], 1);
        let rejected = body["data"]["rejected"].as_array().unwrap();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[1]["position"], 2);

        let (_, body) = call(create_router(engine), get_request("/stats")).await?;
        assert_eq!(body["data"]["total_documents"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_corpus() -> anyhow::Result<()> {
        let engine = built_engine();
        let request = Request::builder()
            .method("PUT")
            .uri("/corpus")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"url": "https://example.com/not-an-array"}"#))?;

        let response = create_router(engine.clone()).oneshot(request).await?;
        assert!(response.status().is_client_error());

        let (status, body) = call(create_router(engine), get_request("/search?q=maven")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["results"][0]["url"], "https://example.com/maven");
        Ok(())
    }
}
