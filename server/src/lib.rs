use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use engine::text::{lemmatizer_for, Lemmatizer};
use engine::{DocId, Index, IndexPaths, IndexStorage, SearchError, SearchMode, SearchOutcome, Searcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub mode: SearchMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    EmptyQuery,
    Matches,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    /// Minimal reprint of the query; absent when it only parses as a ranked query.
    pub canonical: Option<String>,
    pub outcome: OutcomeKind,
    pub total_hits: usize,
    pub took_s: f64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub url: String,
    pub score: Option<f64>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub url: String,
}

/// Loaded once at startup and shared read-only by every request.
pub struct Shared {
    pub index: Index,
    pub lemmatizer: Box<dyn Lemmatizer>,
}

#[derive(Clone)]
pub struct AppState(pub Arc<Shared>);

pub struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_query_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self.0, "search failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Loads the index under `index_dir`. Queries are stemmed with `language`,
/// or with the language recorded at build time when `None`.
pub fn build_app(index_dir: String, language: Option<&str>) -> Result<Router> {
    let (index, meta) = IndexStorage::new(IndexPaths::new(&index_dir))
        .load()
        .with_context(|| format!("loading index from {index_dir}"))?;
    let language = meta.query_language(language);
    let lemmatizer = lemmatizer_for(language).with_context(|| format!("no stemmer for language '{language}'"))?;
    tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, representation = %meta.representation, language, "index loaded");
    Ok(router(Shared { index, lemmatizer }))
}

pub fn router(shared: Shared) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState(Arc::new(shared)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(AppState(shared)): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let searcher = Searcher::new(&shared.index, shared.lemmatizer.as_ref());
    let outcome = searcher.search(&params.q, params.mode)?;
    let canonical = searcher.canonical(&params.q).ok();

    let (kind, total_hits, results) = match outcome {
        SearchOutcome::EmptyQuery => (OutcomeKind::EmptyQuery, 0, Vec::new()),
        SearchOutcome::Matches(found) => {
            let results = found
                .hits
                .into_iter()
                .map(|hit| SearchHit { doc_id: hit.doc_id, url: hit.url, score: hit.score })
                .collect();
            (OutcomeKind::Matches, found.total, results)
        }
    };

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        canonical,
        outcome: kind,
        total_hits,
        took_s: elapsed.as_secs_f64(),
        results,
    }))
}

pub async fn doc_handler(State(AppState(shared)): State<AppState>, Path(doc_id): Path<DocId>) -> Response {
    match shared.index.url(doc_id) {
        Some(url) => Json(DocResponse { doc_id, url: url.to_string() }).into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))).into_response(),
    }
}
