//! API routes

pub mod query;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_cases))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "name": "caselaw-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Case-law question answering with cited sources",
        "endpoints": {
            "POST /api/query": "Answer a legal query with citations",
            "GET /api/info": "Service metadata",
            "GET /health": "Liveness probe",
            "GET /ready": "Readiness probe"
        },
        "embedding_model": config.embeddings.model,
        "reranker_model": config.reranker.model,
        "vector_index": config.vector_index.index_name,
        "top_k_candidates": config.retrieval.top_k_candidates,
        "top_n": config.reranker.top_n,
        "max_citations": config.response.max_citations,
        "providers": state.pipeline().provider_labels(),
    }))
}
