//! Query endpoint

use axum::{extract::State, http::StatusCode, Json};

use crate::server::state::AppState;
use crate::types::{Outcome, QueryRequest, QueryResponse};

/// POST /api/query - Answer a legal query
///
/// Pipeline failures still return 200 with `error` set so the UI can render
/// them; only a rejected query is a 400.
pub async fn query_cases(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<QueryResponse>) {
    tracing::info!(user_id = %request.user_id, "Query received");

    let result = state
        .pipeline()
        .handle_query(&request.query, &request.user_id)
        .await;

    let status = match result.outcome {
        Outcome::Rejected => StatusCode::BAD_REQUEST,
        Outcome::Completed | Outcome::NoRelevantSources | Outcome::Failed => StatusCode::OK,
    };

    (status, Json(QueryResponse::from(result)))
}
