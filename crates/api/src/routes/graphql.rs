//! GraphQL endpoint and explorer.

use async_graphql::http::GraphiQLSource;
use async_graphql::{BatchRequest, BatchResponse};
use axum::Json;
use axum::extract::State;
use axum::response::Html;

use crate::graphql::Caller;
use crate::middleware::BearerIdentity;
use crate::state::AppState;

/// Path the explorer sends queries to.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Execute a single or batched GraphQL request.
///
/// Resolver errors are reported inside the response body; the HTTP status is
/// 200 unless the bearer token was rejected.
pub async fn execute(
    State(state): State<AppState>,
    BearerIdentity(caller): BearerIdentity,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let request = request.data(Caller(caller));
    Json(state.schema().execute_batch(request).await)
}

/// GraphiQL explorer.
pub async fn playground() -> Html<String> {
    Html(
        GraphiQLSource::build()
            .endpoint(GRAPHQL_PATH)
            .title("simple-ecomm GraphQL")
            .finish(),
    )
}
