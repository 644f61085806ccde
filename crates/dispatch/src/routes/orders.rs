//! Order dispatch routes.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::services::DispatchRow;
use crate::state::AppState;

/// Active orders with their assigned restaurant or ranked candidates.
#[instrument(skip(state))]
pub async fn dispatch_board(State(state): State<AppState>) -> Result<Json<Vec<DispatchRow>>> {
    let rows = state.dispatch().dispatch_board().await?;
    Ok(Json(rows))
}
