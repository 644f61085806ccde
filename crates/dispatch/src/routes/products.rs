//! Product availability routes.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::services::AvailabilityBoard;
use crate::state::AppState;

/// Which restaurant has which product in stock.
#[instrument(skip(state))]
pub async fn availability(State(state): State<AppState>) -> Result<Json<AvailabilityBoard>> {
    let board = state.dispatch().availability().await?;
    Ok(Json(board))
}
