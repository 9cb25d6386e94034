use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::Booking;
use crate::state::AppState;

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_all()?;
    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.bookings.delete(&id)? {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    tracing::info!(booking = %id, "booking cancelled via admin");
    Ok(Json(json!({ "cancelled": id })))
}
