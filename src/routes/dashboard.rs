//! Dashboard summary endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::dashboard::{agregar, ResumenDashboard};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// One summary object per request; a failed collection read fails the
/// whole response. The front end falls back to `ResumenDashboard::default()`
/// when this returns an error.
pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<ResumenDashboard>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener los datos del panel", e))?;
    let resumen =
        agregar(&conn).map_err(|e| ApiError::almacen("Error al obtener los datos del panel", e))?;
    Ok(Json(resumen))
}
