//! Login endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::validar_usuario;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Validate credentials and return the public user document. Session
/// issuance is the hosting layer's concern.
pub async fn login(
    State(estado): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validacion("Datos inválidos".to_string()));
    }
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al validar el usuario", e))?;
    let usuario = validar_usuario(&conn, &estado.auth, payload.email.trim(), &payload.password)?;
    Ok(Json(usuario))
}
