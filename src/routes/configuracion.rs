//! Office configuration endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth;
use crate::data;
use crate::error::{ApiError, ApiResult};
use crate::models::Configuracion;
use crate::AppState;

#[derive(Deserialize)]
pub struct GuardarPayload {
    pub email: String,
    pub configuracion: Option<Configuracion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPayload {
    pub email: String,
    pub password: String,
    pub new_password: String,
}

pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<Configuracion>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener la configuración", e))?;
    let config = data::obtener_configuracion(&conn)
        .map_err(|e| ApiError::almacen("Error al obtener la configuración", e))?
        .ok_or_else(|| ApiError::NoEncontrado("No se encontró la configuración".to_string()))?;
    Ok(Json(config))
}

/// Upsert the configuration document, keyed by the account email.
pub async fn guardar(
    State(estado): State<Arc<AppState>>,
    Json(payload): Json<GuardarPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = payload.email.trim().to_string();
    let mut config = payload
        .configuracion
        .filter(|_| !email.is_empty())
        .ok_or_else(|| ApiError::Validacion("Datos inválidos".to_string()))?;
    config.email = email;

    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al actualizar la configuración", e))?;
    data::guardar_configuracion(&conn, &config)
        .map_err(|e| ApiError::almacen("Error al actualizar la configuración", e))?;
    Ok(Json(serde_json::json!({
        "message": "Configuración actualizada correctamente"
    })))
}

pub async fn cambiar_password(
    State(estado): State<Arc<AppState>>,
    Json(payload): Json<PasswordPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    if payload.email.trim().is_empty()
        || payload.password.is_empty()
        || payload.new_password.is_empty()
    {
        return Err(ApiError::Validacion("Datos inválidos".to_string()));
    }
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al actualizar la contraseña", e))?;
    auth::cambiar_password(
        &conn,
        payload.email.trim(),
        &payload.password,
        &payload.new_password,
    )?;
    Ok(Json(serde_json::json!({
        "message": "Contraseña actualizada correctamente"
    })))
}
