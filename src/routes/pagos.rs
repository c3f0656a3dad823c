//! CRUD for the pagos collection.
//!
//! The only entity with an ingestion invariant: `monto` must be strictly
//! positive. Everything else follows the shared CRUD shape.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::data;
use crate::error::{ApiError, ApiResult};
use crate::models::Pago;
use crate::routes::clientes::IdPayload;
use crate::AppState;

fn validar_monto(pago: &Pago) -> ApiResult<()> {
    if !pago.monto.is_finite() || pago.monto <= 0.0 {
        return Err(ApiError::Validacion(
            "El monto debe ser mayor a cero".to_string(),
        ));
    }
    Ok(())
}

pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<Vec<Pago>>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener los pagos", e))?;
    let pagos =
        data::listar_pagos(&conn).map_err(|e| ApiError::almacen("Error al obtener los pagos", e))?;
    Ok(Json(pagos))
}

pub async fn crear(
    State(estado): State<Arc<AppState>>,
    Json(mut pago): Json<Pago>,
) -> ApiResult<Json<Pago>> {
    validar_monto(&pago)?;
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al crear el pago", e))?;
    let id = format!("p-{}", Uuid::new_v4());
    data::insertar_pago(&conn, &id, &pago)
        .map_err(|e| ApiError::almacen("Error al crear el pago", e))?;
    pago.id = Some(id);
    Ok(Json(pago))
}

pub async fn actualizar(
    State(estado): State<Arc<AppState>>,
    Json(pago): Json<Pago>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = pago
        .id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validacion("ID es requerido".to_string()))?
        .to_string();
    validar_monto(&pago)?;
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al actualizar el pago", e))?;
    let cambiados = data::actualizar_pago(&conn, &id, &pago)
        .map_err(|e| ApiError::almacen("Error al actualizar el pago", e))?;
    if cambiados == 0 {
        return Err(ApiError::NoEncontrado("Pago no encontrado".to_string()));
    }
    Ok(Json(serde_json::json!({ "modifiedCount": cambiados })))
}

pub async fn eliminar(
    State(estado): State<Arc<AppState>>,
    Json(payload): Json<IdPayload>,
) -> ApiResult<Json<serde_json::Value>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al eliminar el pago", e))?;
    let borrados = data::eliminar_pago(&conn, payload.id.trim())
        .map_err(|e| ApiError::almacen("Error al eliminar el pago", e))?;
    if borrados == 0 {
        return Err(ApiError::NoEncontrado("Pago no encontrado".to_string()));
    }
    Ok(Json(serde_json::json!({ "deletedCount": borrados })))
}
