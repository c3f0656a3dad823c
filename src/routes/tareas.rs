//! CRUD for the tareas collection.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::data;
use crate::error::{ApiError, ApiResult};
use crate::models::Tarea;
use crate::routes::clientes::IdPayload;
use crate::AppState;

pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<Vec<Tarea>>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener las tareas", e))?;
    let tareas = data::listar_tareas(&conn)
        .map_err(|e| ApiError::almacen("Error al obtener las tareas", e))?;
    Ok(Json(tareas))
}

pub async fn crear(
    State(estado): State<Arc<AppState>>,
    Json(mut tarea): Json<Tarea>,
) -> ApiResult<Json<Tarea>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al crear la tarea", e))?;
    let id = format!("t-{}", Uuid::new_v4());
    data::insertar_tarea(&conn, &id, &tarea)
        .map_err(|e| ApiError::almacen("Error al crear la tarea", e))?;
    tarea.id = Some(id);
    Ok(Json(tarea))
}

pub async fn actualizar(
    State(estado): State<Arc<AppState>>,
    Json(tarea): Json<Tarea>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = tarea
        .id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validacion("ID es requerido".to_string()))?
        .to_string();
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al actualizar la tarea", e))?;
    let cambiados = data::actualizar_tarea(&conn, &id, &tarea)
        .map_err(|e| ApiError::almacen("Error al actualizar la tarea", e))?;
    if cambiados == 0 {
        return Err(ApiError::NoEncontrado("Tarea no encontrada".to_string()));
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
        .map_err(|e| ApiError::almacen("Error al eliminar la tarea", e))?;
    let borrados = data::eliminar_tarea(&conn, payload.id.trim())
        .map_err(|e| ApiError::almacen("Error al eliminar la tarea", e))?;
    if borrados == 0 {
        return Err(ApiError::NoEncontrado("Tarea no encontrada".to_string()));
    }
    Ok(Json(serde_json::json!({ "deletedCount": borrados })))
}
