//! CRUD for the clientes collection.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::data;
use crate::error::{ApiError, ApiResult};
use crate::models::Cliente;
use crate::AppState;

#[derive(serde::Deserialize)]
pub struct IdPayload {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
}

pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<Vec<Cliente>>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener los clientes", e))?;
    let clientes = data::listar_clientes(&conn)
        .map_err(|e| ApiError::almacen("Error al obtener los clientes", e))?;
    Ok(Json(clientes))
}

pub async fn crear(
    State(estado): State<Arc<AppState>>,
    Json(mut cliente): Json<Cliente>,
) -> ApiResult<Json<Cliente>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al crear el cliente", e))?;
    let id = format!("cl-{}", Uuid::new_v4());
    data::insertar_cliente(&conn, &id, &cliente)
        .map_err(|e| ApiError::almacen("Error al crear el cliente", e))?;
    cliente.id = Some(id);
    Ok(Json(cliente))
}

pub async fn actualizar(
    State(estado): State<Arc<AppState>>,
    Json(cliente): Json<Cliente>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = cliente
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
        .map_err(|e| ApiError::almacen("Error al actualizar el cliente", e))?;
    let cambiados = data::actualizar_cliente(&conn, &id, &cliente)
        .map_err(|e| ApiError::almacen("Error al actualizar el cliente", e))?;
    if cambiados == 0 {
        return Err(ApiError::NoEncontrado("Cliente no encontrado".to_string()));
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
        .map_err(|e| ApiError::almacen("Error al eliminar el cliente", e))?;
    let borrados = data::eliminar_cliente(&conn, payload.id.trim())
        .map_err(|e| ApiError::almacen("Error al eliminar el cliente", e))?;
    if borrados == 0 {
        return Err(ApiError::NoEncontrado("Cliente no encontrado".to_string()));
    }
    Ok(Json(serde_json::json!({ "deletedCount": borrados })))
}
