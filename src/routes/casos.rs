//! CRUD for the casos collection.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::data;
use crate::error::{ApiError, ApiResult};
use crate::models::Caso;
use crate::routes::clientes::IdPayload;
use crate::AppState;

pub async fn obtener(State(estado): State<Arc<AppState>>) -> ApiResult<Json<Vec<Caso>>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al obtener los casos", e))?;
    let casos =
        data::listar_casos(&conn).map_err(|e| ApiError::almacen("Error al obtener los casos", e))?;
    Ok(Json(casos))
}

pub async fn crear(
    State(estado): State<Arc<AppState>>,
    Json(mut caso): Json<Caso>,
) -> ApiResult<Json<Caso>> {
    let conn = estado
        .db
        .conn
        .lock()
        .map_err(|e| ApiError::almacen("Error al crear el caso", e))?;
    let id = format!("cs-{}", Uuid::new_v4());
    data::insertar_caso(&conn, &id, &caso)
        .map_err(|e| ApiError::almacen("Error al crear el caso", e))?;
    caso.id = Some(id);
    Ok(Json(caso))
}

pub async fn actualizar(
    State(estado): State<Arc<AppState>>,
    Json(caso): Json<Caso>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = caso
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
        .map_err(|e| ApiError::almacen("Error al actualizar el caso", e))?;
    let cambiados = data::actualizar_caso(&conn, &id, &caso)
        .map_err(|e| ApiError::almacen("Error al actualizar el caso", e))?;
    if cambiados == 0 {
        return Err(ApiError::NoEncontrado("Caso no encontrado".to_string()));
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
        .map_err(|e| ApiError::almacen("Error al eliminar el caso", e))?;
    let borrados = data::eliminar_caso(&conn, payload.id.trim())
        .map_err(|e| ApiError::almacen("Error al eliminar el caso", e))?;
    if borrados == 0 {
        return Err(ApiError::NoEncontrado("Caso no encontrado".to_string()));
    }
    Ok(Json(serde_json::json!({ "deletedCount": borrados })))
}
