//! API error taxonomy and HTTP mapping.
//!
//! Three families cover everything the handlers produce: a missing record
//! (404), a missing office configuration (412), invalid input (400), bad
//! credentials (401), and store failures (500). Store errors keep their
//! detail in the log; the wire only carries the route-level message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NoEncontrado(String),

    #[error("No hay configuración del despacho")]
    SinConfiguracion,

    #[error("{0}")]
    Validacion(String),

    #[error("Credenciales inválidas")]
    Credenciales,

    #[error("{0}")]
    Bloqueado(String),

    #[error("{0}")]
    Almacen(String),
}

impl ApiError {
    /// Store failure with a route-level message; the underlying cause goes
    /// to the log, not to the client.
    pub fn almacen(mensaje: &str, causa: impl std::fmt::Display) -> Self {
        error!("{mensaje}: {causa}");
        ApiError::Almacen(mensaje.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            ApiError::SinConfiguracion => StatusCode::PRECONDITION_FAILED,
            ApiError::Validacion(_) => StatusCode::BAD_REQUEST,
            ApiError::Credenciales => StatusCode::UNAUTHORIZED,
            ApiError::Bloqueado(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Almacen(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let cuerpo = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), cuerpo).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codigos_de_estado_por_variante() {
        assert_eq!(
            ApiError::NoEncontrado("Pago no encontrado".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::SinConfiguracion.status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiError::Validacion("El monto debe ser mayor a cero".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Credenciales.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Almacen("Error al obtener los clientes".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn configuracion_faltante_no_es_un_404() {
        // A missing office profile must stay distinguishable from a missing
        // payment so callers can react differently.
        assert_ne!(
            ApiError::SinConfiguracion.status(),
            ApiError::NoEncontrado("x".into()).status()
        );
    }
}
