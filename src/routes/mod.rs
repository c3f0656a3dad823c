//! HTTP route handlers.
//!
//! One module per resource. Every CRUD handler follows the same shape:
//! take the shared connection, run one collection operation, serialize
//! the result. The dashboard and receipt handlers delegate to their core
//! modules (`crate::dashboard`, `crate::recibo`).

pub mod auth;
pub mod casos;
pub mod clientes;
pub mod configuracion;
pub mod dashboard;
pub mod pagos;
pub mod recibos;
pub mod tareas;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

/// Assemble the API router.
pub fn router(estado: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/clientes",
            get(clientes::obtener)
                .post(clientes::crear)
                .put(clientes::actualizar)
                .delete(clientes::eliminar),
        )
        .route(
            "/api/casos",
            get(casos::obtener)
                .post(casos::crear)
                .put(casos::actualizar)
                .delete(casos::eliminar),
        )
        .route(
            "/api/tareas",
            get(tareas::obtener)
                .post(tareas::crear)
                .put(tareas::actualizar)
                .delete(tareas::eliminar),
        )
        .route(
            "/api/pagos",
            get(pagos::obtener)
                .post(pagos::crear)
                .put(pagos::actualizar)
                .delete(pagos::eliminar),
        )
        .route("/api/dashboard", get(dashboard::obtener))
        .route("/api/recibos/:id", get(recibos::descargar))
        .route(
            "/api/configuracion",
            get(configuracion::obtener).post(configuracion::guardar),
        )
        .route(
            "/api/configuracion/password",
            put(configuracion::cambiar_password),
        )
        .route("/api/auth/login", post(auth::login))
        .with_state(estado)
}
