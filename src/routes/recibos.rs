//! Receipt download endpoint.
//!
//! `GET /api/recibos/{id}` looks up the payment and the office profile,
//! resolves the client email by name, renders the PDF and streams it as
//! an attachment. Unknown payment -> 404; no office configuration -> the
//! dedicated profile-missing error.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Local;
use rusqlite::Connection;

use crate::data::{cliente_por_nombre, obtener_configuracion, pago_por_id};
use crate::error::{ApiError, ApiResult};
use crate::models::Despacho;
use crate::recibo::{render_pdf, ReciboDoc};
use crate::AppState;

/// Resolve everything the renderer needs for one payment id.
fn preparar_recibo(conn: &Connection, id: &str) -> ApiResult<(ReciboDoc, Despacho)> {
    let pago = pago_por_id(conn, id)
        .map_err(|e| ApiError::almacen("Error al generar el recibo", e))?
        .ok_or_else(|| ApiError::NoEncontrado("Pago no encontrado".to_string()))?;

    let config = obtener_configuracion(conn)
        .map_err(|e| ApiError::almacen("Error al generar el recibo", e))?
        .ok_or(ApiError::SinConfiguracion)?;

    // Relationship by name string: the first client with a matching name
    // contributes the email; nobody -> placeholder.
    let email = cliente_por_nombre(conn, pago.cliente.trim())
        .map_err(|e| ApiError::almacen("Error al generar el recibo", e))?
        .map(|c| c.email)
        .filter(|e| !e.trim().is_empty());

    Ok((ReciboDoc::desde_pago(&pago, email), config.despacho))
}

pub async fn descargar(
    Path(id): Path<String>,
    State(estado): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let (doc, despacho) = {
        let conn = estado
            .db
            .conn
            .lock()
            .map_err(|e| ApiError::almacen("Error al generar el recibo", e))?;
        preparar_recibo(&conn, id.trim())?
    };

    // The issue date is the render-time clock, by design; it is not stored.
    let render = render_pdf(&doc, &despacho, Local::now().date_naive());

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"recibo-{}.pdf\"", id.trim()),
        ),
    ];
    Ok((headers, render.bytes))
}

// ===========================================================================
// Tests
// ===========================================================================
