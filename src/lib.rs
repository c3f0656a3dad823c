//! LegalManager backend.
//!
//! REST-style JSON API for a small law office: clients, cases, tasks,
//! payments, office configuration and login, plus two derived flows — the
//! dashboard summary (`/api/dashboard`) and PDF payment receipts
//! (`/api/recibos/{id}`). Backed by a local SQLite store.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod db;
pub mod error;
pub mod fechas;
pub mod models;
pub mod recibo;
pub mod routes;

/// Shared state injected into every request handler.
pub struct AppState {
    pub db: db::DbState,
    pub auth: auth::AuthState,
}
