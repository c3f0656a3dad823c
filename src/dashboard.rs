//! Dashboard aggregation.
//!
//! One summary view out of the four entity collections: fixed status
//! predicates, amount totals, and the three "recent/upcoming" lists the
//! panel shows. Any collection-read error aborts the whole aggregation;
//! there is no partial summary — callers that need something to show fall
//! back to `ResumenDashboard::default()`, which is all zeros and empty
//! lists.
//!
//! Counts and totals are computed over all records in the store; nothing
//! here is scoped per account.

use rusqlite::Connection;
use serde::Serialize;
use std::cmp::Reverse;

use crate::data::{
    casos_por_estado, clientes_por_estado, listar_casos, pagos_por_estado, tareas_por_estado,
};
use crate::db::get_ajuste;
use crate::fechas::clave_orden;
use crate::models::{Caso, Pago, Tarea};

/// How many items each "recent/upcoming" list carries.
pub const TOP_RECIENTES: usize = 3;

/// Month-over-month delta figures shown next to the counts.
///
/// These are display placeholders, not statistics: nothing tracks history
/// yet, so the values come from the `ajustes` store (dashboard category)
/// with these defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Incrementos {
    pub clientes: i64,
    pub casos: i64,
    pub pagos_pendientes: f64,
    pub tareas: i64,
}

impl Default for Incrementos {
    fn default() -> Self {
        Self {
            clientes: 2,
            casos: 3,
            pagos_pendientes: -1200.0,
            tareas: 4,
        }
    }
}

impl Incrementos {
    /// Load the configured deltas, falling back to the defaults for any
    /// missing or malformed value.
    pub fn desde_ajustes(conn: &Connection) -> Self {
        let defaults = Self::default();
        let entero = |clave: &str, def: i64| {
            get_ajuste(conn, "dashboard", clave)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(def)
        };
        let real = |clave: &str, def: f64| {
            get_ajuste(conn, "dashboard", clave)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(def)
        };
        Self {
            clientes: entero("clientes_incremento", defaults.clientes),
            casos: entero("casos_incremento", defaults.casos),
            pagos_pendientes: real("pagos_pendientes_incremento", defaults.pagos_pendientes),
            tareas: entero("tareas_incremento", defaults.tareas),
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Resumen {
    pub clientes_activos: i64,
    pub clientes_incremento: i64,
    pub casos_abiertos: i64,
    pub casos_incremento: i64,
    /// Σ monto over pending payments.
    pub pagos_pendientes: f64,
    pub pagos_pendientes_incremento: f64,
    pub tareas_pendientes: i64,
    pub tareas_incremento: i64,
    /// Σ monto over completed payments.
    pub total_recibido: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Detalle {
    pub proximas_tareas: Vec<Tarea>,
    pub casos_recientes: Vec<Caso>,
    pub pagos_recientes: Vec<Pago>,
}

/// The whole dashboard payload. `Default` is the zeroed/empty fallback.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ResumenDashboard {
    pub resumen: Resumen,
    pub detalle: Detalle,
}

/// Σ monto over a payment slice. Zero for the empty slice.
pub fn suma_montos(pagos: &[Pago]) -> f64 {
    pagos.iter().map(|p| p.monto).sum()
}

/// Tasks closest to their due date first. Stable: ties keep insertion order.
pub fn proximas_tareas(mut tareas: Vec<Tarea>) -> Vec<Tarea> {
    tareas.sort_by_key(|t| clave_orden(&t.fecha_limite));
    tareas.truncate(TOP_RECIENTES);
    tareas
}

/// Newest cases first by start date. All states count as "recent".
pub fn casos_recientes(mut casos: Vec<Caso>) -> Vec<Caso> {
    casos.sort_by_key(|c| Reverse(clave_orden(&c.fecha_inicio)));
    casos.truncate(TOP_RECIENTES);
    casos
}

/// Newest completed payments first by payment date.
pub fn pagos_recientes(mut pagos: Vec<Pago>) -> Vec<Pago> {
    pagos.sort_by_key(|p| Reverse(clave_orden(&p.fecha)));
    pagos.truncate(TOP_RECIENTES);
    pagos
}

/// Build the dashboard summary from current entity state.
pub fn agregar(conn: &Connection) -> rusqlite::Result<ResumenDashboard> {
    let clientes = clientes_por_estado(conn, "Activo")?;
    let casos_abiertos = casos_por_estado(conn, "En proceso")?;
    let tareas = tareas_por_estado(conn, "Pendiente")?;
    let pendientes = pagos_por_estado(conn, "Pendiente")?;
    let completados = pagos_por_estado(conn, "Completado")?;
    let todos_los_casos = listar_casos(conn)?;

    let incrementos = Incrementos::desde_ajustes(conn);

    Ok(ResumenDashboard {
        resumen: Resumen {
            clientes_activos: clientes.len() as i64,
            clientes_incremento: incrementos.clientes,
            casos_abiertos: casos_abiertos.len() as i64,
            casos_incremento: incrementos.casos,
            pagos_pendientes: suma_montos(&pendientes),
            pagos_pendientes_incremento: incrementos.pagos_pendientes,
            tareas_pendientes: tareas.len() as i64,
            tareas_incremento: incrementos.tareas,
            total_recibido: suma_montos(&completados),
        },
        detalle: Detalle {
            proximas_tareas: proximas_tareas(tareas),
            casos_recientes: casos_recientes(todos_los_casos),
            pagos_recientes: pagos_recientes(completados),
        },
    })
}

// ===========================================================================
// Tests
// ===========================================================================
