//! Entity records for the office: clients, cases, tasks, payments, and the
//! per-account configuration document.
//!
//! These are flat documents. Relationships between them are plain string
//! matches (a payment names its client by `cliente`, a task names its case
//! by `caso`); nothing enforces referential integrity. Wire field names
//! follow the existing front-end contract (`_id`, `fechaLimite`, ...).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    /// Free-text label of the matter this client is attached to.
    #[serde(default)]
    pub caso: String,
    /// "Activo" | "Inactivo" | "En espera"
    #[serde(default)]
    pub estado: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Caso {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub titulo: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub tipo: String,
    #[serde(default)]
    pub fecha_inicio: String,
    #[serde(default)]
    pub fecha_fin: String,
    /// "En proceso" | "En espera" | "Cerrado"
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub notas: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tarea {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub titulo: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub caso: String,
    #[serde(default)]
    pub fecha_limite: String,
    /// "Alta" | "Media" | "Baja"
    #[serde(default)]
    pub prioridad: String,
    /// "Pendiente" | "En progreso" | "Completada"
    #[serde(default)]
    pub estado: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pago {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub cliente: String,
    #[serde(default)]
    pub caso: String,
    pub monto: f64,
    #[serde(default)]
    pub fecha: String,
    /// Free string; the UI suggests Transferencia / Tarjeta de crédito /
    /// Efectivo / Cheque but anything is accepted.
    #[serde(default)]
    pub metodo: String,
    /// "Pendiente" | "Completado" | "Cancelado"
    #[serde(default)]
    pub estado: String,
    /// Voucher reference; empty means no voucher on file.
    #[serde(default)]
    pub comprobante: String,
    #[serde(default)]
    pub notas: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Perfil {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: String,
}

/// Office identity block printed on receipts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Despacho {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub rfc: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
}

/// Per-account configuration document, keyed by owner email.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Configuracion {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub perfil: Perfil,
    #[serde(default)]
    pub despacho: Despacho,
}

/// Login account. The hash never leaves the store; responses are built
/// field by field.
#[derive(Debug, Clone)]
pub struct Usuario {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub nombre: String,
    pub rol: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pago_usa_los_nombres_del_contrato() {
        let pago = Pago {
            id: Some("p-1".into()),
            cliente: "Juan Pérez".into(),
            caso: "Reclamación laboral".into(),
            monto: 2500.0,
            fecha: "2025-05-12".into(),
            metodo: "Transferencia".into(),
            estado: "Completado".into(),
            comprobante: "TRF-12345".into(),
            notas: String::new(),
        };
        let v = serde_json::to_value(&pago).unwrap();
        assert_eq!(v["_id"], "p-1");
        assert_eq!(v["monto"], 2500.0);
        assert_eq!(v["comprobante"], "TRF-12345");
    }

    #[test]
    fn tarea_serializa_fecha_limite_en_camel_case() {
        let tarea = Tarea {
            titulo: "Presentar demanda".into(),
            fecha_limite: "2025-06-01".into(),
            ..Tarea::default()
        };
        let v = serde_json::to_value(&tarea).unwrap();
        assert!(v.get("fechaLimite").is_some());
        assert!(v.get("fecha_limite").is_none());
        // A record never persisted has no _id on the wire.
        assert!(v.get("_id").is_none());
    }

    #[test]
    fn configuracion_anida_perfil_y_despacho() {
        let json = serde_json::json!({
            "email": "dueno@despacho.mx",
            "perfil": { "nombre": "Lic. González" },
            "despacho": {
                "nombre": "González & Asociados",
                "rfc": "GONA123456ABC",
                "direccion": "Av. Reforma 500, Piso 12, Ciudad"
            }
        });
        let config: Configuracion = serde_json::from_value(json).unwrap();
        assert_eq!(config.despacho.nombre, "González & Asociados");
        assert_eq!(config.perfil.telefono, "");
    }
}
