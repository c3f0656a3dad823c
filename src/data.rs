//! Collection access helpers.
//!
//! One section per collection: list, insert, update-by-id, delete-by-id,
//! plus the filtered reads the dashboard and receipt flows need. Filtered
//! reads return rows in insertion order (`rowid`); any ranking happens in
//! the caller with a stable sort so ties keep their insertion order.
//!
//! Date-valued fields are normalized to `YYYY-MM-DD` here, on the way into
//! the store. Readers still tolerate the legacy `DD/MM/YYYY` form.

use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::fechas::normalizar_fecha;
use crate::models::{Caso, Cliente, Configuracion, Despacho, Pago, Perfil, Tarea, Usuario};

// ---------------------------------------------------------------------------
// Clientes
// ---------------------------------------------------------------------------

fn cliente_from_row(row: &rusqlite::Row) -> Result<Cliente> {
    Ok(Cliente {
        id: Some(row.get(0)?),
        nombre: row.get(1)?,
        email: row.get(2)?,
        telefono: row.get(3)?,
        caso: row.get(4)?,
        estado: row.get(5)?,
    })
}

const CLIENTE_COLS: &str = "id, nombre, email, telefono, caso, estado";

pub fn listar_clientes(conn: &Connection) -> Result<Vec<Cliente>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENTE_COLS} FROM clientes ORDER BY rowid"
    ))?;
    let filas = stmt.query_map([], cliente_from_row)?;
    filas.collect()
}

pub fn clientes_por_estado(conn: &Connection, estado: &str) -> Result<Vec<Cliente>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENTE_COLS} FROM clientes WHERE estado = ?1 ORDER BY rowid"
    ))?;
    let filas = stmt.query_map(params![estado], cliente_from_row)?;
    filas.collect()
}

/// Resolve a client record by exact name match (relationships between
/// collections are name strings, not keys). First match wins.
pub fn cliente_por_nombre(conn: &Connection, nombre: &str) -> Result<Option<Cliente>> {
    conn.query_row(
        &format!("SELECT {CLIENTE_COLS} FROM clientes WHERE nombre = ?1 ORDER BY rowid LIMIT 1"),
        params![nombre],
        cliente_from_row,
    )
    .optional()
}

pub fn insertar_cliente(conn: &Connection, id: &str, cliente: &Cliente) -> Result<()> {
    conn.execute(
        "INSERT INTO clientes (id, nombre, email, telefono, caso, estado)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            cliente.nombre,
            cliente.email,
            cliente.telefono,
            cliente.caso,
            cliente.estado,
        ],
    )?;
    Ok(())
}

/// Returns the number of rows matched (0 = unknown id).
pub fn actualizar_cliente(conn: &Connection, id: &str, cliente: &Cliente) -> Result<usize> {
    conn.execute(
        "UPDATE clientes SET nombre=?1, email=?2, telefono=?3, caso=?4, estado=?5,
         updated_at=datetime('now')
         WHERE id=?6",
        params![
            cliente.nombre,
            cliente.email,
            cliente.telefono,
            cliente.caso,
            cliente.estado,
            id,
        ],
    )
}

pub fn eliminar_cliente(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM clientes WHERE id = ?1", params![id])
}

// ---------------------------------------------------------------------------
// Casos
// ---------------------------------------------------------------------------

fn caso_from_row(row: &rusqlite::Row) -> Result<Caso> {
    Ok(Caso {
        id: Some(row.get(0)?),
        titulo: row.get(1)?,
        cliente: row.get(2)?,
        tipo: row.get(3)?,
        fecha_inicio: row.get(4)?,
        fecha_fin: row.get(5)?,
        estado: row.get(6)?,
        notas: row.get(7)?,
    })
}

const CASO_COLS: &str = "id, titulo, cliente, tipo, fecha_inicio, fecha_fin, estado, notas";

pub fn listar_casos(conn: &Connection) -> Result<Vec<Caso>> {
    let mut stmt = conn.prepare(&format!("SELECT {CASO_COLS} FROM casos ORDER BY rowid"))?;
    let filas = stmt.query_map([], caso_from_row)?;
    filas.collect()
}

pub fn casos_por_estado(conn: &Connection, estado: &str) -> Result<Vec<Caso>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CASO_COLS} FROM casos WHERE estado = ?1 ORDER BY rowid"
    ))?;
    let filas = stmt.query_map(params![estado], caso_from_row)?;
    filas.collect()
}

pub fn insertar_caso(conn: &Connection, id: &str, caso: &Caso) -> Result<()> {
    conn.execute(
        "INSERT INTO casos (id, titulo, cliente, tipo, fecha_inicio, fecha_fin, estado, notas)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            caso.titulo,
            caso.cliente,
            caso.tipo,
            normalizar_fecha(&caso.fecha_inicio),
            normalizar_fecha(&caso.fecha_fin),
            caso.estado,
            caso.notas,
        ],
    )?;
    Ok(())
}

pub fn actualizar_caso(conn: &Connection, id: &str, caso: &Caso) -> Result<usize> {
    conn.execute(
        "UPDATE casos SET titulo=?1, cliente=?2, tipo=?3, fecha_inicio=?4, fecha_fin=?5,
         estado=?6, notas=?7, updated_at=datetime('now')
         WHERE id=?8",
        params![
            caso.titulo,
            caso.cliente,
            caso.tipo,
            normalizar_fecha(&caso.fecha_inicio),
            normalizar_fecha(&caso.fecha_fin),
            caso.estado,
            caso.notas,
            id,
        ],
    )
}

pub fn eliminar_caso(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM casos WHERE id = ?1", params![id])
}

// ---------------------------------------------------------------------------
// Tareas
// ---------------------------------------------------------------------------

fn tarea_from_row(row: &rusqlite::Row) -> Result<Tarea> {
    Ok(Tarea {
        id: Some(row.get(0)?),
        titulo: row.get(1)?,
        cliente: row.get(2)?,
        caso: row.get(3)?,
        fecha_limite: row.get(4)?,
        prioridad: row.get(5)?,
        estado: row.get(6)?,
    })
}

const TAREA_COLS: &str = "id, titulo, cliente, caso, fecha_limite, prioridad, estado";

pub fn listar_tareas(conn: &Connection) -> Result<Vec<Tarea>> {
    let mut stmt = conn.prepare(&format!("SELECT {TAREA_COLS} FROM tareas ORDER BY rowid"))?;
    let filas = stmt.query_map([], tarea_from_row)?;
    filas.collect()
}

pub fn tareas_por_estado(conn: &Connection, estado: &str) -> Result<Vec<Tarea>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAREA_COLS} FROM tareas WHERE estado = ?1 ORDER BY rowid"
    ))?;
    let filas = stmt.query_map(params![estado], tarea_from_row)?;
    filas.collect()
}

pub fn insertar_tarea(conn: &Connection, id: &str, tarea: &Tarea) -> Result<()> {
    conn.execute(
        "INSERT INTO tareas (id, titulo, cliente, caso, fecha_limite, prioridad, estado)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            tarea.titulo,
            tarea.cliente,
            tarea.caso,
            normalizar_fecha(&tarea.fecha_limite),
            tarea.prioridad,
            tarea.estado,
        ],
    )?;
    Ok(())
}

pub fn actualizar_tarea(conn: &Connection, id: &str, tarea: &Tarea) -> Result<usize> {
    conn.execute(
        "UPDATE tareas SET titulo=?1, cliente=?2, caso=?3, fecha_limite=?4, prioridad=?5,
         estado=?6, updated_at=datetime('now')
         WHERE id=?7",
        params![
            tarea.titulo,
            tarea.cliente,
            tarea.caso,
            normalizar_fecha(&tarea.fecha_limite),
            tarea.prioridad,
            tarea.estado,
            id,
        ],
    )
}

pub fn eliminar_tarea(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM tareas WHERE id = ?1", params![id])
}

// ---------------------------------------------------------------------------
// Pagos
// ---------------------------------------------------------------------------

fn pago_from_row(row: &rusqlite::Row) -> Result<Pago> {
    Ok(Pago {
        id: Some(row.get(0)?),
        cliente: row.get(1)?,
        caso: row.get(2)?,
        monto: row.get(3)?,
        fecha: row.get(4)?,
        metodo: row.get(5)?,
        estado: row.get(6)?,
        comprobante: row.get(7)?,
        notas: row.get(8)?,
    })
}

const PAGO_COLS: &str = "id, cliente, caso, monto, fecha, metodo, estado, comprobante, notas";

pub fn listar_pagos(conn: &Connection) -> Result<Vec<Pago>> {
    let mut stmt = conn.prepare(&format!("SELECT {PAGO_COLS} FROM pagos ORDER BY rowid"))?;
    let filas = stmt.query_map([], pago_from_row)?;
    filas.collect()
}

pub fn pagos_por_estado(conn: &Connection, estado: &str) -> Result<Vec<Pago>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAGO_COLS} FROM pagos WHERE estado = ?1 ORDER BY rowid"
    ))?;
    let filas = stmt.query_map(params![estado], pago_from_row)?;
    filas.collect()
}

pub fn pago_por_id(conn: &Connection, id: &str) -> Result<Option<Pago>> {
    conn.query_row(
        &format!("SELECT {PAGO_COLS} FROM pagos WHERE id = ?1"),
        params![id],
        pago_from_row,
    )
    .optional()
}

pub fn insertar_pago(conn: &Connection, id: &str, pago: &Pago) -> Result<()> {
    conn.execute(
        "INSERT INTO pagos (id, cliente, caso, monto, fecha, metodo, estado, comprobante, notas)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            pago.cliente,
            pago.caso,
            pago.monto,
            normalizar_fecha(&pago.fecha),
            pago.metodo,
            pago.estado,
            pago.comprobante,
            pago.notas,
        ],
    )?;
    Ok(())
}

pub fn actualizar_pago(conn: &Connection, id: &str, pago: &Pago) -> Result<usize> {
    conn.execute(
        "UPDATE pagos SET cliente=?1, caso=?2, monto=?3, fecha=?4, metodo=?5, estado=?6,
         comprobante=?7, notas=?8, updated_at=datetime('now')
         WHERE id=?9",
        params![
            pago.cliente,
            pago.caso,
            pago.monto,
            normalizar_fecha(&pago.fecha),
            pago.metodo,
            pago.estado,
            pago.comprobante,
            pago.notas,
            id,
        ],
    )
}

pub fn eliminar_pago(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM pagos WHERE id = ?1", params![id])
}

// ---------------------------------------------------------------------------
// Configuracion
// ---------------------------------------------------------------------------

/// First (in practice only) configuration document in the store.
///
/// Malformed sub-documents fall back to their defaults rather than failing
/// the read; the office tolerates partial configuration.
pub fn obtener_configuracion(conn: &Connection) -> Result<Option<Configuracion>> {
    conn.query_row(
        "SELECT email, perfil, despacho FROM configuracion ORDER BY rowid LIMIT 1",
        [],
        |row| {
            let email: String = row.get(0)?;
            let perfil_json: String = row.get(1)?;
            let despacho_json: String = row.get(2)?;
            Ok(Configuracion {
                email,
                perfil: serde_json::from_str::<Perfil>(&perfil_json).unwrap_or_default(),
                despacho: serde_json::from_str::<Despacho>(&despacho_json).unwrap_or_default(),
            })
        },
    )
    .optional()
}

/// Upsert the configuration document for an account.
pub fn guardar_configuracion(conn: &Connection, config: &Configuracion) -> Result<()> {
    let perfil = serde_json::to_string(&config.perfil).unwrap_or_else(|_| "{}".to_string());
    let despacho = serde_json::to_string(&config.despacho).unwrap_or_else(|_| "{}".to_string());
    conn.execute(
        "INSERT INTO configuracion (email, perfil, despacho, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(email) DO UPDATE SET
            perfil = excluded.perfil,
            despacho = excluded.despacho,
            updated_at = excluded.updated_at",
        params![config.email, perfil, despacho],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Usuarios
// ---------------------------------------------------------------------------

fn usuario_from_row(row: &rusqlite::Row) -> Result<Usuario> {
    Ok(Usuario {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        nombre: row.get(3)?,
        rol: row.get(4)?,
    })
}

pub fn usuario_por_email(conn: &Connection, email: &str) -> Result<Option<Usuario>> {
    conn.query_row(
        "SELECT id, email, password, nombre, rol FROM usuarios WHERE email = ?1",
        params![email],
        usuario_from_row,
    )
    .optional()
}

pub fn insertar_usuario(conn: &Connection, usuario: &Usuario) -> Result<()> {
    conn.execute(
        "INSERT INTO usuarios (id, email, password, nombre, rol)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            usuario.id,
            usuario.email,
            usuario.password_hash,
            usuario.nombre,
            usuario.rol,
        ],
    )?;
    Ok(())
}

pub fn actualizar_password(conn: &Connection, email: &str, password_hash: &str) -> Result<usize> {
    conn.execute(
        "UPDATE usuarios SET password = ?1, updated_at = datetime('now') WHERE email = ?2",
        params![password_hash, email],
    )
}

pub fn contar_usuarios(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM usuarios", [], |row| row.get(0))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db_en_memoria;

    fn pago_de_prueba(cliente: &str, monto: f64, estado: &str) -> Pago {
        Pago {
            id: None,
            cliente: cliente.to_string(),
            caso: "Reclamación laboral".to_string(),
            monto,
            fecha: "2025-05-12".to_string(),
            metodo: "Transferencia".to_string(),
            estado: estado.to_string(),
            comprobante: String::new(),
            notas: String::new(),
        }
    }

    #[test]
    fn cliente_ciclo_completo() {
        let conn = db_en_memoria();
        let cliente = Cliente {
            id: None,
            nombre: "Juan Pérez".into(),
            email: "juan.perez@ejemplo.com".into(),
            telefono: "555-123-4567".into(),
            caso: "Reclamación laboral".into(),
            estado: "Activo".into(),
        };
        insertar_cliente(&conn, "c-1", &cliente).expect("insert");

        let todos = listar_clientes(&conn).expect("list");
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id.as_deref(), Some("c-1"));

        let mut editado = cliente.clone();
        editado.estado = "Inactivo".into();
        assert_eq!(actualizar_cliente(&conn, "c-1", &editado).unwrap(), 1);
        assert_eq!(actualizar_cliente(&conn, "c-x", &editado).unwrap(), 0);

        assert_eq!(eliminar_cliente(&conn, "c-1").unwrap(), 1);
        assert_eq!(eliminar_cliente(&conn, "c-1").unwrap(), 0);
    }

    #[test]
    fn cliente_por_nombre_devuelve_primera_coincidencia() {
        let conn = db_en_memoria();
        let mut cliente = Cliente {
            nombre: "María López".into(),
            email: "maria.primera@ejemplo.com".into(),
            estado: "Activo".into(),
            ..Cliente::default()
        };
        insertar_cliente(&conn, "c-1", &cliente).unwrap();
        cliente.email = "maria.segunda@ejemplo.com".into();
        insertar_cliente(&conn, "c-2", &cliente).unwrap();

        let hallado = cliente_por_nombre(&conn, "María López").unwrap().unwrap();
        assert_eq!(hallado.email, "maria.primera@ejemplo.com");
        assert!(cliente_por_nombre(&conn, "Nadie").unwrap().is_none());
    }

    #[test]
    fn tarea_normaliza_fecha_al_insertar() {
        let conn = db_en_memoria();
        let tarea = Tarea {
            titulo: "Presentar demanda".into(),
            fecha_limite: "01/06/2025".into(),
            estado: "Pendiente".into(),
            ..Tarea::default()
        };
        insertar_tarea(&conn, "t-1", &tarea).unwrap();

        let guardada = &listar_tareas(&conn).unwrap()[0];
        assert_eq!(guardada.fecha_limite, "2025-06-01");
    }

    #[test]
    fn pagos_filtrados_por_estado_en_orden_de_insercion() {
        let conn = db_en_memoria();
        insertar_pago(&conn, "p-1", &pago_de_prueba("Ana", 1500.0, "Pendiente")).unwrap();
        insertar_pago(&conn, "p-2", &pago_de_prueba("Juan", 2500.0, "Completado")).unwrap();
        insertar_pago(&conn, "p-3", &pago_de_prueba("Luz", 2000.0, "Pendiente")).unwrap();

        let pendientes = pagos_por_estado(&conn, "Pendiente").unwrap();
        assert_eq!(pendientes.len(), 2);
        assert_eq!(pendientes[0].id.as_deref(), Some("p-1"));
        assert_eq!(pendientes[1].id.as_deref(), Some("p-3"));

        let pago = pago_por_id(&conn, "p-2").unwrap().unwrap();
        assert_eq!(pago.monto, 2500.0);
        assert!(pago_por_id(&conn, "p-99").unwrap().is_none());
    }

    #[test]
    fn configuracion_upsert_y_lectura() {
        let conn = db_en_memoria();
        assert!(obtener_configuracion(&conn).unwrap().is_none());

        let config = Configuracion {
            email: "dueno@despacho.mx".into(),
            perfil: Perfil {
                nombre: "Lic. González".into(),
                ..Perfil::default()
            },
            despacho: Despacho {
                nombre: "González & Asociados".into(),
                direccion: "Av. Reforma 500, Piso 12, Ciudad".into(),
                telefono: "555-987-6543".into(),
                email: "contacto@gonzalezasociados.com".into(),
                rfc: "GONA123456ABC".into(),
            },
        };
        guardar_configuracion(&conn, &config).unwrap();

        let leida = obtener_configuracion(&conn).unwrap().unwrap();
        assert_eq!(leida.despacho.nombre, "González & Asociados");

        let mut editada = config.clone();
        editada.despacho.telefono = "555-000-0000".into();
        guardar_configuracion(&conn, &editada).unwrap();

        let releida = obtener_configuracion(&conn).unwrap().unwrap();
        assert_eq!(releida.despacho.telefono, "555-000-0000");

        // Upsert keyed by email: still a single document.
        let cuantos: i64 = conn
            .query_row("SELECT COUNT(*) FROM configuracion", [], |r| r.get(0))
            .unwrap();
        assert_eq!(cuantos, 1);
    }

    #[test]
    fn usuario_alta_y_cambio_de_password() {
        let conn = db_en_memoria();
        assert_eq!(contar_usuarios(&conn).unwrap(), 0);

        let usuario = Usuario {
            id: "u-1".into(),
            email: "abogado@despacho.mx".into(),
            password_hash: "$2b$10$hash".into(),
            nombre: "Lic. González".into(),
            rol: "admin".into(),
        };
        insertar_usuario(&conn, &usuario).unwrap();
        assert_eq!(contar_usuarios(&conn).unwrap(), 1);

        assert_eq!(
            actualizar_password(&conn, "abogado@despacho.mx", "$2b$10$otro").unwrap(),
            1
        );
        let releido = usuario_por_email(&conn, "abogado@despacho.mx")
            .unwrap()
            .unwrap();
        assert_eq!(releido.password_hash, "$2b$10$otro");

        assert_eq!(actualizar_password(&conn, "nadie@x.mx", "h").unwrap(), 0);
    }
}
