//! Email/password authentication with bcrypt.
//!
//! Validates login credentials against the `usuarios` collection and
//! handles password changes. Failed attempts feed a lockout counter that
//! is persisted in the `ajustes` store (category "auth") so restarts do
//! not reset an active lockout window.
//!
//! Session issuance/expiry lives in the hosting layer, not here; this
//! module only answers "are these credentials valid".

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::{actualizar_password, contar_usuarios, insertar_usuario, usuario_por_email};
use crate::db::{get_ajuste, set_ajuste};
use crate::error::{ApiError, ApiResult};
use crate::models::Usuario;

const MAX_INTENTOS_FALLIDOS: u32 = 5;
const MINUTOS_BLOQUEO: i64 = 15;
const COSTO_BCRYPT: u32 = 10;

const CLAVE_INTENTOS: &str = "intentos_fallidos";
const CLAVE_ULTIMO_INTENTO: &str = "ultimo_intento";

/// Lockout tracking entry.
struct Bloqueo {
    intentos: u32,
    ultimo_intento: DateTime<Utc>,
}

/// Shared authentication state.
pub struct AuthState {
    bloqueo: Mutex<Bloqueo>,
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            bloqueo: Mutex::new(Bloqueo {
                intentos: 0,
                ultimo_intento: Utc::now(),
            }),
        }
    }

    /// Restore persisted lockout state from the ajustes store.
    pub fn desde_ajustes(conn: &Connection) -> Self {
        let intentos = get_ajuste(conn, "auth", CLAVE_INTENTOS)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let ultimo_intento = get_ajuste(conn, "auth", CLAVE_ULTIMO_INTENTO)
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Self {
            bloqueo: Mutex::new(Bloqueo {
                intentos,
                ultimo_intento,
            }),
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

fn verificar_bloqueo(bloqueo: &Bloqueo) -> ApiResult<()> {
    if bloqueo.intentos >= MAX_INTENTOS_FALLIDOS {
        let transcurrido = Utc::now() - bloqueo.ultimo_intento;
        if transcurrido < Duration::minutes(MINUTOS_BLOQUEO) {
            let restante = MINUTOS_BLOQUEO - transcurrido.num_minutes();
            return Err(ApiError::Bloqueado(format!(
                "Demasiados intentos fallidos. Intente de nuevo en {restante} minuto(s)."
            )));
        }
        // Window elapsed; counter resets on the next successful login.
    }
    Ok(())
}

fn persistir_bloqueo(conn: &Connection, bloqueo: &Bloqueo) {
    let _ = set_ajuste(conn, "auth", CLAVE_INTENTOS, &bloqueo.intentos.to_string());
    let _ = set_ajuste(
        conn,
        "auth",
        CLAVE_ULTIMO_INTENTO,
        &bloqueo.ultimo_intento.to_rfc3339(),
    );
}

/// Validate credentials. On success returns the public user document
/// (`_id`, `email`, `name`, `role`) — the hash never leaves the store.
pub fn validar_usuario(
    conn: &Connection,
    auth: &AuthState,
    email: &str,
    password: &str,
) -> ApiResult<serde_json::Value> {
    let mut bloqueo = auth
        .bloqueo
        .lock()
        .map_err(|e| ApiError::almacen("Error de autenticación", e))?;
    verificar_bloqueo(&bloqueo)?;

    let usuario = usuario_por_email(conn, email)
        .map_err(|e| ApiError::almacen("Error al validar el usuario", e))?;

    let valido = usuario
        .as_ref()
        .map(|u| bcrypt::verify(password, &u.password_hash).unwrap_or(false))
        .unwrap_or(false);

    if !valido {
        bloqueo.intentos += 1;
        bloqueo.ultimo_intento = Utc::now();
        persistir_bloqueo(conn, &bloqueo);
        warn!(intentos = bloqueo.intentos, "failed login attempt");
        return Err(ApiError::Credenciales);
    }

    bloqueo.intentos = 0;
    bloqueo.ultimo_intento = Utc::now();
    persistir_bloqueo(conn, &bloqueo);

    let usuario = usuario.ok_or(ApiError::Credenciales)?;
    info!(email = %usuario.email, "login successful");
    Ok(serde_json::json!({
        "_id": usuario.id,
        "email": usuario.email,
        "name": usuario.nombre,
        "role": usuario.rol,
    }))
}

/// Change a user's password after re-validating the current one.
pub fn cambiar_password(
    conn: &Connection,
    email: &str,
    password: &str,
    password_nueva: &str,
) -> ApiResult<()> {
    let usuario = usuario_por_email(conn, email)
        .map_err(|e| ApiError::almacen("Error al actualizar la contraseña", e))?
        .ok_or_else(|| ApiError::NoEncontrado("Usuario no encontrado".to_string()))?;

    if !bcrypt::verify(password, &usuario.password_hash).unwrap_or(false) {
        return Err(ApiError::Credenciales);
    }

    let hash = bcrypt::hash(password_nueva, COSTO_BCRYPT)
        .map_err(|e| ApiError::almacen("Error al actualizar la contraseña", e))?;
    actualizar_password(conn, email, &hash)
        .map_err(|e| ApiError::almacen("Error al actualizar la contraseña", e))?;

    info!(email = %email, "password updated");
    Ok(())
}

/// Create a login account with a freshly hashed password.
pub fn crear_usuario(
    conn: &Connection,
    email: &str,
    password: &str,
    nombre: &str,
    rol: &str,
) -> ApiResult<Usuario> {
    let hash = bcrypt::hash(password, COSTO_BCRYPT)
        .map_err(|e| ApiError::almacen("Error al crear el usuario", e))?;
    let usuario = Usuario {
        id: format!("u-{}", Uuid::new_v4()),
        email: email.trim().to_string(),
        password_hash: hash,
        nombre: nombre.to_string(),
        rol: rol.to_string(),
    };
    insertar_usuario(conn, &usuario)
        .map_err(|e| ApiError::almacen("Error al crear el usuario", e))?;
    Ok(usuario)
}

/// Seed the first admin account from the environment when the usuarios
/// collection is empty. Without the variables the store stays empty and
/// login keeps rejecting everything.
pub fn asegurar_admin_inicial(conn: &Connection) {
    let cuantos = contar_usuarios(conn).unwrap_or(0);
    if cuantos > 0 {
        return;
    }
    let email = std::env::var("LEGALMANAGER_ADMIN_EMAIL").unwrap_or_default();
    let password = std::env::var("LEGALMANAGER_ADMIN_PASSWORD").unwrap_or_default();
    if email.trim().is_empty() || password.trim().is_empty() {
        warn!("No hay usuarios y LEGALMANAGER_ADMIN_EMAIL/PASSWORD no están definidos");
        return;
    }
    match crear_usuario(conn, &email, &password, "Administrador", "admin") {
        Ok(usuario) => info!(email = %usuario.email, "created initial admin account"),
        Err(e) => warn!("No se pudo crear el administrador inicial: {e}"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db_en_memoria;

    /// Insert a user with a cheap hash so tests stay fast.
    fn sembrar_usuario(conn: &Connection, email: &str, password: &str) {
        let usuario = Usuario {
            id: "u-test".into(),
            email: email.into(),
            password_hash: bcrypt::hash(password, 4).expect("hash test password"),
            nombre: "Lic. González".into(),
            rol: "admin".into(),
        };
        insertar_usuario(conn, &usuario).expect("insert user");
    }

    #[test]
    fn login_correcto_devuelve_el_usuario_publico() {
        let conn = db_en_memoria();
        sembrar_usuario(&conn, "abogado@despacho.mx", "secreta");
        let auth = AuthState::new();

        let usuario = validar_usuario(&conn, &auth, "abogado@despacho.mx", "secreta").unwrap();
        assert_eq!(usuario["email"], "abogado@despacho.mx");
        assert_eq!(usuario["role"], "admin");
        assert!(usuario.get("password").is_none());
    }

    #[test]
    fn password_incorrecta_y_usuario_desconocido_dan_credenciales() {
        let conn = db_en_memoria();
        sembrar_usuario(&conn, "abogado@despacho.mx", "secreta");
        let auth = AuthState::new();

        let mal = validar_usuario(&conn, &auth, "abogado@despacho.mx", "otra");
        assert!(matches!(mal, Err(ApiError::Credenciales)));

        let nadie = validar_usuario(&conn, &auth, "nadie@despacho.mx", "secreta");
        assert!(matches!(nadie, Err(ApiError::Credenciales)));
    }

    #[test]
    fn cinco_fallos_bloquean_y_el_exito_resetea() {
        let conn = db_en_memoria();
        sembrar_usuario(&conn, "abogado@despacho.mx", "secreta");
        let auth = AuthState::new();

        for _ in 0..5 {
            let _ = validar_usuario(&conn, &auth, "abogado@despacho.mx", "mala");
        }
        let bloqueado = validar_usuario(&conn, &auth, "abogado@despacho.mx", "secreta");
        assert!(matches!(bloqueado, Err(ApiError::Bloqueado(_))));

        // Fresh state (window expired): correct login resets the counter.
        let auth2 = AuthState::new();
        validar_usuario(&conn, &auth2, "abogado@despacho.mx", "secreta").unwrap();
        assert_eq!(
            get_ajuste(&conn, "auth", CLAVE_INTENTOS).as_deref(),
            Some("0")
        );
    }

    #[test]
    fn el_bloqueo_sobrevive_reinicios_via_ajustes() {
        let conn = db_en_memoria();
        sembrar_usuario(&conn, "abogado@despacho.mx", "secreta");
        let auth = AuthState::new();
        for _ in 0..5 {
            let _ = validar_usuario(&conn, &auth, "abogado@despacho.mx", "mala");
        }

        let rehidratado = AuthState::desde_ajustes(&conn);
        let resultado = validar_usuario(&conn, &rehidratado, "abogado@despacho.mx", "secreta");
        assert!(matches!(resultado, Err(ApiError::Bloqueado(_))));
    }

    #[test]
    fn cambio_de_password_exige_la_actual() {
        let conn = db_en_memoria();
        sembrar_usuario(&conn, "abogado@despacho.mx", "secreta");

        let mal = cambiar_password(&conn, "abogado@despacho.mx", "equivocada", "nueva");
        assert!(matches!(mal, Err(ApiError::Credenciales)));

        let nadie = cambiar_password(&conn, "nadie@despacho.mx", "secreta", "nueva");
        assert!(matches!(nadie, Err(ApiError::NoEncontrado(_))));

        cambiar_password(&conn, "abogado@despacho.mx", "secreta", "nueva").unwrap();
        let guardado = usuario_por_email(&conn, "abogado@despacho.mx")
            .unwrap()
            .unwrap();
        assert!(bcrypt::verify("nueva", &guardado.password_hash).unwrap());
        assert!(!bcrypt::verify("secreta", &guardado.password_hash).unwrap());
    }

    #[test]
    fn crear_usuario_guarda_un_hash_no_el_texto() {
        let conn = db_en_memoria();
        let usuario = crear_usuario(&conn, "a@b.mx", "clave", "Ana", "admin").unwrap();
        assert_ne!(usuario.password_hash, "clave");
        assert!(bcrypt::verify("clave", &usuario.password_hash).unwrap());
    }
}
