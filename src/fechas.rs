//! Date handling for records that arrive in mixed formats.
//!
//! Historic data carries dates either as ISO-8601 (`2025-05-12` or a full
//! datetime) or as locale `12/05/2025` strings. Everything written through
//! the API is normalized to canonical `YYYY-MM-DD` on the way in; readers
//! still tolerate both forms because rows created before normalization may
//! remain in the store.

use chrono::NaiveDate;

/// Parse a date in any of the tolerated forms.
///
/// Accepts `YYYY-MM-DD`, a full ISO-8601 datetime (the date part is used),
/// and locale `DD/MM/YYYY`. Returns `None` for anything else.
pub fn parsear_fecha(valor: &str) -> Option<NaiveDate> {
    let v = valor.trim();
    if v.is_empty() {
        return None;
    }
    if let Some((dia, _hora)) = v.split_once('T') {
        return NaiveDate::parse_from_str(dia, "%Y-%m-%d").ok();
    }
    if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDate::parse_from_str(v, "%d/%m/%Y").ok()
}

/// Normalize a date field to canonical `YYYY-MM-DD`.
///
/// Unparseable input is passed through untouched: the store never had
/// validation on these fields and round-tripping beats data loss.
pub fn normalizar_fecha(valor: &str) -> String {
    match parsear_fecha(valor) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => valor.trim().to_string(),
    }
}

/// Sort key for date strings in mixed formats.
///
/// Parseable dates order naturally; unparseable ones sort after every real
/// date so they end up at the bottom of "recent/upcoming" lists.
pub fn clave_orden(valor: &str) -> NaiveDate {
    parsear_fecha(valor).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsea_iso_simple() {
        assert_eq!(
            parsear_fecha("2025-05-12"),
            NaiveDate::from_ymd_opt(2025, 5, 12)
        );
    }

    #[test]
    fn parsea_iso_con_hora() {
        assert_eq!(
            parsear_fecha("2025-05-12T09:30:00.000Z"),
            NaiveDate::from_ymd_opt(2025, 5, 12)
        );
    }

    #[test]
    fn parsea_formato_local() {
        assert_eq!(
            parsear_fecha("12/05/2025"),
            NaiveDate::from_ymd_opt(2025, 5, 12)
        );
    }

    #[test]
    fn rechaza_basura() {
        assert_eq!(parsear_fecha(""), None);
        assert_eq!(parsear_fecha("pronto"), None);
        assert_eq!(parsear_fecha("2025-13-40"), None);
    }

    #[test]
    fn normaliza_ambos_formatos_al_canonico() {
        assert_eq!(normalizar_fecha("12/05/2025"), "2025-05-12");
        assert_eq!(normalizar_fecha("2025-05-12"), "2025-05-12");
        assert_eq!(normalizar_fecha("2025-05-12T10:00:00Z"), "2025-05-12");
    }

    #[test]
    fn normaliza_deja_pasar_lo_invalido() {
        assert_eq!(normalizar_fecha("  sin fecha  "), "sin fecha");
    }

    #[test]
    fn clave_orden_manda_invalidas_al_final() {
        let mut fechas = vec!["sin fecha", "2025-06-01", "12/05/2025"];
        fechas.sort_by_key(|f| clave_orden(f));
        assert_eq!(fechas, vec!["12/05/2025", "2025-06-01", "sin fecha"]);
    }
}
