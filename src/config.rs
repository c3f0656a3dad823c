//! Server configuration from the environment, read once at startup.

use std::path::PathBuf;

const PUERTO_DEFAULT: u16 = 8430;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// `LEGALMANAGER_HOST`, `LEGALMANAGER_PORT`, `LEGALMANAGER_DATA_DIR`,
    /// each with a local-development default.
    pub fn from_env() -> Self {
        Self::from_vars(|clave| std::env::var(clave).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let host = var("LEGALMANAGER_HOST")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("LEGALMANAGER_PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(PUERTO_DEFAULT);
        let data_dir = var("LEGALMANAGER_DATA_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));
        Self {
            host,
            port,
            data_dir,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sin_entorno() {
        let config = ServerConfig::from_vars(|_| None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, PUERTO_DEFAULT);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr(), "127.0.0.1:8430");
    }

    #[test]
    fn el_entorno_manda() {
        let config = ServerConfig::from_vars(|clave| match clave {
            "LEGALMANAGER_HOST" => Some("0.0.0.0".to_string()),
            "LEGALMANAGER_PORT" => Some("9000".to_string()),
            "LEGALMANAGER_DATA_DIR" => Some("/var/lib/legalmanager".to_string()),
            _ => None,
        });
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/legalmanager"));
    }

    #[test]
    fn valores_invalidos_caen_al_default() {
        let config = ServerConfig::from_vars(|clave| match clave {
            "LEGALMANAGER_PORT" => Some("no-es-un-puerto".to_string()),
            "LEGALMANAGER_HOST" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.port, PUERTO_DEFAULT);
        assert_eq!(config.host, "127.0.0.1");
    }
}
