//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The asset expiry window and cache-space names are fixed constants, not
/// configuration (see the `resolve` and `gateway` modules).
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin of the site being fronted, e.g. `http://localhost:3000`
    pub upstream_origin: String,
    /// Base URL of the CMS content API used for asset lookups
    pub asset_api_base: String,
    /// Directory holding the SQLite database file
    pub data_dir: String,
    /// Path prefix for the admin panel (never intercepted)
    pub admin_prefix: String,
    /// Path prefix for built static assets
    pub static_prefix: String,
    /// Hostnames treated as image hosting services
    pub image_hosts: Vec<String>,
    /// Hostnames treated as video hosting services
    pub video_hosts: Vec<String>,
    /// Hostnames of the document database and its companion app hosting
    pub database_hosts: Vec<String>,
    /// Page-shell entry points pre-populated at install time
    pub shell_manifest: Vec<String>,
    /// Delay in seconds before the first expiry sweep
    pub sweep_delay_secs: u64,
    /// Interval in seconds between expiry sweeps
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `UPSTREAM_ORIGIN` - Origin of the fronted site (default: http://localhost:3000)
    /// - `ASSET_API_BASE` - CMS content API base (default: `<UPSTREAM_ORIGIN>/api/assets`)
    /// - `DATA_DIR` - SQLite data directory (default: ./data)
    /// - `ADMIN_PREFIX` - Admin path prefix (default: /admin)
    /// - `STATIC_PREFIX` - Static asset path prefix (default: /assets)
    /// - `IMAGE_HOSTS` / `VIDEO_HOSTS` / `DATABASE_HOSTS` - comma-separated host lists
    /// - `SHELL_MANIFEST` - comma-separated shell entry points (default: /)
    /// - `SWEEP_DELAY_SECS` - delay before the first sweep (default: 10)
    /// - `SWEEP_INTERVAL_SECS` - sweep frequency (default: 21600)
    pub fn from_env() -> Self {
        let upstream_origin =
            env::var("UPSTREAM_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let asset_api_base = env::var("ASSET_API_BASE")
            .unwrap_or_else(|_| format!("{}/api/assets", upstream_origin.trim_end_matches('/')));

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            upstream_origin,
            asset_api_base,
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            admin_prefix: env::var("ADMIN_PREFIX").unwrap_or_else(|_| "/admin".to_string()),
            static_prefix: env::var("STATIC_PREFIX").unwrap_or_else(|_| "/assets".to_string()),
            image_hosts: csv_list(env::var("IMAGE_HOSTS").ok()),
            video_hosts: csv_list(env::var("VIDEO_HOSTS").ok()),
            database_hosts: csv_list(env::var("DATABASE_HOSTS").ok()),
            shell_manifest: {
                let entries = csv_list(env::var("SHELL_MANIFEST").ok());
                if entries.is_empty() {
                    vec!["/".to_string()]
                } else {
                    entries
                }
            },
            sweep_delay_secs: env::var("SWEEP_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(21_600),
        }
    }

    /// Path of the SQLite database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("assetgate.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            upstream_origin: "http://localhost:3000".to_string(),
            asset_api_base: "http://localhost:3000/api/assets".to_string(),
            data_dir: "./data".to_string(),
            admin_prefix: "/admin".to_string(),
            static_prefix: "/assets".to_string(),
            image_hosts: Vec::new(),
            video_hosts: Vec::new(),
            database_hosts: Vec::new(),
            shell_manifest: vec!["/".to_string()],
            sweep_delay_secs: 10,
            sweep_interval_secs: 21_600,
        }
    }
}

/// Splits a comma-separated environment value into trimmed, non-empty items.
fn csv_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.upstream_origin, "http://localhost:3000");
        assert_eq!(config.admin_prefix, "/admin");
        assert_eq!(config.shell_manifest, vec!["/".to_string()]);
        assert_eq!(config.sweep_delay_secs, 10);
    }

    #[test]
    fn test_db_path_joins_data_dir() {
        let config = Config {
            data_dir: "/tmp/gate".to_string(),
            ..Config::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/gate/assetgate.db"));
    }

    #[test]
    fn test_csv_list_trims_and_drops_empties() {
        let hosts = csv_list(Some("images.example.com, cdn.example.com,,".to_string()));
        assert_eq!(hosts, vec!["images.example.com", "cdn.example.com"]);
    }

    #[test]
    fn test_csv_list_none() {
        assert!(csv_list(None).is_empty());
    }
}
